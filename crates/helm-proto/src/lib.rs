pub mod status;

pub use status::StatusEvent;
