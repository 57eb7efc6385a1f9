pub mod actuator;
pub mod bearing;
pub mod config;
pub mod doctor;
pub mod fix;
pub mod geo;
pub mod gnss;
pub mod heading;
pub mod nav;
pub mod waypoint;

pub use config::{NavConfig, NavError};
pub use nav::{NavState, Navigator, TickReport};
