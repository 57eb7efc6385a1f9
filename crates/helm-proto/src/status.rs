use serde::{Deserialize, Serialize};
use std::fmt;

/// One status record emitted by the navigator during a tick.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum StatusEvent {
    Heading { deg: f64 },
    StateChanged { state: String },
    Bearing { waypoint: usize, deg: f64 },
    InitialDistance { waypoint: usize, meters: f64 },
    Turn { direction: String },
    HomeLatched { lat: f64, lon: f64 },
    Arrived { waypoint: usize, meters: f64 },
}

impl fmt::Display for StatusEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StatusEvent::Heading { deg } => write!(f, "Heading: {}", *deg as u16),
            StatusEvent::StateChanged { state } => write!(f, "State: {}", state),
            StatusEvent::Bearing { waypoint, deg } => {
                write!(f, "Bearing to waypoint {}: {:.1}", waypoint, deg)
            }
            StatusEvent::InitialDistance { waypoint, meters } => {
                write!(f, "Distance to waypoint {}: {:.1} m", waypoint, meters)
            }
            StatusEvent::Turn { direction } => write!(f, "Go {}", direction),
            StatusEvent::HomeLatched { lat, lon } => {
                write!(f, "Home set to ({:.6}, {:.6})", lat, lon)
            }
            StatusEvent::Arrived { waypoint, meters } => {
                write!(f, "Reached waypoint {} ({:.1} m)", waypoint, meters)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_lines() {
        assert_eq!(StatusEvent::Heading { deg: 359.7 }.to_string(), "Heading: 359");
        assert_eq!(
            StatusEvent::StateChanged { state: "Wait for GPS Lock".into() }.to_string(),
            "State: Wait for GPS Lock"
        );
        assert_eq!(
            StatusEvent::Bearing { waypoint: 2, deg: 45.04 }.to_string(),
            "Bearing to waypoint 2: 45.0"
        );
        assert_eq!(StatusEvent::Turn { direction: "LEFT".into() }.to_string(), "Go LEFT");
    }

    #[test]
    fn serializes_as_table() {
        #[derive(Serialize)]
        struct Wrapper {
            event: StatusEvent,
        }
        let s = toml::to_string(&Wrapper {
            event: StatusEvent::InitialDistance { waypoint: 1, meters: 12.5 },
        })
        .unwrap();
        assert!(s.contains("InitialDistance"));
        assert!(s.contains("meters = 12.5"));
    }
}
