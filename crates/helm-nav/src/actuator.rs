use serde::{Deserialize, Serialize};
use std::fmt;

/// Throttle settings understood by the ESC adapter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SpeedLevel {
    Stop,
    Forward25,
    Forward50,
    Forward100,
    Reverse25,
    Reverse50,
    Reverse100,
}

/// Named rudder settings; the adapter maps them to servo angles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RudderPosition {
    FullLeft,
    Left,
    Center,
    Right,
    FullRight,
}

impl fmt::Display for SpeedLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            SpeedLevel::Stop => "stop",
            SpeedLevel::Forward25 => "fwd 25%",
            SpeedLevel::Forward50 => "fwd 50%",
            SpeedLevel::Forward100 => "fwd 100%",
            SpeedLevel::Reverse25 => "rev 25%",
            SpeedLevel::Reverse50 => "rev 50%",
            SpeedLevel::Reverse100 => "rev 100%",
        };
        f.write_str(s)
    }
}

impl fmt::Display for RudderPosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            RudderPosition::FullLeft => "full left",
            RudderPosition::Left => "left",
            RudderPosition::Center => "center",
            RudderPosition::Right => "right",
            RudderPosition::FullRight => "full right",
        };
        f.write_str(s)
    }
}

/// Where speed and rudder commands go. Calls are fire-and-forget and repeating
/// the same command must be harmless.
pub trait ActuatorSink {
    fn set_speed(&mut self, level: SpeedLevel);
    fn set_rudder(&mut self, position: RudderPosition);
}

impl<T: ActuatorSink + ?Sized> ActuatorSink for Box<T> {
    fn set_speed(&mut self, level: SpeedLevel) {
        (**self).set_speed(level)
    }

    fn set_rudder(&mut self, position: RudderPosition) {
        (**self).set_rudder(position)
    }
}
