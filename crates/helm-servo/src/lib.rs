pub mod mav;
pub mod safety;
pub mod sink;

use helm_nav::actuator::{RudderPosition, SpeedLevel};
use serde::Deserialize;

pub use sink::{open_sink, LogSink, MavServoSink};

const PULSE_MIN_US: f32 = 1000.0;
const PULSE_MAX_US: f32 = 2000.0;

#[derive(Debug, Clone, Deserialize)]
pub struct ServoConfig {
    /// "log" prints commands only; "mavlink" drives servo outputs on the controller.
    #[serde(default = "default_backend")]
    pub backend: String,

    pub serial_dev: Option<String>,
    pub baud: Option<u32>,

    /// MAVLink ids we use (Pi side)
    #[serde(default = "default_sys_id")]
    pub sys_id: u8,
    #[serde(default = "default_comp_id")]
    pub comp_id: u8,

    /// target system/component (controller side). 1/1 is common for ArduPilot.
    #[serde(default = "one")]
    pub target_sys: u8,
    #[serde(default = "one")]
    pub target_comp: u8,

    /// Controller servo output numbers (1-based).
    #[serde(default = "default_rudder_channel")]
    pub rudder_channel: u16,
    #[serde(default = "default_esc_channel")]
    pub esc_channel: u16,

    /// Mirror rudder angles for a servo mounted the other way round.
    #[serde(default)]
    pub reverse_rudder: bool,

    #[serde(default)]
    pub rudder: RudderAngles,
    #[serde(default)]
    pub speed: SpeedPulses,

    /// Identical commands inside this window are not resent.
    #[serde(default = "default_repeat_ms")]
    pub repeat_ms: u64,
}

impl Default for ServoConfig {
    fn default() -> Self {
        Self {
            backend: default_backend(),
            serial_dev: None,
            baud: None,
            sys_id: default_sys_id(),
            comp_id: default_comp_id(),
            target_sys: 1,
            target_comp: 1,
            rudder_channel: default_rudder_channel(),
            esc_channel: default_esc_channel(),
            reverse_rudder: false,
            rudder: RudderAngles::default(),
            speed: SpeedPulses::default(),
            repeat_ms: default_repeat_ms(),
        }
    }
}

fn default_backend() -> String { "log".into() }
fn default_sys_id() -> u8 { 200 }
fn default_comp_id() -> u8 { 191 }
fn one() -> u8 { 1 }
fn default_rudder_channel() -> u16 { 1 }
fn default_esc_channel() -> u16 { 3 }
fn default_repeat_ms() -> u64 { 1000 }

/// Servo angles (0-180) for each rudder preset.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(default)]
pub struct RudderAngles {
    pub full_left: f32,
    pub left: f32,
    pub center: f32,
    pub right: f32,
    pub full_right: f32,
}

impl Default for RudderAngles {
    fn default() -> Self {
        Self { full_left: 45.0, left: 70.0, center: 90.0, right: 110.0, full_right: 135.0 }
    }
}

impl RudderAngles {
    pub fn angle(&self, pos: RudderPosition, reverse: bool) -> f32 {
        let a = match pos {
            RudderPosition::FullLeft => self.full_left,
            RudderPosition::Left => self.left,
            RudderPosition::Center => self.center,
            RudderPosition::Right => self.right,
            RudderPosition::FullRight => self.full_right,
        };
        if reverse { 180.0 - a } else { a }
    }
}

/// ESC pulse widths in microseconds for each speed level.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(default)]
pub struct SpeedPulses {
    pub stop: u16,
    pub forward_25: u16,
    pub forward_50: u16,
    pub forward_100: u16,
    pub reverse_25: u16,
    pub reverse_50: u16,
    pub reverse_100: u16,
}

impl Default for SpeedPulses {
    fn default() -> Self {
        Self {
            stop: 1500,
            forward_25: 1600,
            forward_50: 1700,
            forward_100: 1900,
            reverse_25: 1400,
            reverse_50: 1300,
            reverse_100: 1100,
        }
    }
}

impl SpeedPulses {
    pub fn pulse(&self, level: SpeedLevel) -> u16 {
        match level {
            SpeedLevel::Stop => self.stop,
            SpeedLevel::Forward25 => self.forward_25,
            SpeedLevel::Forward50 => self.forward_50,
            SpeedLevel::Forward100 => self.forward_100,
            SpeedLevel::Reverse25 => self.reverse_25,
            SpeedLevel::Reverse50 => self.reverse_50,
            SpeedLevel::Reverse100 => self.reverse_100,
        }
    }
}

/// Standard hobby servo mapping: 0..180 degrees onto 1000..2000 us.
pub fn angle_to_pulse_us(angle: f32) -> u16 {
    let a = angle.clamp(0.0, 180.0);
    (PULSE_MIN_US + (PULSE_MAX_US - PULSE_MIN_US) * a / 180.0).round() as u16
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pulse_mapping() {
        assert_eq!(angle_to_pulse_us(0.0), 1000);
        assert_eq!(angle_to_pulse_us(90.0), 1500);
        assert_eq!(angle_to_pulse_us(180.0), 2000);
        assert_eq!(angle_to_pulse_us(45.0), 1250);
        assert_eq!(angle_to_pulse_us(-10.0), 1000);
        assert_eq!(angle_to_pulse_us(200.0), 2000);
    }

    #[test]
    fn reversed_rudder_mirrors_around_center() {
        let r = RudderAngles::default();
        assert_eq!(r.angle(RudderPosition::FullLeft, false), 45.0);
        assert_eq!(r.angle(RudderPosition::FullLeft, true), 135.0);
        assert_eq!(r.angle(RudderPosition::Center, true), 90.0);
        assert_eq!(r.angle(RudderPosition::Right, true), 70.0);
    }

    #[test]
    fn config_defaults_fill_in() {
        let cfg: ServoConfig = toml::from_str(
            r#"
backend = "mavlink"
serial_dev = "/dev/ttyACM0"
baud = 57600
reverse_rudder = true

[speed]
forward_100 = 1850
"#,
        )
        .unwrap();
        assert_eq!(cfg.backend, "mavlink");
        assert_eq!(cfg.target_sys, 1);
        assert_eq!(cfg.rudder, RudderAngles::default());
        assert_eq!(cfg.speed.pulse(SpeedLevel::Forward100), 1850);
        assert_eq!(cfg.speed.pulse(SpeedLevel::Stop), 1500);
        assert_eq!(cfg.repeat_ms, 1000);
    }
}
