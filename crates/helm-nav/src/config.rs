use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::waypoint::WayPoint;

#[derive(Debug, Error, PartialEq)]
pub enum NavError {
    #[error("waypoint table is empty")]
    EmptyWaypointTable,
    #[error("waypoint {index} has invalid coordinates ({lat}, {lon})")]
    InvalidWaypoint { index: usize, lat: f64, lon: f64 },
    #[error("invalid nav config: {0}")]
    InvalidConfig(&'static str),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NavConfig {
    /// Fixed home position. When absent, home is latched from the first stable fix.
    #[serde(default)]
    pub home: Option<WayPoint>,
    /// Targets visited after home, in order.
    pub waypoints: Vec<WayPoint>,
    pub bearing_tolerance_deg: f64,
    pub switch_waypoint_m: f64,
    pub gps_stabilize_ticks: u32,
    #[serde(default = "default_refresh_every_ticks")]
    pub refresh_every_ticks: u32,
    #[serde(default)]
    pub declination_deg: f64,
    #[serde(default = "default_tick_ms")]
    pub tick_ms: u64,
    /// Stop in Idle after stabilizing instead of navigating.
    #[serde(default)]
    pub gps_test: bool,
}

fn default_refresh_every_ticks() -> u32 { 10 }
fn default_tick_ms() -> u64 { 100 }

impl NavConfig {
    pub fn fixed_home(&self) -> bool { self.home.is_some() }

    pub fn validate(&self) -> Result<(), NavError> {
        if self.waypoints.is_empty() {
            return Err(NavError::EmptyWaypointTable);
        }
        let home = self.home.iter();
        for (index, wp) in home.chain(self.waypoints.iter()).enumerate() {
            if !wp.is_valid() {
                return Err(NavError::InvalidWaypoint { index, lat: wp.lat, lon: wp.lon });
            }
        }
        if !(self.bearing_tolerance_deg.is_finite()
            && (0.0..180.0).contains(&self.bearing_tolerance_deg))
        {
            return Err(NavError::InvalidConfig("bearing_tolerance_deg must be in [0, 180)"));
        }
        if !(self.switch_waypoint_m.is_finite() && self.switch_waypoint_m > 0.0) {
            return Err(NavError::InvalidConfig("switch_waypoint_m must be > 0"));
        }
        if self.refresh_every_ticks == 0 {
            return Err(NavError::InvalidConfig("refresh_every_ticks must be >= 1"));
        }
        if !(self.declination_deg > -360.0 && self.declination_deg < 360.0) {
            return Err(NavError::InvalidConfig("declination_deg must be in (-360, 360)"));
        }
        if self.tick_ms == 0 {
            return Err(NavError::InvalidConfig("tick_ms must be > 0"));
        }
        Ok(())
    }
}
