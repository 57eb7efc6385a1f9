use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::warn;

use crate::config::{NavConfig, NavError};
use crate::fix::GpsFix;

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct WayPoint {
    pub lat: f64,
    pub lon: f64,
}

impl WayPoint {
    pub fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }

    pub fn is_valid(&self) -> bool {
        self.lat.is_finite() && self.lon.is_finite() && self.lat.abs() <= 90.0 && self.lon.abs() <= 180.0
    }
}

impl fmt::Display for WayPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({:.6}, {:.6})", self.lat, self.lon)
    }
}

/// Ordered targets with home in slot 0 and a cyclic target index.
#[derive(Debug, Clone)]
pub struct WaypointTable {
    points: Vec<WayPoint>,
    target: usize,
    home_latched: bool,
}

impl WaypointTable {
    pub fn new(points: Vec<WayPoint>) -> Result<Self, NavError> {
        if points.is_empty() {
            return Err(NavError::EmptyWaypointTable);
        }
        Ok(Self { points, target: 0, home_latched: false })
    }

    /// Home slot followed by the configured targets. An unconfigured home is a
    /// placeholder until `set_home` runs.
    pub fn from_config(cfg: &NavConfig) -> Result<Self, NavError> {
        if cfg.waypoints.is_empty() {
            return Err(NavError::EmptyWaypointTable);
        }
        let mut points = Vec::with_capacity(cfg.waypoints.len() + 1);
        points.push(cfg.home.unwrap_or_default());
        points.extend_from_slice(&cfg.waypoints);
        Self::new(points)
    }

    pub fn len(&self) -> usize { self.points.len() }

    pub fn is_empty(&self) -> bool { self.points.is_empty() }

    pub fn current_index(&self) -> usize { self.target }

    pub fn current(&self) -> WayPoint { self.points[self.target] }

    pub fn home(&self) -> WayPoint { self.points[0] }

    pub fn points(&self) -> &[WayPoint] { &self.points }

    pub fn reset(&mut self) {
        self.target = 0;
    }

    /// Move to the next target, wrapping back to home after the last one.
    pub fn advance(&mut self) -> WayPoint {
        self.target = (self.target + 1) % self.points.len();
        self.current()
    }

    /// Overwrite slot 0 with `fix`. Only the first call has any effect.
    pub fn set_home(&mut self, fix: &GpsFix) -> bool {
        if self.home_latched {
            warn!("home already latched; ignoring {:.6},{:.6}", fix.lat, fix.lon);
            return false;
        }
        self.points[0] = WayPoint::new(fix.lat, fix.lon);
        self.home_latched = true;
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table(n: usize) -> WaypointTable {
        WaypointTable::new((0..n).map(|i| WayPoint::new(i as f64, 0.0)).collect()).unwrap()
    }

    #[test]
    fn empty_is_rejected() {
        assert_eq!(WaypointTable::new(vec![]).unwrap_err(), NavError::EmptyWaypointTable);
    }

    #[test]
    fn advance_cycles() {
        let mut t = table(3);
        let seen: Vec<usize> = (0..6).map(|_| { t.advance(); t.current_index() }).collect();
        assert_eq!(seen, vec![1, 2, 0, 1, 2, 0]);
    }

    #[test]
    fn advance_returns_new_target() {
        let mut t = table(3);
        assert_eq!(t.advance(), WayPoint::new(1.0, 0.0));
        assert_eq!(t.current(), WayPoint::new(1.0, 0.0));
    }

    #[test]
    fn single_slot_table_stays_home() {
        let mut t = table(1);
        t.advance();
        assert_eq!(t.current_index(), 0);
    }

    #[test]
    fn reset_goes_home() {
        let mut t = table(3);
        t.advance();
        t.reset();
        assert_eq!(t.current_index(), 0);
    }

    #[test]
    fn home_latches_once() {
        let mut t = table(2);
        let fix = GpsFix { lat: 48.0, lon: -123.0, locked: true, ..GpsFix::default() };
        assert!(t.set_home(&fix));
        let later = GpsFix { lat: 10.0, lon: 10.0, ..fix };
        assert!(!t.set_home(&later));
        assert_eq!(t.home(), WayPoint::new(48.0, -123.0));
        assert_eq!(t.points()[1], WayPoint::new(1.0, 0.0));
    }
}
