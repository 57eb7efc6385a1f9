use helm_proto::StatusEvent;
use std::fmt;
use tracing::{debug, info};

use crate::actuator::{ActuatorSink, RudderPosition, SpeedLevel};
use crate::bearing::{decide, Turn};
use crate::config::{NavConfig, NavError};
use crate::fix::{FixSource, FixTracker, GpsFix};
use crate::geo::{course_to, distance_between};
use crate::heading::{HeadingProvider, MagSource};
use crate::waypoint::WaypointTable;

/// Fraction of a leg's initial distance below which the bearing deadband is halved.
pub const NEAR_TARGET_FRACTION: f64 = 0.10;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NavState {
    Init,
    WaitForGpsLock,
    WaitForGpsStabilize,
    WaitForGpsRelock,
    SetNextWaypoint,
    Start,
    Run,
    Stop,
    Idle,
}

impl NavState {
    pub fn name(&self) -> &'static str {
        match self {
            NavState::Init => "Init",
            NavState::WaitForGpsLock => "Wait for GPS Lock",
            NavState::WaitForGpsStabilize => "Wait for GPS to Stabilize",
            NavState::WaitForGpsRelock => "Wait for GPS Relock",
            NavState::SetNextWaypoint => "Set Next Waypoint",
            NavState::Start => "Start",
            NavState::Run => "Run",
            NavState::Stop => "Stop",
            NavState::Idle => "Idle",
        }
    }
}

impl fmt::Display for NavState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Per-leg session values. Replaced wholesale when a new target is selected.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Leg {
    pub bearing_deg: f64,
    pub initial_distance_m: f64,
    pub distance_m: f64,
    pub refresh_counter: u32,
}

impl Leg {
    fn new(bearing_deg: f64) -> Self {
        Self { bearing_deg, ..Self::default() }
    }

    /// Deadband to steer with: half of `nominal` once within the last tenth of the leg.
    pub fn tolerance(&self, nominal: f64) -> f64 {
        if self.distance_m <= self.initial_distance_m * NEAR_TARGET_FRACTION {
            nominal * 0.5
        } else {
            nominal
        }
    }
}

#[derive(Debug, Clone)]
pub struct TickReport {
    pub state: NavState,
    pub heading: f64,
    pub fix: GpsFix,
    pub locked: bool,
    pub events: Vec<StatusEvent>,
}

pub struct Navigator<F, M, A> {
    cfg: NavConfig,
    gps: FixTracker<F>,
    compass: HeadingProvider<M>,
    table: WaypointTable,
    actuator: A,

    state: NavState,
    leg: Option<Leg>,
    stabilize_left: u32,
    resume_requested: bool,
}

impl<F: FixSource, M: MagSource, A: ActuatorSink> Navigator<F, M, A> {
    pub fn new(cfg: NavConfig, fixes: F, mag: M, actuator: A) -> Result<Self, NavError> {
        cfg.validate()?;
        let table = WaypointTable::from_config(&cfg)?;
        info!(
            waypoints = table.len(),
            fixed_home = cfg.fixed_home(),
            tolerance = cfg.bearing_tolerance_deg,
            "navigator ready"
        );
        Ok(Self {
            cfg,
            gps: FixTracker::new(fixes),
            compass: HeadingProvider::new(mag),
            table,
            actuator,
            state: NavState::Init,
            leg: None,
            stabilize_left: 0,
            resume_requested: false,
        })
    }

    pub fn state(&self) -> NavState { self.state }

    pub fn leg(&self) -> Option<Leg> { self.leg }

    pub fn waypoints(&self) -> &WaypointTable { &self.table }

    pub fn config(&self) -> &NavConfig { &self.cfg }

    pub fn actuator(&self) -> &A { &self.actuator }

    pub fn actuator_mut(&mut self) -> &mut A { &mut self.actuator }

    pub fn fix_source_mut(&mut self) -> &mut F { self.gps.source_mut() }

    pub fn mag_source_mut(&mut self) -> &mut M { self.compass.source_mut() }

    /// External go-ahead for leaving Idle. Ignored in any other state.
    pub fn resume(&mut self) {
        if self.state == NavState::Idle {
            self.resume_requested = true;
        } else {
            debug!(state = %self.state, "resume ignored");
        }
    }

    /// Stop the motor and center the rudder.
    pub fn halt(&mut self) {
        self.actuator.set_speed(SpeedLevel::Stop);
        self.actuator.set_rudder(RudderPosition::Center);
    }

    /// One control cycle: refresh sensors, then run the state machine once.
    pub fn tick(&mut self) -> TickReport {
        let (fix, locked) = self.gps.update();
        let heading = self.compass.heading(self.cfg.declination_deg);

        let mut events = vec![StatusEvent::Heading { deg: heading }];
        self.step(&fix, locked, heading, &mut events);

        TickReport { state: self.state, heading, fix, locked, events }
    }

    fn step(&mut self, fix: &GpsFix, locked: bool, heading: f64, events: &mut Vec<StatusEvent>) {
        match self.state {
            NavState::Init => {
                self.table.reset();
                self.enter(NavState::WaitForGpsLock, events);
            }

            NavState::WaitForGpsLock => {
                if locked {
                    self.stabilize_left = self.cfg.gps_stabilize_ticks;
                    self.enter(NavState::WaitForGpsStabilize, events);
                }
            }

            NavState::WaitForGpsStabilize => {
                if self.stabilize_left > 0 {
                    self.stabilize_left -= 1;
                    return;
                }
                if !self.cfg.fixed_home() && self.table.set_home(fix) {
                    events.push(StatusEvent::HomeLatched { lat: fix.lat, lon: fix.lon });
                }
                let next = if self.cfg.gps_test { NavState::Idle } else { NavState::SetNextWaypoint };
                self.enter(next, events);
            }

            NavState::SetNextWaypoint => {
                let target = self.table.advance();
                let bearing = course_to(fix.lat, fix.lon, target.lat, target.lon);
                self.leg = Some(Leg::new(bearing));
                events.push(StatusEvent::Bearing { waypoint: self.table.current_index(), deg: bearing });
                self.enter(NavState::Start, events);
            }

            NavState::WaitForGpsRelock => {
                if locked {
                    self.enter(NavState::Start, events);
                }
            }

            NavState::Start => self.start(fix, locked, heading, events),

            NavState::Run => self.run(fix, locked, heading, events),

            NavState::Stop => {
                self.actuator.set_speed(SpeedLevel::Stop);
                if locked {
                    self.enter(NavState::Idle, events);
                } else {
                    self.enter(NavState::WaitForGpsRelock, events);
                }
            }

            NavState::Idle => {
                if std::mem::take(&mut self.resume_requested) {
                    let next = if self.leg.is_some() { NavState::Start } else { NavState::SetNextWaypoint };
                    self.enter(next, events);
                }
            }
        }
    }

    /// Turn in place towards the leg bearing, then hand over to Run.
    fn start(&mut self, fix: &GpsFix, locked: bool, heading: f64, events: &mut Vec<StatusEvent>) {
        if !locked {
            self.enter(NavState::Stop, events);
            return;
        }
        let Some(mut leg) = self.leg else {
            self.enter(NavState::SetNextWaypoint, events);
            return;
        };

        let turn = decide(leg.bearing_deg, heading, self.cfg.bearing_tolerance_deg);
        events.push(StatusEvent::Turn { direction: turn.to_string() });

        match turn {
            Turn::Left => {
                self.actuator.set_rudder(RudderPosition::FullLeft);
                self.actuator.set_speed(SpeedLevel::Forward25);
            }
            Turn::Right => {
                self.actuator.set_rudder(RudderPosition::FullRight);
                self.actuator.set_speed(SpeedLevel::Forward25);
            }
            Turn::Straight => {
                self.actuator.set_rudder(RudderPosition::Center);
                self.actuator.set_speed(SpeedLevel::Forward50);

                let target = self.table.current();
                leg.initial_distance_m = distance_between(fix.lat, fix.lon, target.lat, target.lon);
                leg.distance_m = leg.initial_distance_m;
                leg.refresh_counter = 0;
                self.leg = Some(leg);

                events.push(StatusEvent::InitialDistance {
                    waypoint: self.table.current_index(),
                    meters: leg.initial_distance_m,
                });
                self.enter(NavState::Run, events);
            }
        }
    }

    fn run(&mut self, fix: &GpsFix, locked: bool, heading: f64, events: &mut Vec<StatusEvent>) {
        let Some(mut leg) = self.leg else {
            self.enter(NavState::SetNextWaypoint, events);
            return;
        };

        if leg.refresh_counter % self.cfg.refresh_every_ticks == 0 {
            let target = self.table.current();
            leg.distance_m = distance_between(fix.lat, fix.lon, target.lat, target.lon);
            leg.bearing_deg = course_to(fix.lat, fix.lon, target.lat, target.lon);
            debug!(distance_m = leg.distance_m, bearing = leg.bearing_deg, "leg refreshed");
        }
        leg.refresh_counter = leg.refresh_counter.wrapping_add(1);
        self.leg = Some(leg);

        if !locked {
            self.enter(NavState::Stop, events);
            return;
        }

        let tolerance = leg.tolerance(self.cfg.bearing_tolerance_deg);
        match decide(leg.bearing_deg, heading, tolerance) {
            Turn::Left => self.actuator.set_rudder(RudderPosition::Left),
            Turn::Right => self.actuator.set_rudder(RudderPosition::Right),
            Turn::Straight => {
                self.actuator.set_rudder(RudderPosition::Center);
                self.actuator.set_speed(SpeedLevel::Forward100);
            }
        }

        if leg.distance_m <= self.cfg.switch_waypoint_m {
            self.actuator.set_speed(SpeedLevel::Stop);
            events.push(StatusEvent::Arrived { waypoint: self.table.current_index(), meters: leg.distance_m });
            self.enter(NavState::SetNextWaypoint, events);
        }
    }

    fn enter(&mut self, next: NavState, events: &mut Vec<StatusEvent>) {
        debug!(from = %self.state, to = %next, "nav transition");
        self.state = next;
        events.push(StatusEvent::StateChanged { state: next.name().to_string() });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn leg(initial: f64, distance: f64) -> Leg {
        Leg { bearing_deg: 0.0, initial_distance_m: initial, distance_m: distance, refresh_counter: 0 }
    }

    #[test]
    fn tolerance_is_nominal_far_out() {
        assert_eq!(leg(100.0, 50.0).tolerance(10.0), 10.0);
        assert_eq!(leg(100.0, 10.01).tolerance(10.0), 10.0);
    }

    #[test]
    fn tolerance_halves_near_target() {
        assert_eq!(leg(100.0, 10.0).tolerance(10.0), 5.0);
        assert_eq!(leg(100.0, 0.0).tolerance(10.0), 5.0);
        assert_eq!(leg(0.0, 0.0).tolerance(3.0), 1.5);
    }

    #[test]
    fn state_names() {
        assert_eq!(NavState::WaitForGpsLock.to_string(), "Wait for GPS Lock");
        assert_eq!(NavState::Run.name(), "Run");
    }
}
