use helm_nav::actuator::{RudderPosition, SpeedLevel};
use std::time::{Duration, Instant};

/// Drops a command when it repeats the last one sent inside `window`.
#[derive(Debug)]
pub struct RepeatFilter {
    last_rudder: Option<(RudderPosition, Instant)>,
    last_speed: Option<(SpeedLevel, Instant)>,
    window: Duration,
}

impl RepeatFilter {
    pub fn new(window: Duration) -> Self {
        Self { last_rudder: None, last_speed: None, window }
    }

    pub fn allow_rudder(&mut self, pos: RudderPosition) -> bool {
        allow(&mut self.last_rudder, pos, self.window, Instant::now())
    }

    pub fn allow_speed(&mut self, level: SpeedLevel) -> bool {
        allow(&mut self.last_speed, level, self.window, Instant::now())
    }
}

fn allow<T: PartialEq>(last: &mut Option<(T, Instant)>, cmd: T, window: Duration, now: Instant) -> bool {
    if let Some((prev, t)) = last {
        if *prev == cmd && now.duration_since(*t) < window { return false; }
    }
    *last = Some((cmd, now));
    true
}
