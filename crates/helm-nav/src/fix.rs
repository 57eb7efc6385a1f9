use time::Time;
use tracing::debug;

use crate::bearing::normalize_deg;

/// One decoded position/velocity sample from the GPS decoder.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FixSample {
    pub lat: f64,
    pub lon: f64,
    pub speed_mph: f64,
    pub course_deg: f64,
    /// False when the decoder reports the fix age as invalid.
    pub fix_valid: bool,
    pub time: Option<Time>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct GpsFix {
    pub lat: f64,
    pub lon: f64,
    pub speed_mph: f64,
    pub course_deg: f64,
    pub locked: bool,
    pub time: Option<Time>,
}

impl From<FixSample> for GpsFix {
    fn from(s: FixSample) -> Self {
        Self {
            lat: s.lat,
            lon: s.lon,
            speed_mph: s.speed_mph.max(0.0),
            course_deg: normalize_deg(s.course_deg),
            locked: s.fix_valid,
            time: s.time,
        }
    }
}

pub trait FixSource {
    /// Next buffered sample, `None` once the buffer is empty. Must not block.
    fn next_sample(&mut self) -> Option<FixSample>;
}

impl<T: FixSource + ?Sized> FixSource for Box<T> {
    fn next_sample(&mut self) -> Option<FixSample> {
        (**self).next_sample()
    }
}

pub struct FixTracker<S> {
    source: S,
    fix: GpsFix,
    locked: bool,
}

impl<S: FixSource> FixTracker<S> {
    pub fn new(source: S) -> Self {
        Self { source, fix: GpsFix::default(), locked: false }
    }

    /// Drain whatever the source has buffered. The newest sample wins; with no
    /// new sample the previous fix and lock state are kept as they were.
    pub fn update(&mut self) -> (GpsFix, bool) {
        let mut latest = None;
        let mut n = 0usize;
        while let Some(s) = self.source.next_sample() {
            latest = Some(s);
            n += 1;
        }

        if let Some(s) = latest {
            self.fix = s.into();
            if self.locked != self.fix.locked {
                debug!(locked = self.fix.locked, samples = n, "gps lock changed");
            }
            self.locked = self.fix.locked;
        }
        (self.fix, self.locked)
    }

    pub fn fix(&self) -> GpsFix { self.fix }

    pub fn locked(&self) -> bool { self.locked }

    pub fn source_mut(&mut self) -> &mut S { &mut self.source }
}
