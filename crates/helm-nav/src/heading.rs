use std::f64::consts::TAU;

use crate::bearing::normalize_deg;

/// Raw horizontal magnetometer reading, sensor units.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct MagVector {
    pub x: f64,
    pub y: f64,
}

impl MagVector {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

pub trait MagSource {
    /// Latest reading, or `None` when the sensor has nothing new this tick.
    fn read(&mut self) -> Option<MagVector>;
}

impl<T: MagSource + ?Sized> MagSource for Box<T> {
    fn read(&mut self) -> Option<MagVector> {
        (**self).read()
    }
}

/// Source that always reports the same vector. Handy for bench runs.
#[derive(Debug, Clone, Copy)]
pub struct FixedMag(pub MagVector);

impl MagSource for FixedMag {
    fn read(&mut self) -> Option<MagVector> {
        Some(self.0)
    }
}

/// Compass heading in degrees [0, 360) from a level 2-axis reading.
///
/// East declination is positive.
pub fn compass_heading(mag: MagVector, declination_deg: f64) -> f64 {
    let mut h = mag.y.atan2(mag.x) - declination_deg.to_radians();
    if h < 0.0 {
        h += TAU;
    }
    if h >= TAU {
        h -= TAU;
    }
    normalize_deg(h.to_degrees())
}

pub struct HeadingProvider<M> {
    source: M,
    last: MagVector,
    heading: f64,
}

impl<M: MagSource> HeadingProvider<M> {
    pub fn new(source: M) -> Self {
        Self { source, last: MagVector::default(), heading: 0.0 }
    }

    /// Refresh from the sensor (reusing the last vector if nothing new) and
    /// return the heading.
    pub fn heading(&mut self, declination_deg: f64) -> f64 {
        if let Some(v) = self.source.read() {
            self.last = v;
        }
        self.heading = compass_heading(self.last, declination_deg);
        self.heading
    }

    pub fn last_heading(&self) -> f64 { self.heading }

    pub fn source_mut(&mut self) -> &mut M { &mut self.source }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn towards(deg: f64) -> MagVector {
        MagVector::new(deg.to_radians().cos(), deg.to_radians().sin())
    }

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn cardinal_points() {
        assert!(close(compass_heading(MagVector::new(1.0, 0.0), 0.0), 0.0));
        assert!(close(compass_heading(MagVector::new(0.0, 1.0), 0.0), 90.0));
        assert!(close(compass_heading(MagVector::new(-1.0, 0.0), 0.0), 180.0));
        assert!(close(compass_heading(MagVector::new(0.0, -1.0), 0.0), 270.0));
    }

    #[test]
    fn magnitude_does_not_matter() {
        let a = compass_heading(MagVector::new(3.0, 4.0), 0.0);
        let b = compass_heading(MagVector::new(300.0, 400.0), 0.0);
        assert!(close(a, b));
    }

    #[test]
    fn declination_shifts_heading() {
        assert!(close(compass_heading(towards(90.0), 10.0), 80.0));
        assert!(close(compass_heading(towards(5.0), 10.0), 355.0));
        assert!(close(compass_heading(towards(355.0), -10.0), 5.0));
    }

    #[test]
    fn always_in_range() {
        let mut raw = -179.0;
        while raw <= 180.0 {
            for decl in [-359.9, -270.0, -180.0, -13.5, 0.0, 13.5, 180.0, 270.0, 359.9] {
                let h = compass_heading(towards(raw), decl);
                assert!((0.0..360.0).contains(&h), "raw={} decl={} h={}", raw, decl, h);
            }
            raw += 1.0;
        }
    }

    struct Scripted(Vec<Option<MagVector>>);

    impl MagSource for Scripted {
        fn read(&mut self) -> Option<MagVector> {
            if self.0.is_empty() { None } else { self.0.remove(0) }
        }
    }

    #[test]
    fn keeps_last_vector_when_sensor_is_quiet() {
        let mut p = HeadingProvider::new(Scripted(vec![Some(towards(45.0)), None]));
        assert!(close(p.heading(0.0), 45.0));
        assert!(close(p.heading(0.0), 45.0));
        assert!(close(p.heading(0.0), 45.0));
        assert!(close(p.last_heading(), 45.0));
    }
}
