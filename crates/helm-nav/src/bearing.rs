use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Turn {
    Left,
    Right,
    Straight,
}

impl fmt::Display for Turn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Turn::Left => "LEFT",
            Turn::Right => "RIGHT",
            Turn::Straight => "STRAIGHT",
        };
        f.write_str(s)
    }
}

/// Wrap any angle into [0, 360).
pub fn normalize_deg(deg: f64) -> f64 {
    let d = deg.rem_euclid(360.0);
    // rem_euclid can round up to exactly 360 for tiny negative inputs
    if d >= 360.0 { 0.0 } else { d }
}

/// Smallest angle between two bearings, in [0, 180].
pub fn angular_distance(a: f64, b: f64) -> f64 {
    let d = (normalize_deg(a) - normalize_deg(b)).abs();
    if d > 180.0 { 360.0 - d } else { d }
}

/// Which way to turn from `current` to face `destination`.
///
/// Inside the tolerance deadband the answer is always `Straight`. Outside it the
/// sign of the raw difference and whether it exceeds half a turn pick the side
/// with the shorter sweep, so 350° -> 10° is a right turn and not a 340° left one.
pub fn decide(destination: f64, current: f64, tolerance: f64) -> Turn {
    let destination = normalize_deg(destination);
    let current = normalize_deg(current);

    if angular_distance(destination, current) <= tolerance {
        return Turn::Straight;
    }

    let diff = destination - current;
    let neg = diff < 0.0;
    let big = diff.abs() > 180.0;

    match (neg, big) {
        (false, false) => Turn::Right,
        (false, true) => Turn::Left,
        (true, false) => Turn::Left,
        (true, true) => Turn::Right,
    }
}
