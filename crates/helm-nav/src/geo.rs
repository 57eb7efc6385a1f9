/// Mean Earth radius in meters.
const EARTH_RADIUS_M: f64 = 6_371_000.0;

/// Great-circle distance in meters (haversine).
pub fn distance_between(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let dlat = (lat2 - lat1).to_radians();
    let dlon = (lon2 - lon1).to_radians();
    let a = (dlat / 2.0).sin().powi(2)
        + lat1.to_radians().cos() * lat2.to_radians().cos() * (dlon / 2.0).sin().powi(2);
    let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());
    EARTH_RADIUS_M * c
}

/// Initial great-circle course from point 1 to point 2, degrees [0, 360), 0 = north.
pub fn course_to(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let lat_from = lat1.to_radians();
    let lat_to = lat2.to_radians();
    let dlon = (lon2 - lon1).to_radians();

    let y = dlon.sin() * lat_to.cos();
    let x = lat_from.cos() * lat_to.sin() - lat_from.sin() * lat_to.cos() * dlon.cos();

    crate::bearing::normalize_deg(y.atan2(x).to_degrees())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_distance() {
        assert_eq!(distance_between(48.05744, -123.119625, 48.05744, -123.119625), 0.0);
    }

    #[test]
    fn one_millidegree_of_latitude() {
        let d = distance_between(10.0, 20.0, 10.001, 20.0);
        assert!((d - 111.19).abs() < 0.01, "d={}", d);
    }

    #[test]
    fn known_city_pair() {
        // Paris -> London, roughly 344 km
        let d = distance_between(48.8566, 2.3522, 51.5074, -0.1278);
        assert!((d / 1000.0 - 343.5).abs() < 1.0, "d={}", d);
    }

    #[test]
    fn cardinal_courses() {
        assert!((course_to(10.0, 20.0, 10.001, 20.0) - 0.0).abs() < 1e-9);
        assert!((course_to(10.0, 20.0, 9.999, 20.0) - 180.0).abs() < 1e-9);
        assert!((course_to(0.0, 20.0, 0.0, 20.001) - 90.0).abs() < 1e-9);
        assert!((course_to(0.0, 20.0, 0.0, 19.999) - 270.0).abs() < 1e-9);
    }

    #[test]
    fn course_in_range() {
        let c = course_to(48.0, -123.0, 47.9, -123.1);
        assert!((180.0..270.0).contains(&c), "c={}", c);
    }
}
