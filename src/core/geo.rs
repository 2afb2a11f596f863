/// Earth's mean radius in kilometers
const EARTH_RADIUS_KM: f64 = 6371.0;

/// Calculate the Haversine distance between two points in kilometers,
/// rounded to 2 decimal places.
///
/// Returns `None` when a coordinate is non-finite or out of range
/// (latitude outside [-90, 90], longitude outside [-180, 180]). Callers
/// must treat `None` as "distance unknown", not as a hard error: the
/// distance only gates non-critical filtering.
pub fn haversine(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> Option<f64> {
    if !valid_coordinates(lat1, lon1) || !valid_coordinates(lat2, lon2) {
        return None;
    }

    let lat1_rad = lat1.to_radians();
    let lat2_rad = lat2.to_radians();
    let delta_lat = (lat2 - lat1).to_radians();
    let delta_lon = (lon2 - lon1).to_radians();

    let a = (delta_lat / 2.0).sin().powi(2)
        + lat1_rad.cos() * lat2_rad.cos() * (delta_lon / 2.0).sin().powi(2);
    let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());

    let distance = EARTH_RADIUS_KM * c;

    Some((distance * 100.0).round() / 100.0)
}

/// Check whether two points are within `max_distance_km` of each other.
/// An unknown distance counts as out of radius.
#[inline]
pub fn is_within_radius(
    lat1: f64,
    lon1: f64,
    lat2: f64,
    lon2: f64,
    max_distance_km: f64,
) -> bool {
    match haversine(lat1, lon1, lat2, lon2) {
        Some(distance) => distance <= max_distance_km,
        None => false,
    }
}

/// Validate a coordinate pair
#[inline]
pub fn valid_coordinates(lat: f64, lon: f64) -> bool {
    lat.is_finite()
        && lon.is_finite()
        && (-90.0..=90.0).contains(&lat)
        && (-180.0..=180.0).contains(&lon)
}

#[cfg(test)]
mod tests {
    use super::*;

    // Fixture coordinates used across the matching tests
    const PARIS: (f64, f64) = (48.8566, 2.3522);
    const LYON: (f64, f64) = (45.7640, 4.8357);
    const MACON: (f64, f64) = (46.3064, 4.8311);
    const TREVOUX: (f64, f64) = (45.9403, 4.7728);

    #[test]
    fn test_paris_to_lyon() {
        let distance = haversine(PARIS.0, PARIS.1, LYON.0, LYON.1).unwrap();
        assert!(
            (distance - 390.0).abs() < 5.0,
            "Paris-Lyon should be ~390km, got {}",
            distance
        );
    }

    #[test]
    fn test_macon_to_trevoux() {
        // Great-circle distance at R=6371 is 40.96km
        let distance = haversine(MACON.0, MACON.1, TREVOUX.0, TREVOUX.1).unwrap();
        assert!(
            (distance - 41.0).abs() < 1.0,
            "Macon-Trevoux should be ~41km, got {}",
            distance
        );
    }

    #[test]
    fn test_symmetry() {
        let forward = haversine(PARIS.0, PARIS.1, LYON.0, LYON.1);
        let reverse = haversine(LYON.0, LYON.1, PARIS.0, PARIS.1);
        assert_eq!(forward, reverse);
    }

    #[test]
    fn test_same_point_is_zero() {
        assert_eq!(haversine(PARIS.0, PARIS.1, PARIS.0, PARIS.1), Some(0.0));
    }

    #[test]
    fn test_rounded_to_two_decimals() {
        let distance = haversine(PARIS.0, PARIS.1, 48.85, 2.35).unwrap();
        assert_eq!((distance * 100.0).round() / 100.0, distance);
    }

    #[test]
    fn test_out_of_range_coordinates() {
        assert_eq!(haversine(91.0, 0.0, 48.0, 2.0), None);
        assert_eq!(haversine(48.0, 2.0, -91.0, 0.0), None);
        assert_eq!(haversine(48.0, 181.0, 45.0, 4.0), None);
        assert_eq!(haversine(48.0, 2.0, 45.0, -180.5), None);
    }

    #[test]
    fn test_non_finite_coordinates() {
        assert_eq!(haversine(f64::NAN, 2.0, 45.0, 4.0), None);
        assert_eq!(haversine(48.0, f64::INFINITY, 45.0, 4.0), None);
    }

    #[test]
    fn test_within_radius() {
        assert!(is_within_radius(MACON.0, MACON.1, TREVOUX.0, TREVOUX.1, 55.0));
        assert!(!is_within_radius(PARIS.0, PARIS.1, LYON.0, LYON.1, 50.0));
        // Unknown distance is never within radius
        assert!(!is_within_radius(f64::NAN, 2.0, 45.0, 4.0, 1000.0));
    }
}
