use geo_types::Point;

use crate::error::PlacementError;

/// Mean Earth radius in kilometers.
pub const EARTH_RADIUS_KM: f64 = 6_371.0;

/// Great-circle distance using the haversine formula.
/// Input lat/lon in degrees. Output in kilometers.
pub fn haversine_km(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let (phi1, phi2) = (lat1.to_radians(), lat2.to_radians());
    let dphi = (lat2 - lat1).to_radians();
    let dlambda = (lon2 - lon1).to_radians();
    let a = (dphi / 2.0).sin().powi(2) + phi1.cos() * phi2.cos() * (dlambda / 2.0).sin().powi(2);
    // Rounding can push `a` just past 1.0 for antipodal points.
    let a = a.clamp(0.0, 1.0);
    let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());
    EARTH_RADIUS_KM * c
}

/// Builds a point from latitude/longitude. `geo_types` stores x = lon, y = lat.
pub fn lat_lon(lat: f64, lon: f64) -> Point {
    Point::new(lon, lat)
}

pub fn distance_km(a: &Point, b: &Point) -> f64 {
    haversine_km(a.y(), a.x(), b.y(), b.x())
}

pub fn validate_coords(lat: f64, lon: f64) -> Result<(), PlacementError> {
    let lat_ok = lat.is_finite() && (-90.0..=90.0).contains(&lat);
    let lon_ok = lon.is_finite() && (-180.0..=180.0).contains(&lon);
    if lat_ok && lon_ok {
        Ok(())
    } else {
        Err(PlacementError::InvalidCoords { lat, lon })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f64 = 1e-9;

    #[test]
    fn identical_points_are_zero_apart() {
        assert_eq!(haversine_km(51.5, -0.1, 51.5, -0.1), 0.0);
        assert_eq!(haversine_km(-33.9, 151.2, -33.9, 151.2), 0.0);
    }

    #[test]
    fn distance_is_symmetric() {
        let pairs = [
            ((51.5, -0.1), (48.85, 2.35)),
            ((0.0, 0.0), (0.0, 10.0)),
            ((-33.9, 151.2), (40.7, -74.0)),
        ];
        for ((lat1, lon1), (lat2, lon2)) in pairs {
            let ab = haversine_km(lat1, lon1, lat2, lon2);
            let ba = haversine_km(lat2, lon2, lat1, lon1);
            assert!((ab - ba).abs() < EPS, "{ab} != {ba}");
        }
    }

    #[test]
    fn one_degree_of_longitude_on_equator() {
        let d = haversine_km(0.0, 0.0, 0.0, 1.0);
        assert!((d - 111.195).abs() < 0.01, "got {d}");
    }

    #[test]
    fn antipodal_points_are_half_circumference() {
        let d = haversine_km(0.0, 0.0, 0.0, 180.0);
        let half = std::f64::consts::PI * EARTH_RADIUS_KM;
        assert!(d.is_finite());
        assert!((d - half).abs() < 1e-6, "got {d}");

        let d = haversine_km(90.0, 0.0, -90.0, 0.0);
        assert!((d - half).abs() < 1e-6, "got {d}");
    }

    #[test]
    fn tiny_separation_is_stable() {
        let d = haversine_km(45.0, 7.0, 45.0 + 1e-9, 7.0);
        assert!(d >= 0.0 && d < 1e-3, "got {d}");
    }

    #[test]
    fn near_degenerate_triangle_inequality() {
        let a = lat_lon(10.0, 10.0);
        let b = lat_lon(10.0, 10.5);
        let c = lat_lon(10.0, 11.0);
        let tol = 1e-9;
        assert!(distance_km(&a, &c) <= distance_km(&a, &b) + distance_km(&b, &c) + tol);
        assert!(distance_km(&a, &b) <= distance_km(&a, &c) + distance_km(&c, &b) + tol);
        assert!(distance_km(&b, &c) <= distance_km(&b, &a) + distance_km(&a, &c) + tol);
    }

    #[test]
    fn lat_lon_maps_to_x_y() {
        let p = lat_lon(51.5, -0.1);
        assert_eq!(p.y(), 51.5);
        assert_eq!(p.x(), -0.1);
    }

    #[test]
    fn rejects_out_of_range_coords() {
        assert!(validate_coords(51.5, -0.1).is_ok());
        assert!(validate_coords(90.0, 180.0).is_ok());
        assert!(matches!(
            validate_coords(91.0, 0.0),
            Err(PlacementError::InvalidCoords { .. })
        ));
        assert!(validate_coords(0.0, -180.5).is_err());
        assert!(validate_coords(f64::NAN, 0.0).is_err());
    }
}
