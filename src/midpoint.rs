use geo_types::Point;

use crate::error::PlacementError;
use crate::geo;

/// Coordinate-wise arithmetic mean of `points`.
///
/// This is not a spherical centroid: it drifts for sets spread over large
/// areas and breaks down for sets straddling the ±180° meridian.
pub fn midpoint(points: &[Point]) -> Result<Point, PlacementError> {
    if points.is_empty() {
        return Err(PlacementError::EmptyInput);
    }
    let n = points.len() as f64;
    let (lat_sum, lon_sum) = points
        .iter()
        .fold((0.0, 0.0), |(lat, lon), p| (lat + p.y(), lon + p.x()));
    Ok(geo::lat_lon(lat_sum / n, lon_sum / n))
}
