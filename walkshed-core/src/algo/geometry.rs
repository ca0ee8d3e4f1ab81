//! Planar approximations over longitude/latitude degrees.
//!
//! Distances and areas are computed in a local equirectangular frame:
//! one degree of latitude is [`METERS_PER_DEGREE`] meters and one degree of
//! longitude shrinks by `cos(latitude)`. Good enough for walking-scale areas.

use geo::Point;

use crate::METERS_PER_DEGREE;

/// Meters per degree of longitude at the given latitude (degrees)
pub fn meters_per_degree_lng(lat: f64) -> f64 {
    METERS_PER_DEGREE * lat.to_radians().cos()
}

/// Approximate planar distance between two points in meters
pub fn planar_distance_m(a: Point<f64>, b: Point<f64>) -> f64 {
    let mean_lat = (a.y() + b.y()) / 2.0;
    let dx = (b.x() - a.x()) * meters_per_degree_lng(mean_lat);
    let dy = (b.y() - a.y()) * METERS_PER_DEGREE;
    dx.hypot(dy)
}

/// Shoelace area of an ordered ring in squared degrees.
///
/// The ring may be open or closed; the closing segment is implied.
pub fn shoelace_area_deg2(ring: &[Point<f64>]) -> f64 {
    if ring.len() < 3 {
        return 0.0;
    }
    let twice_area: f64 = ring
        .iter()
        .zip(ring.iter().cycle().skip(1))
        .map(|(p, q)| p.x() * q.y() - q.x() * p.y())
        .sum();
    twice_area.abs() / 2.0
}

/// Area of an ordered ring in square meters, scaled at the first point's latitude
pub fn ring_area_m2(ring: &[Point<f64>]) -> f64 {
    let Some(first) = ring.first() else {
        return 0.0;
    };
    shoelace_area_deg2(ring) * METERS_PER_DEGREE * meters_per_degree_lng(first.y())
}
