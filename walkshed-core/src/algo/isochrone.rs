//! Boundary polygon and area of a reachable set.
//!
//! The reachable set carries no order, so points are first arranged into a
//! ring, either by angle around their centroid (a loose envelope that keeps
//! every reached point on the ring) or by a convex hull (tighter, drops
//! interior points). The area is then the shoelace area of that ring,
//! scaled from squared degrees to square meters.

use std::cmp::Ordering;

use geo::{ConvexHull, Coord, LineString, MultiPoint, Point, Polygon};
use geojson::{Feature, Geometry, Value as GeoJsonValue};
use itertools::Itertools;
use serde::{Deserialize, Serialize};
use serde_json::json;

use super::geometry::ring_area_m2;
use crate::{
    Error,
    model::LngLat,
    routing::{SearchResult, WalkGraph},
};

/// How reachable points are ordered into a boundary ring
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BoundaryPolicy {
    /// Sort all points by angle around the centroid
    #[default]
    AngularSort,
    /// Convex hull of the points
    ConvexHull,
}

/// Ordered boundary ring (open: the first point is not repeated) and its area
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BoundaryPolygon {
    pub ring: Vec<Point<f64>>,
    pub area_m2: f64,
}

impl BoundaryPolygon {
    pub fn is_degenerate(&self) -> bool {
        self.ring.len() < 3
    }

    pub fn lng_lat(&self) -> Vec<LngLat> {
        self.ring.iter().copied().map(LngLat::from).collect()
    }

    /// Closed polygon for downstream geometry work, `None` when degenerate
    pub fn to_polygon(&self) -> Option<Polygon<f64>> {
        if self.is_degenerate() {
            return None;
        }
        let coords: Vec<Coord<f64>> = self.ring.iter().copied().map(Coord::from).collect();
        // Polygon::new closes the exterior ring
        Some(Polygon::new(LineString::new(coords), vec![]))
    }

    /// Renders the boundary as a `GeoJSON` feature. Degenerate boundaries are
    /// emitted as a `MultiPoint`.
    pub fn to_geojson(&self) -> Result<Feature, Error> {
        let geometry = match self.to_polygon() {
            Some(polygon) => Geometry::new(GeoJsonValue::from(&polygon)),
            None => Geometry::new(GeoJsonValue::from(&MultiPoint::new(self.ring.clone()))),
        };

        let value = json!({
            "type": "Feature",
            "geometry": geometry,
            "properties": {
                "area_m2": self.area_m2,
                "vertex_count": self.ring.len(),
            }
        });

        Feature::from_json_value(value).map_err(|e| Error::GeoJsonError(e.to_string()))
    }
}

/// Derives a boundary ring and its area from an unordered set of points.
///
/// Fewer than three distinct points yield area 0 and the points themselves.
pub fn extract_boundary(points: &[Point<f64>], policy: BoundaryPolicy) -> BoundaryPolygon {
    let ring = match policy {
        BoundaryPolicy::AngularSort => angular_ring(points),
        BoundaryPolicy::ConvexHull => hull_ring(points),
    };

    let area_m2 = if ring.len() < 3 { 0.0 } else { ring_area_m2(&ring) };
    BoundaryPolygon { ring, area_m2 }
}

/// Boundary of a search result's reachable set
pub fn boundary_for<G>(result: &SearchResult, graph: &G, policy: BoundaryPolicy) -> BoundaryPolygon
where
    G: WalkGraph + ?Sized,
{
    let points: Vec<Point<f64>> = result
        .reachable_ids()
        .filter_map(|node| graph.position(node))
        .collect();
    extract_boundary(&points, policy)
}

fn centroid(points: &[Point<f64>]) -> Point<f64> {
    #[allow(clippy::cast_precision_loss)]
    let n = points.len() as f64;
    let (sum_x, sum_y) = points
        .iter()
        .fold((0.0, 0.0), |(x, y), p| (x + p.x(), y + p.y()));
    Point::new(sum_x / n, sum_y / n)
}

fn compare_coords(a: &Point<f64>, b: &Point<f64>) -> Ordering {
    a.x().total_cmp(&b.x()).then_with(|| a.y().total_cmp(&b.y()))
}

fn angular_ring(points: &[Point<f64>]) -> Vec<Point<f64>> {
    let unique: Vec<Point<f64>> = points
        .iter()
        .copied()
        .sorted_by(compare_coords)
        .dedup()
        .collect();
    if unique.len() < 3 {
        return unique;
    }

    let center = centroid(&unique);
    unique
        .into_iter()
        .map(|p| {
            let (dx, dy) = (p.x() - center.x(), p.y() - center.y());
            (dy.atan2(dx), dx.hypot(dy), p)
        })
        .sorted_by(|(angle_a, dist_a, a), (angle_b, dist_b, b)| {
            angle_a
                .total_cmp(angle_b)
                .then_with(|| dist_a.total_cmp(dist_b))
                .then_with(|| compare_coords(a, b))
        })
        .map(|(_, _, p)| p)
        .collect()
}

fn hull_ring(points: &[Point<f64>]) -> Vec<Point<f64>> {
    let unique: Vec<Point<f64>> = points
        .iter()
        .copied()
        .sorted_by(compare_coords)
        .dedup()
        .collect();
    if unique.len() < 3 {
        return unique;
    }

    let hull = MultiPoint::new(unique).convex_hull();
    let mut ring: Vec<Point<f64>> = hull.exterior().points().collect();
    // Drop the closing point
    if ring.len() > 1 && ring.first() == ring.last() {
        ring.pop();
    }
    ring
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::METERS_PER_DEGREE;

    fn km_square_shuffled() -> Vec<Point<f64>> {
        let side = 1000.0 / METERS_PER_DEGREE;
        vec![
            Point::new(side, side),
            Point::new(0.0, 0.0),
            Point::new(0.0, side),
            Point::new(side, 0.0),
        ]
    }

    #[test]
    fn angular_sort_fixes_insertion_order() {
        let boundary = extract_boundary(&km_square_shuffled(), BoundaryPolicy::AngularSort);
        assert_eq!(boundary.ring.len(), 4);
        let error = (boundary.area_m2 - 1_000_000.0).abs() / 1_000_000.0;
        assert!(error < 0.01, "area {}", boundary.area_m2);
    }

    #[test]
    fn convex_hull_drops_interior_points() {
        let mut points = km_square_shuffled();
        let side = 1000.0 / METERS_PER_DEGREE;
        points.push(Point::new(side / 2.0, side / 2.0));

        let hull = extract_boundary(&points, BoundaryPolicy::ConvexHull);
        assert_eq!(hull.ring.len(), 4);
        assert!((hull.area_m2 - 1_000_000.0).abs() / 1_000_000.0 < 0.01);

        let star = extract_boundary(&points, BoundaryPolicy::AngularSort);
        assert_eq!(star.ring.len(), 5);
    }

    #[test]
    fn degenerate_inputs_have_zero_area() {
        for points in [
            vec![],
            vec![Point::new(1.0, 1.0)],
            vec![Point::new(1.0, 1.0), Point::new(2.0, 2.0)],
            vec![Point::new(1.0, 1.0), Point::new(1.0, 1.0), Point::new(1.0, 1.0)],
        ] {
            for policy in [BoundaryPolicy::AngularSort, BoundaryPolicy::ConvexHull] {
                let boundary = extract_boundary(&points, policy);
                assert_eq!(boundary.area_m2, 0.0);
                assert!(boundary.ring.len() <= 2);
                assert!(boundary.to_polygon().is_none());
            }
        }
    }

    #[test]
    fn ring_order_is_deterministic() {
        let mut points = km_square_shuffled();
        let first = extract_boundary(&points, BoundaryPolicy::AngularSort);
        points.reverse();
        let second = extract_boundary(&points, BoundaryPolicy::AngularSort);
        assert_eq!(first, second);
    }

    #[test]
    fn geojson_polygon_carries_area() {
        let boundary = extract_boundary(&km_square_shuffled(), BoundaryPolicy::AngularSort);
        let value = serde_json::to_value(boundary.to_geojson().unwrap()).unwrap();
        assert_eq!(value["geometry"]["type"], "Polygon");
        // Closed ring
        assert_eq!(value["geometry"]["coordinates"][0].as_array().unwrap().len(), 5);
        assert!(value["properties"]["area_m2"].as_f64().unwrap() > 999_000.0);
    }

    #[test]
    fn degenerate_geojson_is_multipoint() {
        let boundary = extract_boundary(&[Point::new(1.0, 2.0)], BoundaryPolicy::AngularSort);
        let value = serde_json::to_value(boundary.to_geojson().unwrap()).unwrap();
        assert_eq!(value["geometry"]["type"], "MultiPoint");
    }
}
