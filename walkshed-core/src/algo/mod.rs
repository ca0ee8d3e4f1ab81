//! Geometry derived from search results

pub mod geometry;
pub mod isochrone;

pub use isochrone::{BoundaryPolicy, BoundaryPolygon, boundary_for, extract_boundary};
