//! Time-bounded pedestrian reachability over a small street network.
//!
//! The crate stores a walking network, runs budget-limited shortest-time
//! searches from an origin, derives an isochrone boundary with its area, and
//! layers hypothetical "test roads" over the network to estimate the effect
//! of proposed connections without touching the stored graph.

pub mod algo;
pub mod engine;
pub mod error;
pub mod loading;
pub mod model;
pub mod overlay;
pub mod prelude;
pub mod routing;

pub use error::Error;
pub use model::streets::NodeId;
pub use overlay::TestRoadId;

/// Walking speed in meters per minute
pub const WALK_SPEED_M_PER_MIN: f64 = 83.33;

/// Meters per degree of latitude (and of longitude at the equator)
pub const METERS_PER_DEGREE: f64 = 111_000.0;

/// Walking time in seconds
pub type WalkingTime = f64;

/// Converts a walked length in meters to seconds at constant walking speed
#[must_use]
pub fn walk_time_seconds(length_m: f64) -> WalkingTime {
    length_m / WALK_SPEED_M_PER_MIN * 60.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hundred_meters_is_about_seventy_two_seconds() {
        let time = walk_time_seconds(100.0);
        assert!((time - 72.0).abs() < 0.01, "got {time}");
    }

    #[test]
    fn zero_length_is_free() {
        assert_eq!(walk_time_seconds(0.0), 0.0);
    }
}
