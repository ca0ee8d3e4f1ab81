//! Hypothetical "test roads" kept beside the base network

use std::collections::BTreeMap;
use std::fmt;

use geo::Point;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::{Error, WalkingTime, algo::geometry::planar_distance_m, walk_time_seconds};

/// Test road identifier, never reused within one overlay
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TestRoadId(pub u64);

impl fmt::Display for TestRoadId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "road_{}", self.0)
    }
}

impl std::str::FromStr for TestRoadId {
    type Err = crate::model::streets::components::ParseIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.parse::<crate::NodeId>().map(|id| TestRoadId(id.0))
    }
}

impl Serialize for TestRoadId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for TestRoadId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoadStatus {
    Active,
    Deleted,
}

/// A proposed road segment between two coordinates. Endpoints need not
/// coincide with network nodes.
#[derive(Debug, Clone, PartialEq)]
pub struct TestRoad {
    pub id: TestRoadId,
    pub start: Point<f64>,
    pub end: Point<f64>,
    /// Length in meters
    pub length: f64,
    pub time: WalkingTime,
    pub status: RoadStatus,
}

impl TestRoad {
    pub fn is_active(&self) -> bool {
        self.status == RoadStatus::Active
    }
}

/// Set of test roads, independent of any network instance.
///
/// Removal is a soft delete: the record stays (so it can be restored) and
/// its id is never handed out again.
#[derive(Debug, Clone, Default)]
pub struct OverlayManager {
    roads: BTreeMap<TestRoadId, TestRoad>,
    next_id: u64,
}

impl OverlayManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a road whose length is the straight-line distance between its endpoints
    pub fn add_test_road(&mut self, start: Point<f64>, end: Point<f64>) -> TestRoadId {
        self.insert(start, end, planar_distance_m(start, end))
    }

    /// Adds a road with an explicitly surveyed length in meters
    ///
    /// # Errors
    ///
    /// `InvalidLength` for negative or non-finite lengths.
    pub fn add_test_road_with_length(
        &mut self,
        start: Point<f64>,
        end: Point<f64>,
        length: f64,
    ) -> Result<TestRoadId, Error> {
        if !length.is_finite() || length < 0.0 {
            return Err(Error::InvalidLength(length));
        }
        Ok(self.insert(start, end, length))
    }

    fn insert(&mut self, start: Point<f64>, end: Point<f64>, length: f64) -> TestRoadId {
        let id = TestRoadId(self.next_id);
        self.next_id += 1;
        self.roads.insert(
            id,
            TestRoad {
                id,
                start,
                end,
                length,
                time: walk_time_seconds(length),
                status: RoadStatus::Active,
            },
        );
        id
    }

    /// Marks a road deleted. Returns false if unknown or already deleted.
    pub fn remove_test_road(&mut self, id: TestRoadId) -> bool {
        self.set_status(id, RoadStatus::Deleted)
    }

    /// Reactivates a soft-deleted road. Returns false if unknown or already active.
    pub fn restore_test_road(&mut self, id: TestRoadId) -> bool {
        self.set_status(id, RoadStatus::Active)
    }

    fn set_status(&mut self, id: TestRoadId, status: RoadStatus) -> bool {
        match self.roads.get_mut(&id) {
            Some(road) if road.status != status => {
                road.status = status;
                true
            }
            _ => false,
        }
    }

    pub fn get(&self, id: TestRoadId) -> Option<&TestRoad> {
        self.roads.get(&id)
    }

    /// Active roads ordered by id
    pub fn list_active(&self) -> impl Iterator<Item = &TestRoad> {
        self.roads.values().filter(|road| road.is_active())
    }

    /// Every road ever added and not cleared, deleted ones included
    pub fn all(&self) -> impl Iterator<Item = &TestRoad> {
        self.roads.values()
    }

    pub fn active_count(&self) -> usize {
        self.list_active().count()
    }

    /// Drops every record; ids keep counting from where they were
    pub fn clear(&mut self) {
        self.roads.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn soft_delete_keeps_record_and_never_reuses_ids() {
        let mut overlay = OverlayManager::new();
        let first = overlay.add_test_road(Point::new(0.0, 0.0), Point::new(0.001, 0.0));
        assert!(overlay.remove_test_road(first));
        assert!(!overlay.remove_test_road(first));

        assert_eq!(overlay.active_count(), 0);
        assert_eq!(overlay.get(first).unwrap().status, RoadStatus::Deleted);

        let second = overlay.add_test_road(Point::new(0.0, 0.0), Point::new(0.0, 0.001));
        assert!(second > first);
    }

    #[test]
    fn restore_undoes_delete() {
        let mut overlay = OverlayManager::new();
        let id = overlay.add_test_road(Point::new(0.0, 0.0), Point::new(0.001, 0.0));
        overlay.remove_test_road(id);
        assert!(overlay.restore_test_road(id));
        assert!(!overlay.restore_test_road(id));
        assert_eq!(overlay.list_active().count(), 1);
        assert!(!overlay.restore_test_road(TestRoadId(40)));
    }

    #[test]
    fn derived_length_and_time() {
        let mut overlay = OverlayManager::new();
        let id = overlay.add_test_road(Point::new(0.0, 0.0), Point::new(0.0, 0.001));
        let road = overlay.get(id).unwrap();
        assert!((road.length - 111.0).abs() < 1e-6);
        assert!((road.time - walk_time_seconds(111.0)).abs() < 1e-9);
    }

    #[test]
    fn explicit_length_is_validated() {
        let mut overlay = OverlayManager::new();
        let start = Point::new(0.0, 0.0);
        assert!(overlay.add_test_road_with_length(start, start, f64::NAN).is_err());
        assert!(overlay.add_test_road_with_length(start, start, -3.0).is_err());
        let id = overlay.add_test_road_with_length(start, start, 42.0).unwrap();
        assert_eq!(overlay.get(id).unwrap().length, 42.0);
    }

    #[test]
    fn clear_keeps_counting() {
        let mut overlay = OverlayManager::new();
        let first = overlay.add_test_road(Point::new(0.0, 0.0), Point::new(1.0, 0.0));
        overlay.clear();
        assert_eq!(overlay.all().count(), 0);
        let second = overlay.add_test_road(Point::new(0.0, 0.0), Point::new(1.0, 0.0));
        assert!(second > first);
    }

    #[test]
    fn road_ids_render_and_parse() {
        assert_eq!(TestRoadId(3).to_string(), "road_3");
        assert_eq!("road_3".parse::<TestRoadId>(), Ok(TestRoadId(3)));
    }
}
