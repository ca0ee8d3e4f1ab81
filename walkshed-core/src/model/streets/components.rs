//! Street network components - identifiers, nodes and edges

use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use geo::Point;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::{WalkingTime, walk_time_seconds};

/// Stable node identifier, never reused by the store that issued it
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub u64);

impl NodeId {
    pub fn index(self) -> u64 {
        self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "node_{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseIdError(String);

impl fmt::Display for ParseIdError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "identifier '{}' has no numeric suffix", self.0)
    }
}

impl std::error::Error for ParseIdError {}

/// Extracts the trailing run of ASCII digits from an identifier,
/// so `node_12`, `n12` and `12` all parse to 12.
pub(crate) fn numeric_suffix(raw: &str) -> Option<u64> {
    let digits_start = raw
        .char_indices()
        .rev()
        .take_while(|(_, c)| c.is_ascii_digit())
        .last()
        .map(|(idx, _)| idx)?;
    raw[digits_start..].parse().ok()
}

impl FromStr for NodeId {
    type Err = ParseIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        numeric_suffix(s)
            .map(NodeId)
            .ok_or_else(|| ParseIdError(s.to_string()))
    }
}

impl Serialize for NodeId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for NodeId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

/// Plain longitude/latitude pair used at the wire boundary
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LngLat {
    pub lng: f64,
    pub lat: f64,
}

impl LngLat {
    pub fn new(lng: f64, lat: f64) -> Self {
        Self { lng, lat }
    }

    pub fn is_finite(&self) -> bool {
        self.lng.is_finite() && self.lat.is_finite()
    }
}

impl From<Point<f64>> for LngLat {
    fn from(point: Point<f64>) -> Self {
        Self {
            lng: point.x(),
            lat: point.y(),
        }
    }
}

impl From<LngLat> for Point<f64> {
    fn from(value: LngLat) -> Self {
        Point::new(value.lng, value.lat)
    }
}

/// Street graph node
#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    pub id: NodeId,
    /// Node coordinates, x = longitude, y = latitude
    pub geometry: Point<f64>,
    /// Nodes sharing an edge with this one
    pub neighbors: BTreeSet<NodeId>,
    /// Whether the node lies on the edge of the area the network was acquired for
    pub is_boundary: bool,
}

impl Node {
    pub(crate) fn new(id: NodeId, geometry: Point<f64>, is_boundary: bool) -> Self {
        Self {
            id,
            geometry,
            neighbors: BTreeSet::new(),
            is_boundary,
        }
    }
}

/// Canonical key of an undirected edge: the endpoint pair in ascending order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EdgeKey {
    low: NodeId,
    high: NodeId,
}

impl EdgeKey {
    pub fn new(a: NodeId, b: NodeId) -> Self {
        if a <= b {
            Self { low: a, high: b }
        } else {
            Self { low: b, high: a }
        }
    }

    pub fn endpoints(&self) -> (NodeId, NodeId) {
        (self.low, self.high)
    }

    pub fn contains(&self, node: NodeId) -> bool {
        self.low == node || self.high == node
    }
}

/// Street graph edge (street segment)
#[derive(Debug, Clone, PartialEq)]
pub struct Edge {
    pub key: EdgeKey,
    /// Segment length in meters
    pub length: f64,
    /// Pedestrian crossing time in seconds
    pub time: WalkingTime,
}

impl Edge {
    pub fn new(key: EdgeKey, length: f64) -> Self {
        Self {
            key,
            length,
            time: walk_time_seconds(length),
        }
    }

    pub fn walking_time(&self) -> WalkingTime {
        self.time
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn edge_key_is_symmetric() {
        assert_eq!(EdgeKey::new(NodeId(3), NodeId(1)), EdgeKey::new(NodeId(1), NodeId(3)));
        assert_eq!(
            EdgeKey::new(NodeId(9), NodeId(2)).endpoints(),
            (NodeId(2), NodeId(9))
        );
    }

    #[test]
    fn node_id_parses_numeric_suffix() {
        assert_eq!("node_12".parse::<NodeId>(), Ok(NodeId(12)));
        assert_eq!("7".parse::<NodeId>(), Ok(NodeId(7)));
        assert_eq!("osm-way-40".parse::<NodeId>(), Ok(NodeId(40)));
        assert!("node_".parse::<NodeId>().is_err());
        assert!("".parse::<NodeId>().is_err());
    }

    #[test]
    fn node_id_round_trips_through_json() {
        let json = serde_json::to_string(&NodeId(5)).unwrap();
        assert_eq!(json, "\"node_5\"");
        let back: NodeId = serde_json::from_str(&json).unwrap();
        assert_eq!(back, NodeId(5));
    }

    #[test]
    fn edge_time_follows_walking_speed() {
        let edge = Edge::new(EdgeKey::new(NodeId(0), NodeId(1)), 100.0);
        assert!((edge.walking_time() - 72.0).abs() < 0.01);
    }
}
