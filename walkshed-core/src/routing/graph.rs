use geo::Point;

use crate::{NodeId, WalkingTime, model::Network};

/// Read-only walking graph the reachability search runs over.
///
/// Implemented by the base [`Network`] and by the overlay's fused view, so
/// both go through the same search.
pub trait WalkGraph {
    fn contains(&self, node: NodeId) -> bool;

    /// Node coordinates, x = longitude, y = latitude
    fn position(&self, node: NodeId) -> Option<Point<f64>>;

    /// Neighbors of `node` with the walking time to reach each of them
    fn neighbors(&self, node: NodeId) -> impl Iterator<Item = (NodeId, WalkingTime)> + '_;

    fn node_count(&self) -> usize;
}

impl WalkGraph for Network {
    fn contains(&self, node: NodeId) -> bool {
        self.contains_node(node)
    }

    fn position(&self, node: NodeId) -> Option<Point<f64>> {
        self.get_node(node).map(|n| n.geometry)
    }

    fn neighbors(&self, node: NodeId) -> impl Iterator<Item = (NodeId, WalkingTime)> + '_ {
        Network::neighbors(self, node)
    }

    fn node_count(&self) -> usize {
        Network::node_count(self)
    }
}
