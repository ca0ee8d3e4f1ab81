//! The base street network: nodes, canonical edges and adjacency

use geo::Point;
use hashbrown::HashMap;
use log::trace;
use rstar::{RTree, primitives::GeomWithData};

use super::components::{Edge, EdgeKey, Node, NodeId};
use crate::{Error, WalkingTime, algo::geometry::planar_distance_m};

/// Node coordinate tagged with its id, stored in the spatial index
pub type IndexedPoint = GeomWithData<[f64; 2], NodeId>;

fn indexed(id: NodeId, geometry: Point<f64>) -> IndexedPoint {
    GeomWithData::new([geometry.x(), geometry.y()], id)
}

/// Walking network owned by a single store instance.
///
/// Adjacency lives on the nodes themselves; an edge is stored exactly once
/// under its [`EdgeKey`] and both endpoints list each other as neighbors
/// for as long as it exists.
#[derive(Debug, Clone, Default)]
pub struct Network {
    nodes: HashMap<NodeId, Node>,
    edges: HashMap<EdgeKey, Edge>,
    /// Next id handed out by `add_node`
    next_id: u64,
    rtree: RTree<IndexedPoint>,
}

impl Network {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a node at `geometry` (x = longitude, y = latitude) and returns its id
    pub fn add_node(&mut self, geometry: Point<f64>) -> NodeId {
        self.add_node_with_flag(geometry, false)
    }

    pub fn add_node_with_flag(&mut self, geometry: Point<f64>, is_boundary: bool) -> NodeId {
        let id = NodeId(self.next_id);
        self.insert_node(id, geometry, is_boundary);
        id
    }

    /// Inserts a node under an explicit id, keeping the id generator ahead of it
    pub(crate) fn insert_node(&mut self, id: NodeId, geometry: Point<f64>, is_boundary: bool) {
        self.next_id = self.next_id.max(id.0.saturating_add(1));
        if let Some(previous) = self.nodes.insert(id, Node::new(id, geometry, is_boundary)) {
            self.rtree.remove(&indexed(id, previous.geometry));
        }
        self.rtree.insert(indexed(id, geometry));
    }

    pub(crate) fn set_next_id(&mut self, next_id: u64) {
        self.next_id = next_id;
    }

    /// Sets the acquisition-boundary flag, returns false if the node is absent
    pub fn set_boundary(&mut self, id: NodeId, is_boundary: bool) -> bool {
        match self.nodes.get_mut(&id) {
            Some(node) => {
                node.is_boundary = is_boundary;
                true
            }
            None => false,
        }
    }

    /// Removes a node together with every incident edge.
    /// Returns false (and does nothing) if the node is absent.
    pub fn remove_node(&mut self, id: NodeId) -> bool {
        let Some(node) = self.nodes.remove(&id) else {
            return false;
        };

        for neighbor in &node.neighbors {
            self.edges.remove(&EdgeKey::new(id, *neighbor));
            if let Some(other) = self.nodes.get_mut(neighbor) {
                other.neighbors.remove(&id);
            }
        }
        self.rtree.remove(&indexed(id, node.geometry));
        true
    }

    /// Adds an undirected edge, replacing any edge between the same pair
    ///
    /// # Errors
    ///
    /// `EdgeEndpointMissing` if either node is absent, `SelfLoop` if `a == b`,
    /// `InvalidLength` for negative or non-finite lengths. The network is left
    /// unchanged on error.
    pub fn add_edge(&mut self, a: NodeId, b: NodeId, length: f64) -> Result<(), Error> {
        for endpoint in [a, b] {
            if !self.nodes.contains_key(&endpoint) {
                return Err(Error::EdgeEndpointMissing(endpoint));
            }
        }
        if a == b {
            return Err(Error::SelfLoop(a));
        }
        if !length.is_finite() || length < 0.0 {
            return Err(Error::InvalidLength(length));
        }

        let key = EdgeKey::new(a, b);
        if self.edges.insert(key, Edge::new(key, length)).is_some() {
            trace!("Replaced existing edge {a} - {b}");
        }
        if let Some(node) = self.nodes.get_mut(&a) {
            node.neighbors.insert(b);
        }
        if let Some(node) = self.nodes.get_mut(&b) {
            node.neighbors.insert(a);
        }
        Ok(())
    }

    /// Removes the edge between `a` and `b` in either direction; no-op if absent
    pub fn remove_edge(&mut self, a: NodeId, b: NodeId) -> bool {
        if self.edges.remove(&EdgeKey::new(a, b)).is_none() {
            return false;
        }
        if let Some(node) = self.nodes.get_mut(&a) {
            node.neighbors.remove(&b);
        }
        if let Some(node) = self.nodes.get_mut(&b) {
            node.neighbors.remove(&a);
        }
        true
    }

    pub fn get_node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(&id)
    }

    pub fn get_edge(&self, a: NodeId, b: NodeId) -> Option<&Edge> {
        self.edges.get(&EdgeKey::new(a, b))
    }

    pub fn contains_node(&self, id: NodeId) -> bool {
        self.nodes.contains_key(&id)
    }

    /// Unordered view of all nodes
    pub fn nodes(&self) -> impl Iterator<Item = &Node> {
        self.nodes.values()
    }

    /// Unordered view of all edges
    pub fn edges(&self) -> impl Iterator<Item = &Edge> {
        self.edges.values()
    }

    /// All nodes ordered by id
    pub fn all_nodes(&self) -> Vec<&Node> {
        let mut nodes: Vec<&Node> = self.nodes.values().collect();
        nodes.sort_unstable_by_key(|node| node.id);
        nodes
    }

    /// All edges ordered by canonical key
    pub fn all_edges(&self) -> Vec<&Edge> {
        let mut edges: Vec<&Edge> = self.edges.values().collect();
        edges.sort_unstable_by_key(|edge| edge.key);
        edges
    }

    /// Neighbors of `id` with the walking time of the connecting edge
    pub fn neighbors(&self, id: NodeId) -> impl Iterator<Item = (NodeId, WalkingTime)> + '_ {
        self.nodes
            .get(&id)
            .into_iter()
            .flat_map(|node| node.neighbors.iter())
            .filter_map(move |&next| {
                self.edges
                    .get(&EdgeKey::new(id, next))
                    .map(|edge| (next, edge.time))
            })
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Id the next `add_node` call will return
    pub fn next_node_id(&self) -> NodeId {
        NodeId(self.next_id)
    }

    /// Closest node to `point` and its planar distance in meters
    pub fn nearest_node(&self, point: Point<f64>) -> Option<(NodeId, f64)> {
        self.rtree
            .nearest_neighbor(&[point.x(), point.y()])
            .and_then(|entry| {
                let node = self.nodes.get(&entry.data)?;
                Some((node.id, planar_distance_m(point, node.geometry)))
            })
    }

    /// Checks the structural invariants: every edge is mirrored in both
    /// endpoints' neighbor sets, every neighbor reference has an edge, and
    /// no id points at a missing node.
    pub fn is_consistent(&self) -> bool {
        let edges_mirrored = self.edges.keys().all(|key| {
            let (a, b) = key.endpoints();
            a != b
                && self.nodes.get(&a).is_some_and(|n| n.neighbors.contains(&b))
                && self.nodes.get(&b).is_some_and(|n| n.neighbors.contains(&a))
        });
        let neighbors_backed = self.nodes.values().all(|node| {
            node.neighbors.iter().all(|other| {
                self.nodes.contains_key(other)
                    && self.edges.contains_key(&EdgeKey::new(node.id, *other))
            })
        });
        edges_mirrored && neighbors_backed && self.rtree.size() == self.nodes.len()
    }
}
