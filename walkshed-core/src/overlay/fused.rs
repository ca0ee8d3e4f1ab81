//! Read-only composition of the base network with active test roads

use geo::Point;
use hashbrown::HashMap;
use log::{trace, warn};
use serde::{Deserialize, Serialize};

use super::roads::{OverlayManager, TestRoad};
use crate::{
    Error, NodeId, WalkingTime,
    algo::geometry::planar_distance_m,
    model::Network,
    routing::{SearchOptions, SearchResult, WalkGraph, search_with_options},
};

/// Overlay tuning
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OverlayConfig {
    /// A test-road endpoint within this many meters of an existing node reuses it
    pub snap_tolerance_m: f64,
}

impl Default for OverlayConfig {
    fn default() -> Self {
        Self {
            snap_tolerance_m: 1.0,
        }
    }
}

/// How test roads are combined with the base network
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OverlayStrategy {
    /// Fuse roads into the graph and rerun the full search
    #[default]
    Fused,
    /// Approximate fast path: one test-road hop from the base reachable set.
    /// Does not follow chains of test roads.
    OneHop,
}

/// Base network plus synthetic nodes and edges for each active test road.
///
/// Synthetic node ids start at the base network's next id, so they never
/// collide with stored nodes. The view borrows the network and lives only
/// for one query.
#[derive(Debug, Clone)]
pub struct FusedView<'a> {
    base: &'a Network,
    synthetic: HashMap<NodeId, Point<f64>>,
    extra_edges: HashMap<NodeId, Vec<(NodeId, WalkingTime)>>,
    /// Resolved endpoints of each fused road, in road order
    road_endpoints: Vec<(NodeId, NodeId, WalkingTime)>,
}

impl<'a> FusedView<'a> {
    pub fn new<'r>(
        base: &'a Network,
        roads: impl IntoIterator<Item = &'r TestRoad>,
        config: &OverlayConfig,
    ) -> Self {
        let mut view = Self {
            base,
            synthetic: HashMap::new(),
            extra_edges: HashMap::new(),
            road_endpoints: Vec::new(),
        };

        for road in roads.into_iter().filter(|road| road.is_active()) {
            let (Some(start), Some(end)) = (
                view.resolve_endpoint(road.start, config.snap_tolerance_m),
                view.resolve_endpoint(road.end, config.snap_tolerance_m),
            ) else {
                warn!("No node ids left for test road {}, skipping", road.id);
                continue;
            };
            if start == end {
                trace!("Test road {} collapses onto {start}, skipping", road.id);
                continue;
            }
            view.extra_edges
                .entry(start)
                .or_default()
                .push((end, road.time));
            view.extra_edges
                .entry(end)
                .or_default()
                .push((start, road.time));
            view.road_endpoints.push((start, end, road.time));
        }
        view
    }

    /// Existing base or synthetic node at `point`, or a fresh synthetic node.
    /// `None` once the id space above the base network is used up.
    fn resolve_endpoint(&mut self, point: Point<f64>, tolerance_m: f64) -> Option<NodeId> {
        if let Some((node, distance)) = self.base.nearest_node(point)
            && distance <= tolerance_m
        {
            trace!("Test road endpoint {point:?} snapped to {node} ({distance:.2} m)");
            return Some(node);
        }

        if let Some((node, _)) = self
            .synthetic
            .iter()
            .filter(|(_, existing)| planar_distance_m(point, **existing) <= tolerance_m)
            .min_by_key(|(id, _)| **id)
        {
            return Some(*node);
        }

        let id = NodeId(
            self.base
                .next_node_id()
                .0
                .checked_add(self.synthetic.len() as u64)?,
        );
        self.synthetic.insert(id, point);
        Some(id)
    }

    pub fn base(&self) -> &Network {
        self.base
    }

    pub fn is_synthetic(&self, node: NodeId) -> bool {
        self.synthetic.contains_key(&node)
    }

    /// Synthetic nodes in creation order
    pub fn synthetic_nodes(&self) -> Vec<(NodeId, Point<f64>)> {
        let mut nodes: Vec<_> = self.synthetic.iter().map(|(id, point)| (*id, *point)).collect();
        nodes.sort_unstable_by_key(|(id, _)| *id);
        nodes
    }

    pub fn road_count(&self) -> usize {
        self.road_endpoints.len()
    }
}

impl WalkGraph for FusedView<'_> {
    fn contains(&self, node: NodeId) -> bool {
        self.base.contains_node(node) || self.is_synthetic(node)
    }

    fn position(&self, node: NodeId) -> Option<Point<f64>> {
        self.base
            .get_node(node)
            .map(|n| n.geometry)
            .or_else(|| self.synthetic.get(&node).copied())
    }

    fn neighbors(&self, node: NodeId) -> impl Iterator<Item = (NodeId, WalkingTime)> + '_ {
        self.base
            .neighbors(node)
            .chain(self.extra_edges.get(&node).into_iter().flatten().copied())
    }

    fn node_count(&self) -> usize {
        self.base.node_count() + self.synthetic.len()
    }
}

/// Reachability over the base network fused with every active test road.
///
/// Fusing only adds edges, so the result is always a superset of the plain
/// search with the same origin and budget.
///
/// # Errors
///
/// `OriginNotFound` if `origin` is not a base network node.
pub fn compute_enhanced(
    network: &Network,
    overlay: &OverlayManager,
    origin: NodeId,
    max_time: WalkingTime,
    config: &OverlayConfig,
    options: &SearchOptions,
) -> Result<SearchResult, Error> {
    if !network.contains_node(origin) {
        return Err(Error::OriginNotFound(origin));
    }
    let view = FusedView::new(network, overlay.list_active(), config);
    search_with_options(&view, origin, max_time, options)
}

/// Approximate enhancement: extends the base search by a single test-road
/// hop from already reachable endpoints. Chains of test roads and shortcuts
/// that would pay off further along the network are not followed.
///
/// A base search cut short by the deadline stays flagged as truncated.
///
/// # Errors
///
/// `OriginNotFound` if `origin` is not a base network node.
pub fn one_hop_enhanced(
    view: &FusedView<'_>,
    origin: NodeId,
    max_time: WalkingTime,
    options: &SearchOptions,
) -> Result<SearchResult, Error> {
    let base = search_with_options(view.base(), origin, max_time, options)?;
    let budget = base.max_time();

    let mut additions: Vec<(NodeId, WalkingTime, NodeId)> = Vec::new();
    for &(a, b, time) in &view.road_endpoints {
        for (from, to) in [(a, b), (b, a)] {
            let Some(reached_at) = base.distance(from) else {
                continue;
            };
            let candidate = reached_at + time;
            let known = base.distance(to).unwrap_or(f64::INFINITY);
            if candidate <= budget && candidate < known {
                additions.push((to, candidate, from));
            }
        }
    }

    Ok(base.with_additions(additions))
}
