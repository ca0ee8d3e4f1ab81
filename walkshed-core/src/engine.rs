//! Query interface tying the store, search, boundary and overlay together

use std::sync::Arc;
use std::time::Duration;

use geo::Point;
use geojson::Feature;
use log::info;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

use crate::{
    Error, NodeId, TestRoadId, WalkingTime,
    algo::{BoundaryPolicy, boundary_for},
    loading::{Snapshot, export_snapshot, import_snapshot},
    model::{LngLat, Network, SharedNetwork},
    overlay::{
        EnhancementReport, FusedView, OverlayConfig, OverlayManager, OverlayStrategy,
        RoadStatus, TestRoad, compare, one_hop_enhanced,
    },
    routing::{
        SearchOptions, SearchResult, WalkGraph, path_to_geojson, reconstruct_path,
        search_with_options,
    },
};

/// Engine settings, embeddable in a TOML configuration file
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub boundary_policy: BoundaryPolicy,
    pub overlay: OverlayConfig,
    pub overlay_strategy: OverlayStrategy,
    /// Per-search deadline; a search that runs out returns a truncated result
    pub search_timeout_ms: Option<u64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReachedNode {
    pub node_id: NodeId,
    pub distance_seconds: WalkingTime,
}

/// Reachable set, boundary ring and area for one origin and budget
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryResult {
    pub reachable: Vec<ReachedNode>,
    pub boundary: Vec<LngLat>,
    pub area_square_meters: f64,
    /// A deadline cut the search short; treat as a lower bound
    pub truncated: bool,
    /// Produced by the one-hop fast path rather than a full search
    pub approximate: bool,
}

impl QueryResult {
    pub fn contains(&self, node: NodeId) -> bool {
        self.reachable.iter().any(|reached| reached.node_id == node)
    }

    pub fn distance(&self, node: NodeId) -> Option<WalkingTime> {
        self.reachable
            .iter()
            .find(|reached| reached.node_id == node)
            .map(|reached| reached.distance_seconds)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TestRoadInfo {
    pub id: TestRoadId,
    pub start: LngLat,
    pub end: LngLat,
    pub length: f64,
    pub time: WalkingTime,
    pub status: RoadStatus,
}

impl From<&TestRoad> for TestRoadInfo {
    fn from(road: &TestRoad) -> Self {
        Self {
            id: road.id,
            start: road.start.into(),
            end: road.end.into(),
            length: road.length,
            time: road.time,
            status: road.status,
        }
    }
}

/// Thread-safe reachability engine.
///
/// Network edits and test-road edits are independent; every query works on
/// a consistent pair of network snapshot and active road list.
#[derive(Debug, Default)]
pub struct Engine {
    network: SharedNetwork,
    overlay: RwLock<OverlayManager>,
    config: EngineConfig,
}

impl Engine {
    pub fn new(network: Network, config: EngineConfig) -> Self {
        Self {
            network: SharedNetwork::new(network),
            overlay: RwLock::new(OverlayManager::new()),
            config,
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Current network snapshot
    pub fn network(&self) -> Arc<Network> {
        self.network.snapshot()
    }

    fn search_options(&self) -> SearchOptions {
        self.config
            .search_timeout_ms
            .map(|ms| SearchOptions::with_timeout(Duration::from_millis(ms)))
            .unwrap_or_default()
    }

    fn to_query<G>(&self, result: &SearchResult, graph: &G, approximate: bool) -> QueryResult
    where
        G: WalkGraph + ?Sized,
    {
        let boundary = boundary_for(result, graph, self.config.boundary_policy);
        QueryResult {
            reachable: result
                .reachable()
                .iter()
                .map(|&(node_id, distance_seconds)| ReachedNode {
                    node_id,
                    distance_seconds,
                })
                .collect(),
            boundary: boundary.lng_lat(),
            area_square_meters: boundary.area_m2,
            truncated: result.is_truncated(),
            approximate,
        }
    }

    fn base_result(
        &self,
        network: &Network,
        origin: NodeId,
        max_time: WalkingTime,
    ) -> Result<SearchResult, Error> {
        search_with_options(network, origin, max_time, &self.search_options())
    }

    fn enhanced_result(
        &self,
        view: &FusedView<'_>,
        origin: NodeId,
        max_time: WalkingTime,
    ) -> Result<(SearchResult, bool), Error> {
        if !view.base().contains_node(origin) {
            return Err(Error::OriginNotFound(origin));
        }
        match self.config.overlay_strategy {
            OverlayStrategy::Fused => {
                search_with_options(view, origin, max_time, &self.search_options())
                    .map(|result| (result, false))
            }
            OverlayStrategy::OneHop => {
                one_hop_enhanced(view, origin, max_time, &self.search_options())
                    .map(|result| (result, true))
            }
        }
    }

    /// Active test roads, copied so the overlay lock is not held during a search
    fn active_roads(&self) -> Vec<TestRoad> {
        self.overlay.read().list_active().cloned().collect()
    }

    /// Reachable set and boundary over the base network
    ///
    /// # Errors
    ///
    /// `OriginNotFound` if `origin` is not in the network.
    pub fn search(&self, origin: NodeId, max_time: WalkingTime) -> Result<QueryResult, Error> {
        let network = self.network.snapshot();
        let result = self.base_result(&network, origin, max_time)?;
        Ok(self.to_query(&result, network.as_ref(), false))
    }

    /// Same as [`Engine::search`] with every active test road fused in.
    /// The reachable set is a superset of the plain search.
    ///
    /// # Errors
    ///
    /// `OriginNotFound` if `origin` is not in the base network.
    pub fn compute_enhanced(
        &self,
        origin: NodeId,
        max_time: WalkingTime,
    ) -> Result<QueryResult, Error> {
        let network = self.network.snapshot();
        let roads = self.active_roads();
        let view = FusedView::new(&network, &roads, &self.config.overlay);
        let (result, approximate) = self.enhanced_result(&view, origin, max_time)?;
        Ok(self.to_query(&result, &view, approximate))
    }

    /// Effect of the active test roads for one origin and budget
    pub fn compare(
        &self,
        origin: NodeId,
        max_time: WalkingTime,
    ) -> Result<EnhancementReport, Error> {
        let network = self.network.snapshot();
        let roads = self.active_roads();
        let base = self.base_result(&network, origin, max_time)?;
        let view = FusedView::new(&network, &roads, &self.config.overlay);
        let (enhanced, _) = self.enhanced_result(&view, origin, max_time)?;

        let base_area = boundary_for(&base, network.as_ref(), self.config.boundary_policy).area_m2;
        let enhanced_area = boundary_for(&enhanced, &view, self.config.boundary_policy).area_m2;
        Ok(compare(&base, base_area, &enhanced, enhanced_area))
    }

    /// Walking path from `origin` to `target` within `max_time`, as `GeoJSON`
    ///
    /// # Errors
    ///
    /// `OriginNotFound` for an unknown origin, `Unreachable` if the target is
    /// not reached within the budget.
    pub fn walking_path(
        &self,
        origin: NodeId,
        target: NodeId,
        max_time: WalkingTime,
    ) -> Result<Feature, Error> {
        let network = self.network.snapshot();
        let result = self.base_result(&network, origin, max_time)?;
        if !result.is_reachable(target) {
            return Err(Error::Unreachable(target));
        }
        let path = reconstruct_path(&result, origin, target)?;
        path_to_geojson(network.as_ref(), &result, &path)
    }

    pub fn add_test_road(&self, start: LngLat, end: LngLat) -> TestRoadId {
        self.overlay
            .write()
            .add_test_road(Point::from(start), Point::from(end))
    }

    pub fn add_test_road_with_length(
        &self,
        start: LngLat,
        end: LngLat,
        length: f64,
    ) -> Result<TestRoadId, Error> {
        self.overlay
            .write()
            .add_test_road_with_length(Point::from(start), Point::from(end), length)
    }

    pub fn remove_test_road(&self, id: TestRoadId) -> bool {
        self.overlay.write().remove_test_road(id)
    }

    pub fn restore_test_road(&self, id: TestRoadId) -> bool {
        self.overlay.write().restore_test_road(id)
    }

    pub fn clear_test_roads(&self) {
        self.overlay.write().clear();
    }

    pub fn list_test_roads(&self, include_deleted: bool) -> Vec<TestRoadInfo> {
        let overlay = self.overlay.read();
        overlay
            .all()
            .filter(|road| include_deleted || road.is_active())
            .map(TestRoadInfo::from)
            .collect()
    }

    pub fn add_node(&self, at: LngLat, is_boundary: bool) -> NodeId {
        self.network
            .update(|network| network.add_node_with_flag(Point::from(at), is_boundary))
    }

    pub fn remove_node(&self, id: NodeId) -> bool {
        self.network.update(|network| network.remove_node(id))
    }

    pub fn add_edge(&self, a: NodeId, b: NodeId, length: f64) -> Result<(), Error> {
        self.network.update(|network| network.add_edge(a, b, length))
    }

    pub fn remove_edge(&self, a: NodeId, b: NodeId) -> bool {
        self.network.update(|network| network.remove_edge(a, b))
    }

    pub fn export_snapshot(&self) -> Snapshot {
        export_snapshot(&self.network.snapshot())
    }

    /// Replaces the network with the snapshot's contents. On error the
    /// current network stays in place.
    pub fn import_snapshot(&self, snapshot: &Snapshot) -> Result<(), Error> {
        let network = import_snapshot(snapshot)?;
        self.network.replace(network);
        info!("Network replaced from snapshot");
        Ok(())
    }
}
