// Re-export key components
pub use crate::algo::{BoundaryPolicy, BoundaryPolygon, boundary_for, extract_boundary};
pub use crate::engine::{Engine, EngineConfig, QueryResult, ReachedNode, TestRoadInfo};
pub use crate::loading::{Snapshot, export_snapshot, import_json, import_snapshot};
pub use crate::model::{LngLat, Network, SharedNetwork};
pub use crate::overlay::{
    EnhancementReport, FusedView, OverlayConfig, OverlayManager, OverlayStrategy,
    compute_enhanced, one_hop_enhanced,
};
pub use crate::routing::{
    SearchOptions, SearchResult, WalkGraph, reconstruct_path, search, search_many,
    search_with_options,
};

// Core types for the street network
pub use crate::Error;
pub use crate::NodeId;
pub use crate::TestRoadId;
pub use crate::WalkingTime; // seconds
