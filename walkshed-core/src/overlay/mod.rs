//! What-if overlay: hypothetical test roads fused with the base network at
//! query time, never written into it.

mod fused;
mod report;
mod roads;

pub use fused::{FusedView, OverlayConfig, OverlayStrategy, compute_enhanced, one_hop_enhanced};
pub use report::{EnhancementReport, ImprovedNode, compare};
pub use roads::{OverlayManager, RoadStatus, TestRoad, TestRoadId};
