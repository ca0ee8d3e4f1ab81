//! Data model for pedestrian reachability
//!
//! Contains the street network store and its concurrent handle.

pub mod shared;
pub mod streets;

pub use shared::SharedNetwork;
pub use streets::{Edge, EdgeKey, LngLat, Network, Node, NodeId};
