//! Pedestrian street network model

pub mod components;
pub mod network;

pub use components::{Edge, EdgeKey, LngLat, Node, NodeId};
pub use network::{IndexedPoint, Network};
