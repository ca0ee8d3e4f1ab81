use thiserror::Error;

use crate::NodeId;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Edge endpoint {0} does not exist")]
    EdgeEndpointMissing(NodeId),
    #[error("Self-loop edges are not allowed (node {0})")]
    SelfLoop(NodeId),
    #[error("Invalid edge length: {0}")]
    InvalidLength(f64),
    #[error("Origin node {0} not found")]
    OriginNotFound(NodeId),
    #[error("Node {0} is not reachable from the search origin")]
    Unreachable(NodeId),
    #[error("Snapshot format error: {0}")]
    FormatError(String),
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),
    #[error("GeoJSON error: {0}")]
    GeoJsonError(String),
}
