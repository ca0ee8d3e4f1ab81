//! Round-tripping the network through a portable snapshot

mod builder;
mod snapshot;

pub use builder::{export_snapshot, import_json, import_snapshot};
pub use snapshot::{Snapshot, SnapshotEdge, SnapshotNode};
