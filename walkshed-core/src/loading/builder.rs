use hashbrown::{HashMap, HashSet};
use log::{info, warn};

use super::snapshot::{Snapshot, SnapshotEdge, SnapshotNode};
use crate::{Error, NodeId, model::Network, walk_time_seconds};

/// Largest tolerated difference between a stored edge time and the one
/// derived from its length, in seconds
const TIME_MISMATCH_TOLERANCE: f64 = 0.5;

/// Exports the complete network state, nodes and edges ordered by id
pub fn export_snapshot(network: &Network) -> Snapshot {
    let nodes = network
        .all_nodes()
        .into_iter()
        .map(|node| SnapshotNode {
            id: node.id.to_string(),
            lng: node.geometry.x(),
            lat: node.geometry.y(),
            is_boundary: node.is_boundary,
            connections: node.neighbors.iter().map(ToString::to_string).collect(),
        })
        .collect();

    let edges = network
        .all_edges()
        .into_iter()
        .map(|edge| {
            let (from, to) = edge.key.endpoints();
            SnapshotEdge {
                from: from.to_string(),
                to: to.to_string(),
                length: edge.length,
                time: Some(edge.time),
            }
        })
        .collect();

    let snapshot = Snapshot { nodes, edges };
    info!(
        "Exported snapshot with {} nodes and {} edges",
        snapshot.nodes.len(),
        snapshot.edges.len()
    );
    snapshot
}

/// Builds a fresh network from a snapshot.
///
/// The id generator resumes one past the largest imported numeric id.
///
/// # Errors
///
/// `FormatError` if a node id has no numeric suffix, is duplicated or leaves
/// no room for a next id, a coordinate is not finite, or an edge or connection references an unknown
/// node. Nothing outside the returned network is touched, so a failed import
/// leaves the caller's current network as it was.
pub fn import_snapshot(snapshot: &Snapshot) -> Result<Network, Error> {
    let mut network = Network::new();
    let mut ids: HashMap<&str, NodeId> = HashMap::with_capacity(snapshot.nodes.len());
    let mut seen: HashSet<NodeId> = HashSet::with_capacity(snapshot.nodes.len());

    for node in &snapshot.nodes {
        let id = parse_id(&node.id)?;
        if id.0 == u64::MAX {
            return Err(Error::FormatError(format!(
                "Node id '{}' leaves no room for new ids",
                node.id
            )));
        }
        if !seen.insert(id) || ids.insert(node.id.as_str(), id).is_some() {
            return Err(Error::FormatError(format!("Duplicate node id '{}'", node.id)));
        }
        if !node.lng.is_finite() || !node.lat.is_finite() {
            return Err(Error::FormatError(format!(
                "Node '{}' has non-finite coordinates",
                node.id
            )));
        }
        network.insert_node(id, geo::Point::new(node.lng, node.lat), node.is_boundary);
    }

    let lookup = |raw: &str, context: &str| {
        ids.get(raw).copied().ok_or_else(|| {
            Error::FormatError(format!("{context} references unknown node '{raw}'"))
        })
    };

    for edge in &snapshot.edges {
        let from = lookup(&edge.from, "Edge")?;
        let to = lookup(&edge.to, "Edge")?;
        network.add_edge(from, to, edge.length).map_err(|e| {
            Error::FormatError(format!("Edge '{}' - '{}': {e}", edge.from, edge.to))
        })?;

        if let Some(time) = edge.time
            && (time - walk_time_seconds(edge.length)).abs() > TIME_MISMATCH_TOLERANCE
        {
            warn!(
                "Edge '{}' - '{}' stores {time:.1}s but its length implies {:.1}s; using the latter",
                edge.from,
                edge.to,
                walk_time_seconds(edge.length)
            );
        }
    }

    for node in &snapshot.nodes {
        let id = ids[node.id.as_str()];
        for connection in &node.connections {
            let other = lookup(connection, "Connection")?;
            if network.get_edge(id, other).is_none() {
                warn!(
                    "Node '{}' lists connection '{connection}' without a matching edge; ignoring",
                    node.id
                );
            }
        }
    }

    let next_id = seen.iter().map(|id| id.0 + 1).max().unwrap_or(0);
    network.set_next_id(next_id);

    info!(
        "Imported snapshot with {} nodes and {} edges, next node id {}",
        network.node_count(),
        network.edge_count(),
        network.next_node_id()
    );
    Ok(network)
}

/// Parses and imports snapshot JSON in one step
pub fn import_json(json: &str) -> Result<Network, Error> {
    import_snapshot(&Snapshot::from_json(json)?)
}

fn parse_id(raw: &str) -> Result<NodeId, Error> {
    raw.parse()
        .map_err(|e| Error::FormatError(format!("Invalid node id: {e}")))
}
