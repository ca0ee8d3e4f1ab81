//! Snapshot-swapping handle for concurrent readers and writers

use std::sync::Arc;

use log::info;
use parking_lot::RwLock;

use super::streets::Network;

/// Cloneable handle to the "current" network.
///
/// Readers take an `Arc` snapshot and search it without holding the lock.
/// Writers mutate copy-on-write under the write lock, so searches already
/// running keep the snapshot they started with.
#[derive(Debug, Clone, Default)]
pub struct SharedNetwork {
    current: Arc<RwLock<Arc<Network>>>,
}

impl SharedNetwork {
    pub fn new(network: Network) -> Self {
        Self {
            current: Arc::new(RwLock::new(Arc::new(network))),
        }
    }

    /// Immutable view of the current network
    pub fn snapshot(&self) -> Arc<Network> {
        Arc::clone(&self.current.read())
    }

    /// Applies a mutation and publishes the result as the current network
    pub fn update<R>(&self, mutate: impl FnOnce(&mut Network) -> R) -> R {
        let mut guard = self.current.write();
        mutate(Arc::make_mut(&mut guard))
    }

    /// Swaps in a whole new network, returning the previous one
    pub fn replace(&self, network: Network) -> Arc<Network> {
        let mut guard = self.current.write();
        info!(
            "Replacing network ({} nodes, {} edges) with {} nodes, {} edges",
            guard.node_count(),
            guard.edge_count(),
            network.node_count(),
            network.edge_count()
        );
        std::mem::replace(&mut *guard, Arc::new(network))
    }
}

#[cfg(test)]
mod tests {
    use geo::Point;

    use super::*;

    #[test]
    fn snapshots_are_isolated_from_later_updates() {
        let shared = SharedNetwork::default();
        let a = shared.update(|network| network.add_node(Point::new(0.0, 0.0)));
        let before = shared.snapshot();

        shared.update(|network| network.add_node(Point::new(1.0, 0.0)));

        assert_eq!(before.node_count(), 1);
        assert_eq!(shared.snapshot().node_count(), 2);
        assert!(shared.snapshot().contains_node(a));
    }

    #[test]
    fn replace_returns_previous_network() {
        let shared = SharedNetwork::default();
        shared.update(|network| network.add_node(Point::new(0.0, 0.0)));
        let previous = shared.replace(Network::new());
        assert_eq!(previous.node_count(), 1);
        assert!(shared.snapshot().is_empty());
    }

    #[test]
    fn clones_share_the_same_network() {
        let shared = SharedNetwork::default();
        let handle = shared.clone();
        handle.update(|network| network.add_node(Point::new(0.0, 0.0)));
        assert_eq!(shared.snapshot().node_count(), 1);
    }
}
