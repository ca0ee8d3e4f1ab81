use std::collections::BinaryHeap;
use std::time::{Duration, Instant};

use hashbrown::{HashMap, HashSet, hash_map::Entry};
use log::{debug, warn};
use rayon::prelude::*;

use super::state::State;
use crate::{Error, NodeId, WalkingTime, routing::WalkGraph};

/// How many settled nodes pass between deadline checks
const DEADLINE_CHECK_INTERVAL: usize = 64;

/// Optional limits applied to a single search
#[derive(Debug, Clone, Copy, Default)]
pub struct SearchOptions {
    /// Stop early once this instant passes; the result is then truncated
    pub deadline: Option<Instant>,
}

impl SearchOptions {
    pub fn with_timeout(timeout: Duration) -> Self {
        Self {
            deadline: Instant::now().checked_add(timeout),
        }
    }

    fn expired(&self) -> bool {
        self.deadline.is_some_and(|deadline| Instant::now() >= deadline)
    }
}

/// Shortest walking times from one origin, bounded by a time budget
#[derive(Debug, Clone)]
pub struct SearchResult {
    origin: NodeId,
    max_time: WalkingTime,
    /// Best known time for every labelled node, including the frontier
    /// just beyond the budget
    distances: HashMap<NodeId, WalkingTime>,
    predecessors: HashMap<NodeId, NodeId>,
    /// Settled nodes within the budget, in settle order (time, then id)
    reached: Vec<(NodeId, WalkingTime)>,
    settled: HashSet<NodeId>,
    truncated: bool,
}

impl SearchResult {
    pub fn origin(&self) -> NodeId {
        self.origin
    }

    pub fn max_time(&self) -> WalkingTime {
        self.max_time
    }

    /// True if a deadline cut the search short. The reachable set is then
    /// only a lower bound of the complete answer.
    pub fn is_truncated(&self) -> bool {
        self.truncated
    }

    /// Reachable nodes with their walking time, ordered by time then id
    pub fn reachable(&self) -> &[(NodeId, WalkingTime)] {
        &self.reached
    }

    pub fn reachable_ids(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.reached.iter().map(|(id, _)| *id)
    }

    pub fn reachable_count(&self) -> usize {
        self.reached.len()
    }

    pub fn is_reachable(&self, node: NodeId) -> bool {
        self.settled.contains(&node)
            && self
                .distances
                .get(&node)
                .is_some_and(|&time| time <= self.max_time)
    }

    /// Shortest walking time to `node`, only for nodes in the reachable set
    pub fn distance(&self, node: NodeId) -> Option<WalkingTime> {
        self.is_reachable(node)
            .then(|| self.distances.get(&node).copied())
            .flatten()
    }

    /// Tentative label for `node`, which may exceed its true shortest time
    /// when the node lies beyond the budget
    pub fn tentative_distance(&self, node: NodeId) -> Option<WalkingTime> {
        self.distances.get(&node).copied()
    }

    /// Every label the search produced, settled or not
    pub fn labels(&self) -> &HashMap<NodeId, WalkingTime> {
        &self.distances
    }

    pub fn predecessor(&self, node: NodeId) -> Option<NodeId> {
        self.predecessors.get(&node).copied()
    }

    /// Marks extra nodes reachable at the given time through the given
    /// predecessor, keeping whichever time is lower.
    pub(crate) fn with_additions(
        mut self,
        additions: impl IntoIterator<Item = (NodeId, WalkingTime, NodeId)>,
    ) -> Self {
        for (node, time, via) in additions {
            if time > self.max_time {
                continue;
            }
            let improves = !self.is_reachable(node)
                || self.distances.get(&node).is_some_and(|&known| time < known);
            if !improves {
                continue;
            }
            self.distances.insert(node, time);
            self.predecessors.insert(node, via);
            self.settled.insert(node);
            self.reached.retain(|(id, _)| *id != node);
            self.reached.push((node, time));
        }
        self.reached
            .sort_by(|(id_a, a), (id_b, b)| a.total_cmp(b).then_with(|| id_a.cmp(id_b)));
        self
    }
}

/// Runs a budget-limited search with default options
///
/// # Errors
///
/// Returns `OriginNotFound` if `origin` is not part of the graph.
pub fn search<G>(graph: &G, origin: NodeId, max_time: WalkingTime) -> Result<SearchResult, Error>
where
    G: WalkGraph + ?Sized,
{
    search_with_options(graph, origin, max_time, &SearchOptions::default())
}

/// Dijkstra's algorithm over walking times, bounded by `max_time` seconds.
///
/// Every node is settled at most once. Nodes settled beyond the budget are
/// left out of the reachable set and are not expanded. A negative or NaN
/// budget behaves like zero, so the origin is always reachable.
///
/// # Errors
///
/// Returns `OriginNotFound` if `origin` is not part of the graph.
pub fn search_with_options<G>(
    graph: &G,
    origin: NodeId,
    max_time: WalkingTime,
    options: &SearchOptions,
) -> Result<SearchResult, Error>
where
    G: WalkGraph + ?Sized,
{
    if !graph.contains(origin) {
        return Err(Error::OriginNotFound(origin));
    }
    let max_time = if max_time.is_nan() { 0.0 } else { max_time.max(0.0) };

    let estimated_nodes = graph.node_count().min(1000);
    let mut distances: HashMap<NodeId, WalkingTime> = HashMap::with_capacity(estimated_nodes);
    let mut predecessors: HashMap<NodeId, NodeId> = HashMap::with_capacity(estimated_nodes);
    let mut settled: HashSet<NodeId> = HashSet::with_capacity(estimated_nodes);
    let mut reached = Vec::new();
    let mut heap = BinaryHeap::with_capacity(estimated_nodes / 4);
    let mut truncated = false;

    // Origin is settled at time 0
    heap.push(State {
        cost: 0.0,
        node: origin,
    });
    distances.insert(origin, 0.0);

    while let Some(State { cost, node }) = heap.pop() {
        // Stale entry for a node already settled at a lower cost
        if !settled.insert(node) {
            continue;
        }

        // Everything left in the heap is at least as expensive
        if cost > max_time {
            settled.remove(&node);
            break;
        }
        reached.push((node, cost));

        if reached.len() % DEADLINE_CHECK_INTERVAL == 0 && options.expired() {
            truncated = true;
            break;
        }

        for (next, walking_time) in graph.neighbors(node) {
            if settled.contains(&next) {
                continue;
            }
            let next_cost = cost + walking_time;

            match distances.entry(next) {
                Entry::Vacant(entry) => {
                    entry.insert(next_cost);
                    heap.push(State {
                        cost: next_cost,
                        node: next,
                    });
                    predecessors.insert(next, node);
                }
                Entry::Occupied(mut entry) => {
                    if next_cost < *entry.get() {
                        *entry.get_mut() = next_cost;
                        heap.push(State {
                            cost: next_cost,
                            node: next,
                        });
                        predecessors.insert(next, node);
                    }
                }
            }
        }
    }

    if truncated {
        warn!(
            "Search from {origin} hit its deadline after settling {} nodes; result is partial",
            reached.len()
        );
    } else {
        debug!(
            "Search from {origin} within {max_time:.1}s reached {} nodes",
            reached.len()
        );
    }

    Ok(SearchResult {
        origin,
        max_time,
        distances,
        predecessors,
        reached,
        settled,
        truncated,
    })
}

/// Independent searches from many origins, run in parallel
pub fn search_many<G>(
    graph: &G,
    origins: &[NodeId],
    max_time: WalkingTime,
) -> Vec<Result<SearchResult, Error>>
where
    G: WalkGraph + Sync + ?Sized,
{
    origins
        .par_iter()
        .map(|&origin| search(graph, origin, max_time))
        .collect()
}

#[cfg(test)]
mod tests {
    use geo::Point;

    use super::*;
    use crate::model::Network;

    fn line() -> (Network, NodeId, NodeId, NodeId) {
        let mut network = Network::new();
        let a = network.add_node(Point::new(0.0, 0.0));
        let b = network.add_node(Point::new(0.0009, 0.0));
        let c = network.add_node(Point::new(0.0018, 0.0));
        network.add_edge(a, b, 100.0).unwrap();
        network.add_edge(b, c, 100.0).unwrap();
        (network, a, b, c)
    }

    #[test]
    fn budget_excludes_far_nodes() {
        let (network, a, b, c) = line();
        let result = search(&network, a, 100.0).unwrap();

        assert_eq!(result.reachable_count(), 2);
        assert_eq!(result.reachable()[0], (a, 0.0));
        assert!((result.distance(b).unwrap() - 72.0).abs() < 0.01);
        assert!(!result.is_reachable(c));
        assert_eq!(result.distance(c), None);
        // C stays labelled as frontier, just outside the budget
        assert!(result.tentative_distance(c).unwrap() > 100.0);
    }

    #[test]
    fn unsettled_labels_are_not_distances() {
        let (mut network, a, b, c) = line();
        // Direct edge labels C at 216 s before the 144 s route through B settles
        network.add_edge(a, c, 300.0).unwrap();
        let result = search(&network, a, 50.0).unwrap();

        assert_eq!(result.reachable(), &[(a, 0.0)]);
        assert_eq!(result.distance(b), None);
        assert_eq!(result.distance(c), None);
        assert!((result.tentative_distance(c).unwrap() - 216.0).abs() < 0.1);
    }

    #[test]
    fn larger_budget_reaches_everything() {
        let (network, a, _, c) = line();
        let result = search(&network, a, 150.0).unwrap();
        assert_eq!(result.reachable_count(), 3);
        assert!((result.distance(c).unwrap() - 144.0).abs() < 0.01);
    }

    #[test]
    fn origin_is_reachable_at_zero_budget() {
        let (network, a, _, _) = line();
        for budget in [0.0, -10.0, f64::NAN] {
            let result = search(&network, a, budget).unwrap();
            assert_eq!(result.reachable(), &[(a, 0.0)]);
            assert!(result.is_reachable(a));
        }
    }

    #[test]
    fn missing_origin_is_an_error() {
        let (network, _, _, _) = line();
        assert!(matches!(
            search(&network, NodeId(77), 100.0),
            Err(Error::OriginNotFound(NodeId(77)))
        ));
    }

    #[test]
    fn prefers_shorter_detour() {
        let (mut network, a, b, c) = line();
        network.add_edge(a, c, 500.0).unwrap();
        let result = search(&network, a, 1000.0).unwrap();
        assert_eq!(result.predecessor(c), Some(b));
    }

    #[test]
    fn ties_settle_by_ascending_id() {
        let mut network = Network::new();
        let origin = network.add_node(Point::new(0.0, 0.0));
        let targets: Vec<NodeId> = (0..5)
            .map(|i| network.add_node(Point::new(f64::from(i), 1.0)))
            .collect();
        for &target in targets.iter().rev() {
            network.add_edge(origin, target, 50.0).unwrap();
        }

        let result = search(&network, origin, 100.0).unwrap();
        let order: Vec<NodeId> = result.reachable_ids().skip(1).collect();
        assert_eq!(order, targets);
    }

    #[test]
    fn expired_deadline_truncates() {
        let mut network = Network::new();
        let mut previous = network.add_node(Point::new(0.0, 0.0));
        let origin = previous;
        for i in 1..500 {
            let next = network.add_node(Point::new(f64::from(i) * 0.0001, 0.0));
            network.add_edge(previous, next, 1.0).unwrap();
            previous = next;
        }

        let options = SearchOptions {
            deadline: Some(Instant::now()),
        };
        let result = search_with_options(&network, origin, f64::INFINITY, &options).unwrap();
        assert!(result.is_truncated());
        assert_eq!(result.reachable_count(), DEADLINE_CHECK_INTERVAL);
        assert!(result.is_reachable(origin));
    }

    #[test]
    fn many_origins_in_parallel() {
        let (network, a, b, c) = line();
        let results = search_many(&network, &[a, b, c, NodeId(99)], 80.0);
        assert_eq!(results.len(), 4);
        assert_eq!(results[0].as_ref().unwrap().reachable_count(), 2);
        assert_eq!(results[1].as_ref().unwrap().reachable_count(), 3);
        assert!(results[3].is_err());
    }
}
