use std::cmp::Ordering;

use crate::{NodeId, WalkingTime};

#[derive(Copy, Clone, PartialEq)]
pub(super) struct State {
    pub(super) cost: WalkingTime,
    pub(super) node: NodeId,
}

impl Eq for State {}

// Min-heap by cost, ties broken by ascending node id
// (both reversed from standard Rust BinaryHeap)
impl Ord for State {
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .cost
            .total_cmp(&self.cost)
            .then_with(|| other.node.cmp(&self.node))
    }
}

impl PartialOrd for State {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BinaryHeap;

    use super::*;

    #[test]
    fn pops_cheapest_then_lowest_id() {
        let mut heap = BinaryHeap::new();
        for (cost, node) in [(5.0, 1), (1.0, 9), (1.0, 3), (0.5, 7)] {
            heap.push(State {
                cost,
                node: NodeId(node),
            });
        }
        let order: Vec<u64> = std::iter::from_fn(|| heap.pop().map(|s| s.node.0)).collect();
        assert_eq!(order, vec![7, 3, 9, 1]);
    }
}
