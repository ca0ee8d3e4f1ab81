use serde::Serialize;

use crate::{NodeId, WalkingTime, routing::SearchResult};

/// A node reachable in both searches that got faster with the test roads
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImprovedNode {
    pub node_id: NodeId,
    pub base_seconds: WalkingTime,
    pub enhanced_seconds: WalkingTime,
}

/// Effect of the active test roads on one origin and budget
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EnhancementReport {
    /// Nodes reachable only with the test roads, ordered by enhanced time
    pub newly_reachable: Vec<NodeId>,
    pub improved: Vec<ImprovedNode>,
    pub base_area_square_meters: f64,
    pub enhanced_area_square_meters: f64,
    pub area_gain_square_meters: f64,
}

/// Compares a plain search with an enhanced one for the same origin and budget
pub fn compare(
    base: &SearchResult,
    base_area_m2: f64,
    enhanced: &SearchResult,
    enhanced_area_m2: f64,
) -> EnhancementReport {
    let mut newly_reachable = Vec::new();
    let mut improved = Vec::new();

    for &(node, enhanced_seconds) in enhanced.reachable() {
        if !base.is_reachable(node) {
            newly_reachable.push(node);
            continue;
        }
        if let Some(base_seconds) = base.distance(node)
            && enhanced_seconds < base_seconds
        {
            improved.push(ImprovedNode {
                node_id: node,
                base_seconds,
                enhanced_seconds,
            });
        }
    }

    EnhancementReport {
        newly_reachable,
        improved,
        base_area_square_meters: base_area_m2,
        enhanced_area_square_meters: enhanced_area_m2,
        area_gain_square_meters: enhanced_area_m2 - base_area_m2,
    }
}

#[cfg(test)]
mod tests {
    use geo::Point;

    use super::*;
    use crate::{model::Network, routing::search};

    #[test]
    fn reports_new_and_faster_nodes() {
        let mut network = Network::new();
        let a = network.add_node(Point::new(0.0, 0.0));
        let b = network.add_node(Point::new(0.001, 0.0));
        let c = network.add_node(Point::new(0.002, 0.0));
        network.add_edge(a, b, 100.0).unwrap();
        network.add_edge(b, c, 100.0).unwrap();

        let base = search(&network, a, 100.0).unwrap();
        network.add_edge(a, b, 50.0).unwrap();
        network.add_edge(a, c, 100.0).unwrap();
        let enhanced = search(&network, a, 100.0).unwrap();

        let report = compare(&base, 0.0, &enhanced, 10.0);
        assert_eq!(report.newly_reachable, vec![c]);
        assert_eq!(report.improved.len(), 1);
        assert_eq!(report.improved[0].node_id, b);
        assert_eq!(report.area_gain_square_meters, 10.0);
    }
}
