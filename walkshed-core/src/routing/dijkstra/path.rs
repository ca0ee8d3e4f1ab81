use geo::{Coord, LineString, Point};
use geojson::{Feature, Geometry, Value as GeoJsonValue};
use serde_json::json;

use super::reachability::SearchResult;
use crate::{Error, NodeId, routing::WalkGraph};

/// Walks predecessors back from `target` to `origin`.
/// Returns the node sequence origin → target.
///
/// # Errors
///
/// `Unreachable` if `target` is outside the reachable set of `result`, or if
/// its predecessor chain does not lead back to `origin`.
pub fn reconstruct_path(
    result: &SearchResult,
    origin: NodeId,
    target: NodeId,
) -> Result<Vec<NodeId>, Error> {
    if !result.is_reachable(target) {
        return Err(Error::Unreachable(target));
    }

    let mut path = vec![target];
    let mut current = target;
    // A chain longer than the number of labelled nodes would mean a cycle
    let max_steps = result.labels().len();

    while current != origin {
        if path.len() > max_steps {
            return Err(Error::Unreachable(target));
        }
        current = result
            .predecessor(current)
            .ok_or(Error::Unreachable(target))?;
        path.push(current);
    }

    path.reverse();
    Ok(path)
}

/// Resolves a node path to coordinates, skipping ids the graph does not know
pub fn path_coordinates<G>(graph: &G, path: &[NodeId]) -> Vec<Point<f64>>
where
    G: WalkGraph + ?Sized,
{
    path.iter().filter_map(|&node| graph.position(node)).collect()
}

/// Renders a walking path as a `GeoJSON` `LineString` feature
pub fn path_to_geojson<G>(
    graph: &G,
    result: &SearchResult,
    path: &[NodeId],
) -> Result<Feature, Error>
where
    G: WalkGraph + ?Sized,
{
    let coords: Vec<Coord<f64>> = path_coordinates(graph, path)
        .into_iter()
        .map(Coord::from)
        .collect();
    let geometry = Geometry::new(GeoJsonValue::from(&LineString::new(coords)));

    let target = path.last().copied();
    let value = json!({
        "type": "Feature",
        "geometry": geometry,
        "properties": {
            "origin": result.origin().to_string(),
            "target": target.map(|t| t.to_string()),
            "walking_time": target.and_then(|t| result.distance(t)),
            "node_count": path.len(),
        }
    });

    Feature::from_json_value(value).map_err(|e| Error::GeoJsonError(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{model::Network, routing::search};

    fn square() -> (Network, Vec<NodeId>) {
        let mut network = Network::new();
        let ids: Vec<NodeId> = [(0.0, 0.0), (0.001, 0.0), (0.001, 0.001), (0.0, 0.001)]
            .into_iter()
            .map(|(x, y)| network.add_node(Point::new(x, y)))
            .collect();
        network.add_edge(ids[0], ids[1], 100.0).unwrap();
        network.add_edge(ids[1], ids[2], 100.0).unwrap();
        network.add_edge(ids[0], ids[3], 300.0).unwrap();
        (network, ids)
    }

    #[test]
    fn path_follows_predecessors() {
        let (network, ids) = square();
        let result = search(&network, ids[0], 1000.0).unwrap();
        let path = reconstruct_path(&result, ids[0], ids[2]).unwrap();
        assert_eq!(path, vec![ids[0], ids[1], ids[2]]);
        assert_eq!(reconstruct_path(&result, ids[0], ids[0]).unwrap(), vec![ids[0]]);
    }

    #[test]
    fn unreached_target_is_unreachable() {
        let (mut network, ids) = square();
        let island = network.add_node(Point::new(1.0, 1.0));
        let result = search(&network, ids[0], 1000.0).unwrap();
        assert!(matches!(
            reconstruct_path(&result, ids[0], island),
            Err(Error::Unreachable(id)) if id == island
        ));
    }

    #[test]
    fn target_beyond_budget_is_unreachable() {
        let mut network = Network::new();
        let a = network.add_node(Point::new(0.0, 0.0));
        let b = network.add_node(Point::new(0.0009, 0.0));
        let c = network.add_node(Point::new(0.0018, 0.0));
        network.add_edge(a, b, 100.0).unwrap();
        network.add_edge(b, c, 100.0).unwrap();
        network.add_edge(a, c, 300.0).unwrap();

        // C carries a tentative label through the direct edge only
        let result = search(&network, a, 50.0).unwrap();
        assert!(result.tentative_distance(c).is_some());
        assert!(matches!(
            reconstruct_path(&result, a, c),
            Err(Error::Unreachable(id)) if id == c
        ));
    }

    #[test]
    fn path_renders_as_linestring() {
        let (network, ids) = square();
        let result = search(&network, ids[0], 1000.0).unwrap();
        let path = reconstruct_path(&result, ids[0], ids[2]).unwrap();
        let feature = path_to_geojson(&network, &result, &path).unwrap();

        let value = serde_json::to_value(&feature).unwrap();
        assert_eq!(value["geometry"]["type"], "LineString");
        assert_eq!(value["geometry"]["coordinates"].as_array().unwrap().len(), 3);
        assert_eq!(value["properties"]["node_count"], 3);
    }
}
