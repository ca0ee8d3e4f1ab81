//! Budget-limited shortest walking time search

pub mod dijkstra;
mod graph;

pub use dijkstra::{
    SearchOptions, SearchResult, path_coordinates, path_to_geojson, reconstruct_path, search,
    search_many, search_with_options,
};
pub use graph::WalkGraph;
