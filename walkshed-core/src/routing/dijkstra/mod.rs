mod path;
mod reachability;
mod state;

pub use path::{path_coordinates, path_to_geojson, reconstruct_path};
pub use reachability::{SearchOptions, SearchResult, search, search_many, search_with_options};
