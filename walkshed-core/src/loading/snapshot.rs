//! Portable snapshot format of a network

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::Error;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    pub nodes: Vec<SnapshotNode>,
    pub edges: Vec<SnapshotEdge>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SnapshotNode {
    pub id: String,
    pub lng: f64,
    pub lat: f64,
    #[serde(default)]
    pub is_boundary: bool,
    #[serde(default)]
    pub connections: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SnapshotEdge {
    pub from: String,
    pub to: String,
    /// Meters
    pub length: f64,
    /// Seconds; recomputed from `length` on import
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time: Option<f64>,
}

impl Snapshot {
    /// Parses snapshot JSON
    ///
    /// # Errors
    ///
    /// `FormatError` on malformed JSON, missing fields or wrongly typed values.
    pub fn from_json(json: &str) -> Result<Self, Error> {
        serde_json::from_str(json).map_err(|e| Error::FormatError(e.to_string()))
    }

    pub fn to_json(&self) -> Result<String, Error> {
        serde_json::to_string_pretty(self).map_err(|e| Error::FormatError(e.to_string()))
    }

    /// Reads and parses a snapshot file
    pub fn read(path: &Path) -> Result<Self, Error> {
        let json = fs::read_to_string(path).map_err(|e| {
            std::io::Error::new(
                e.kind(),
                format!("Failed to read snapshot '{}': {}", path.display(), e),
            )
        })?;
        Self::from_json(&json)
    }

    pub fn write(&self, path: &Path) -> Result<(), Error> {
        fs::write(path, self.to_json()?)?;
        Ok(())
    }
}
