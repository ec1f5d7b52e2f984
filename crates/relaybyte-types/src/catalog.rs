//! Stream catalog types.
//!
//! A [`Catalog`] is the set of [`Stream`]s a source connector exposes, as
//! returned by discovery. A [`ConfiguredCatalog`] is the subset of those
//! streams a sync should actually replicate, with the chosen modes.

use serde::{Deserialize, Serialize};

/// How data is read from a source stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncMode {
    /// One-time full read of all records.
    FullRefresh,
    /// Cursor-based incremental reads since last state.
    Incremental,
}

/// How records land in the destination stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DestinationSyncMode {
    #[default]
    Append,
    Overwrite,
}

/// A discoverable stream exposed by a source connector.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Stream {
    /// Stream name (e.g., `"users"`).
    pub name: String,
    /// JSON Schema describing one record of this stream.
    #[serde(default)]
    pub json_schema: serde_json::Value,
    /// Sync modes this stream supports.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub supported_sync_modes: Vec<SyncMode>,
    /// Source-defined cursor path for incremental sync.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_defined_cursor: Option<Vec<String>>,
}

/// Collection of streams discovered by a source connector.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Catalog {
    pub streams: Vec<Stream>,
}

/// A stream selected for replication.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConfiguredStream {
    pub stream: Stream,
    pub sync_mode: SyncMode,
    #[serde(default)]
    pub destination_sync_mode: DestinationSyncMode,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub cursor_field: Vec<String>,
}

/// The streams a sync replicates.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ConfiguredCatalog {
    pub streams: Vec<ConfiguredStream>,
}

impl ConfiguredCatalog {
    /// Names of the configured streams, in catalog order.
    pub fn stream_names(&self) -> impl Iterator<Item = &str> {
        self.streams.iter().map(|s| s.stream.name.as_str())
    }
}
