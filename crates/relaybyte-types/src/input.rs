//! Per-kind job inputs handed to workflows and activities.

use serde::{Deserialize, Serialize};

use crate::catalog::ConfiguredCatalog;

/// Opaque connector state, carried between syncs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct State(pub serde_json::Value);

impl State {
    #[must_use]
    pub fn new(value: serde_json::Value) -> Self {
        Self(value)
    }

    #[must_use]
    pub fn as_value(&self) -> &serde_json::Value {
        &self.0
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CheckConnectionInput {
    pub connection_configuration: serde_json::Value,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiscoverCatalogInput {
    pub connection_configuration: serde_json::Value,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SyncInput {
    #[serde(default)]
    pub prefix: String,
    pub source_configuration: serde_json::Value,
    pub destination_configuration: serde_json::Value,
    pub catalog: ConfiguredCatalog,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<State>,
}
