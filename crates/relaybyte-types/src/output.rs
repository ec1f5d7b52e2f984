//! Per-kind job results.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::input::State;

/// Specification document a connector returns for `spec`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConnectorSpecification {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub documentation_url: Option<String>,
    /// JSON Schema of the connector's configuration.
    pub connection_specification: serde_json::Value,
    #[serde(default)]
    pub supports_incremental: bool,
    #[serde(default)]
    pub supports_normalization: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckConnectionStatus {
    Succeeded,
    Failed,
}

impl fmt::Display for CheckConnectionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Succeeded => f.write_str("succeeded"),
            Self::Failed => f.write_str("failed"),
        }
    }
}

/// Outcome of a connection check. A failed check is still a successful
/// attempt: the connector answered.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckConnectionOutput {
    pub status: CheckConnectionStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncStatus {
    Completed,
    Failed,
}

/// Aggregate counts and timing for one sync attempt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncSummary {
    pub status: SyncStatus,
    pub records_synced: u64,
    pub bytes_synced: u64,
    /// Unix epoch milliseconds.
    pub start_time: i64,
    /// Unix epoch milliseconds.
    pub end_time: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SyncOutput {
    pub summary: SyncSummary,
    /// State to hand to the next sync of this connection.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<State>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn check_output_omits_empty_message() {
        let output = CheckConnectionOutput {
            status: CheckConnectionStatus::Succeeded,
            message: None,
        };
        let json = serde_json::to_value(&output).unwrap();
        assert_eq!(json, serde_json::json!({"status": "succeeded"}));
    }

    #[test]
    fn spec_flags_default_to_false() {
        let spec: ConnectorSpecification =
            serde_json::from_value(serde_json::json!({"connection_specification": {}})).unwrap();
        assert!(!spec.supports_incremental);
        assert!(!spec.supports_normalization);
        assert!(spec.documentation_url.is_none());
    }
}
