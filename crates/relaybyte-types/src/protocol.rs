//! Line-delimited messages exchanged with connector processes.
//!
//! Each line on a connector's stdout (and each line written to a
//! destination's stdin) is one JSON object tagged by `type`:
//!
//! ```text
//! {"type":"record","stream":"users","data":{"id":1},"emitted_at":1700000000000}
//! {"type":"state","data":{"cursor":"2024-01-01"}}
//! {"type":"connection_status","status":"succeeded"}
//! ```

use serde::{Deserialize, Serialize};

use crate::catalog::Catalog;
use crate::output::{CheckConnectionOutput, ConnectorSpecification};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordMessage {
    pub stream: String,
    pub data: serde_json::Value,
    /// Unix epoch milliseconds.
    #[serde(default)]
    pub emitted_at: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StateMessage {
    pub data: serde_json::Value,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogLevel {
    Fatal,
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogMessage {
    pub level: LogLevel,
    pub message: String,
}

/// One protocol line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ConnectorMessage {
    Record(RecordMessage),
    State(StateMessage),
    Log(LogMessage),
    Spec(ConnectorSpecification),
    ConnectionStatus(CheckConnectionOutput),
    Catalog(Catalog),
}

impl ConnectorMessage {
    /// Short name of the message type, matching its `type` tag.
    #[must_use]
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Record(_) => "record",
            Self::State(_) => "state",
            Self::Log(_) => "log",
            Self::Spec(_) => "spec",
            Self::ConnectionStatus(_) => "connection_status",
            Self::Catalog(_) => "catalog",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::output::CheckConnectionStatus;

    #[test]
    fn record_line_parses() {
        let line = r#"{"type":"record","stream":"users","data":{"id":1},"emitted_at":5}"#;
        let msg: ConnectorMessage = serde_json::from_str(line).unwrap();
        let ConnectorMessage::Record(record) = msg else {
            panic!("expected record");
        };
        assert_eq!(record.stream, "users");
        assert_eq!(record.data["id"], 1);
        assert_eq!(record.emitted_at, 5);
    }

    #[test]
    fn connection_status_line_parses() {
        let line = r#"{"type":"connection_status","status":"failed","message":"bad password"}"#;
        let msg: ConnectorMessage = serde_json::from_str(line).unwrap();
        assert_eq!(msg.type_name(), "connection_status");
        assert_eq!(
            msg,
            ConnectorMessage::ConnectionStatus(CheckConnectionOutput {
                status: CheckConnectionStatus::Failed,
                message: Some("bad password".into()),
            })
        );
    }

    #[test]
    fn unknown_type_is_rejected() {
        let line = r#"{"type":"heartbeat"}"#;
        assert!(serde_json::from_str::<ConnectorMessage>(line).is_err());
    }

    #[test]
    fn state_serializes_with_tag() {
        let msg = ConnectorMessage::State(StateMessage {
            data: serde_json::json!({"cursor": 3}),
        });
        let json = serde_json::to_value(&msg).unwrap();
        assert_eq!(json["type"], "state");
        assert_eq!(json["data"]["cursor"], 3);
    }
}
