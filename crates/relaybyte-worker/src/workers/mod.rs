//! Default workers: the per-kind units of work an activity hands to
//! [`AttemptExecution`](crate::attempt::AttemptExecution).

pub mod check;
pub mod destination;
pub mod discover;
pub mod mapper;
pub mod source;
pub mod spec;
pub mod sync;
pub mod tracker;

use std::path::Path;

use relaybyte_types::protocol::ConnectorMessage;
use serde::Serialize;

pub use check::DefaultCheckConnectionWorker;
pub use destination::{DefaultDestination, Destination};
pub use discover::DefaultDiscoverCatalogWorker;
pub use mapper::NamespacingMapper;
pub use source::{DefaultSource, EmptySource, Source};
pub use spec::DefaultGetSpecWorker;
pub use sync::DefaultSyncWorker;
pub use tracker::MessageTracker;

use crate::error::{Result, WorkerError};
use crate::launcher::ConnectorProcess;

pub const SOURCE_CONFIG_JSON_FILENAME: &str = "source_config.json";
pub const SOURCE_CATALOG_JSON_FILENAME: &str = "source_catalog.json";
pub const INPUT_STATE_JSON_FILENAME: &str = "input_state.json";
pub const DESTINATION_CONFIG_JSON_FILENAME: &str = "destination_config.json";
pub const DESTINATION_CATALOG_JSON_FILENAME: &str = "destination_catalog.json";

/// Write `value` as pretty JSON to `job_root/filename`.
pub(crate) async fn write_json(
    job_root: &Path,
    filename: &str,
    value: &(impl Serialize + Sync),
) -> Result<()> {
    let bytes = serde_json::to_vec_pretty(value)?;
    tokio::fs::write(job_root.join(filename), bytes).await?;
    Ok(())
}

/// Drain `process`, keep the first message `select` accepts, and wait for
/// the process to exit.
///
/// A non-zero exit wins over a missing message.
pub(crate) async fn read_first<T>(
    mut process: ConnectorProcess,
    expected: &'static str,
    mut select: impl FnMut(ConnectorMessage) -> Option<T>,
) -> Result<T> {
    let mut found = None;
    while let Some(message) = process.next_message().await? {
        if found.is_some() {
            continue;
        }
        let message_type = message.type_name();
        found = select(message);
        if found.is_none() {
            tracing::debug!(
                image = process.image(),
                message_type,
                expected,
                "Ignoring connector message"
            );
        }
    }
    process.wait().await?;
    found.ok_or_else(|| WorkerError::MissingOutput {
        image: process.image().to_string(),
        expected,
    })
}

#[cfg(test)]
pub(crate) mod test_support {
    use relaybyte_types::catalog::{
        ConfiguredCatalog, ConfiguredStream, DestinationSyncMode, Stream, SyncMode,
    };
    use relaybyte_types::protocol::{ConnectorMessage, RecordMessage, StateMessage};

    pub fn record(stream: &str, data: serde_json::Value) -> ConnectorMessage {
        ConnectorMessage::Record(RecordMessage {
            stream: stream.into(),
            data,
            emitted_at: 1_700_000_000_000,
        })
    }

    pub fn state(data: serde_json::Value) -> ConnectorMessage {
        ConnectorMessage::State(StateMessage { data })
    }

    pub fn catalog(names: &[&str]) -> ConfiguredCatalog {
        ConfiguredCatalog {
            streams: names
                .iter()
                .map(|name| ConfiguredStream {
                    stream: Stream {
                        name: (*name).to_string(),
                        json_schema: serde_json::json!({"type": "object"}),
                        supported_sync_modes: vec![SyncMode::FullRefresh],
                        source_defined_cursor: None,
                    },
                    sync_mode: SyncMode::FullRefresh,
                    destination_sync_mode: DestinationSyncMode::Overwrite,
                    cursor_field: Vec::new(),
                })
                .collect(),
        }
    }
}
