//! Destinations consume a sync's messages.

use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use relaybyte_types::catalog::ConfiguredCatalog;
use relaybyte_types::input::State;
use relaybyte_types::protocol::ConnectorMessage;
use tokio::task::JoinHandle;
use tracing::Instrument;

use super::{write_json, DESTINATION_CATALOG_JSON_FILENAME, DESTINATION_CONFIG_JSON_FILENAME};
use crate::error::{Result, WorkerError};
use crate::launcher::{ConnectorProcess, IntegrationLauncher, MessageReader};

/// Consumer side of a sync.
#[async_trait]
pub trait Destination: Send {
    /// # Errors
    ///
    /// Fails if the destination cannot be prepared or launched.
    async fn start(
        &mut self,
        job_root: &Path,
        config: &serde_json::Value,
        catalog: &ConfiguredCatalog,
    ) -> Result<()>;

    /// # Errors
    ///
    /// Fails if the message cannot be delivered.
    async fn accept(&mut self, message: &ConnectorMessage) -> Result<()>;

    /// Signal end of input and wait for the destination to finish. Returns
    /// the last state the destination committed, if it reported any.
    ///
    /// # Errors
    ///
    /// Fails if the destination did not finish cleanly.
    async fn close(&mut self) -> Result<Option<State>>;
}

/// Destination backed by a connector's `write` command.
///
/// Its stdout is drained on a separate task while input is written, so a
/// chatty destination cannot stall the sync on a full pipe.
pub struct DefaultDestination {
    launcher: Arc<dyn IntegrationLauncher>,
    process: Option<ConnectorProcess>,
    output: Option<JoinHandle<Result<Option<State>>>>,
}

impl DefaultDestination {
    #[must_use]
    pub fn new(launcher: Arc<dyn IntegrationLauncher>) -> Self {
        Self {
            launcher,
            process: None,
            output: None,
        }
    }

    fn not_started(&self) -> WorkerError {
        WorkerError::StreamClosed {
            image: self.launcher.image().to_string(),
            stream: "stdin",
        }
    }
}

async fn drain_committed_state(mut reader: MessageReader) -> Result<Option<State>> {
    let mut last_state = None;
    while let Some(message) = reader.next_message().await? {
        match message {
            ConnectorMessage::State(state) => last_state = Some(State::new(state.data)),
            other => tracing::debug!(
                message_type = other.type_name(),
                "Ignoring destination message"
            ),
        }
    }
    Ok(last_state)
}

#[async_trait]
impl Destination for DefaultDestination {
    async fn start(
        &mut self,
        job_root: &Path,
        config: &serde_json::Value,
        catalog: &ConfiguredCatalog,
    ) -> Result<()> {
        write_json(job_root, DESTINATION_CONFIG_JSON_FILENAME, config).await?;
        write_json(job_root, DESTINATION_CATALOG_JSON_FILENAME, catalog).await?;

        let mut process = self.launcher.write(
            job_root,
            DESTINATION_CONFIG_JSON_FILENAME,
            DESTINATION_CATALOG_JSON_FILENAME,
        )?;
        if let Some(reader) = process.take_output() {
            self.output = Some(tokio::spawn(
                drain_committed_state(reader).instrument(tracing::Span::current()),
            ));
        }
        self.process = Some(process);
        Ok(())
    }

    async fn accept(&mut self, message: &ConnectorMessage) -> Result<()> {
        match self.process.as_mut() {
            Some(process) => process.send(message).await,
            None => Err(self.not_started()),
        }
    }

    async fn close(&mut self) -> Result<Option<State>> {
        let Some(mut process) = self.process.take() else {
            return Err(self.not_started());
        };
        process.close_stdin().await?;
        let committed = match self.output.take() {
            Some(handle) => handle
                .await
                .map_err(|err| WorkerError::Io(std::io::Error::other(err)))??,
            None => None,
        };
        process.wait().await?;
        Ok(committed)
    }
}
