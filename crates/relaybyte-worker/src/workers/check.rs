//! Checks that a connector can reach its system.

use std::path::Path;
use std::sync::Arc;

use relaybyte_types::input::CheckConnectionInput;
use relaybyte_types::output::CheckConnectionOutput;
use relaybyte_types::protocol::ConnectorMessage;

use super::{read_first, write_json, SOURCE_CONFIG_JSON_FILENAME};
use crate::error::Result;
use crate::launcher::IntegrationLauncher;

pub struct DefaultCheckConnectionWorker {
    launcher: Arc<dyn IntegrationLauncher>,
}

impl DefaultCheckConnectionWorker {
    #[must_use]
    pub fn new(launcher: Arc<dyn IntegrationLauncher>) -> Self {
        Self { launcher }
    }

    /// Write the connection configuration into `job_root` and run `check`.
    ///
    /// A `failed` status is a successful run: the connector answered.
    ///
    /// # Errors
    ///
    /// Fails if the config cannot be written, the connector cannot be
    /// launched, exits non-zero, or emits no `connection_status` message.
    pub async fn run(
        &self,
        input: &CheckConnectionInput,
        job_root: &Path,
    ) -> Result<CheckConnectionOutput> {
        write_json(
            job_root,
            SOURCE_CONFIG_JSON_FILENAME,
            &input.connection_configuration,
        )
        .await?;

        let process = self.launcher.check(job_root, SOURCE_CONFIG_JSON_FILENAME)?;
        let output = read_first(process, "connection_status", |message| match message {
            ConnectorMessage::ConnectionStatus(status) => Some(status),
            _ => None,
        })
        .await?;

        tracing::info!(
            image = self.launcher.image(),
            status = %output.status,
            message = output.message.as_deref().unwrap_or(""),
            "Connection check finished"
        );
        Ok(output)
    }
}
