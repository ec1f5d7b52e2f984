//! Replicates a configured catalog from a source into a destination.

use std::path::Path;
use std::sync::Arc;

use chrono::Utc;
use relaybyte_types::input::SyncInput;
use relaybyte_types::job::JobRunConfig;
use relaybyte_types::output::{SyncOutput, SyncStatus, SyncSummary};
use relaybyte_types::protocol::ConnectorMessage;

use super::{Destination, MessageTracker, NamespacingMapper, Source};
use crate::error::Result;
use crate::normalization::NormalizationRunner;

pub struct DefaultSyncWorker {
    job_run: JobRunConfig,
    source: Box<dyn Source>,
    mapper: NamespacingMapper,
    destination: Box<dyn Destination>,
    tracker: MessageTracker,
    normalization: Arc<dyn NormalizationRunner>,
}

impl DefaultSyncWorker {
    #[must_use]
    pub fn new(
        job_run: JobRunConfig,
        source: Box<dyn Source>,
        mapper: NamespacingMapper,
        destination: Box<dyn Destination>,
        tracker: MessageTracker,
        normalization: Arc<dyn NormalizationRunner>,
    ) -> Self {
        Self {
            job_run,
            source,
            mapper,
            destination,
            tracker,
            normalization,
        }
    }

    /// Run the sync.
    ///
    /// The destination is started before the source so nothing the source
    /// emits is lost. Record and state messages are forwarded; the returned
    /// state is the destination's last committed state, falling back to the
    /// last state the source emitted.
    ///
    /// # Errors
    ///
    /// Fails if either connector fails or normalization fails.
    pub async fn run(mut self, input: &SyncInput, job_root: &Path) -> Result<SyncOutput> {
        let start_time = Utc::now().timestamp_millis();
        let destination_catalog = self.mapper.map_catalog(&input.catalog);

        self.destination
            .start(job_root, &input.destination_configuration, &destination_catalog)
            .await?;
        self.source
            .start(
                job_root,
                &input.source_configuration,
                &input.catalog,
                input.state.as_ref(),
            )
            .await?;

        while let Some(message) = self.source.next_message().await? {
            let message = self.mapper.map_message(message);
            self.tracker.accept(&message);
            match &message {
                ConnectorMessage::Record(_) | ConnectorMessage::State(_) => {
                    self.destination.accept(&message).await?;
                }
                other => tracing::debug!(
                    message_type = other.type_name(),
                    "Dropping non-data source message"
                ),
            }
        }

        self.source.close().await?;
        let committed_state = self.destination.close().await?;

        tracing::info!(
            job_id = self.job_run.job_id,
            attempt_id = self.job_run.attempt_id,
            records = self.tracker.record_count(),
            bytes = self.tracker.bytes_count(),
            "Sync replicated records"
        );

        self.normalization
            .normalize(
                self.job_run,
                job_root,
                &input.destination_configuration,
                &destination_catalog,
            )
            .await?;

        let state = match committed_state {
            Some(state) => Some(state),
            None => {
                if self.tracker.last_state().is_some() {
                    tracing::warn!("Destination committed no state; using last source state");
                }
                self.tracker.last_state().cloned()
            }
        };

        Ok(SyncOutput {
            summary: SyncSummary {
                status: SyncStatus::Completed,
                records_synced: self.tracker.record_count(),
                bytes_synced: self.tracker.bytes_count(),
                start_time,
                end_time: Utc::now().timestamp_millis(),
            },
            state,
        })
    }
}
