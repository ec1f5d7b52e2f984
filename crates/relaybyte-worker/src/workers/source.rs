//! Sources feed a sync with messages.

use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use relaybyte_types::catalog::ConfiguredCatalog;
use relaybyte_types::input::State;
use relaybyte_types::protocol::ConnectorMessage;

use super::{
    write_json, INPUT_STATE_JSON_FILENAME, SOURCE_CATALOG_JSON_FILENAME,
    SOURCE_CONFIG_JSON_FILENAME,
};
use crate::error::{Result, WorkerError};
use crate::launcher::{ConnectorProcess, IntegrationLauncher};

/// Producer side of a sync.
#[async_trait]
pub trait Source: Send {
    /// # Errors
    ///
    /// Fails if the source cannot be prepared or launched.
    async fn start(
        &mut self,
        job_root: &Path,
        config: &serde_json::Value,
        catalog: &ConfiguredCatalog,
        state: Option<&State>,
    ) -> Result<()>;

    /// Next message, or `None` once the source is exhausted.
    ///
    /// # Errors
    ///
    /// Fails if the source's output cannot be read.
    async fn next_message(&mut self) -> Result<Option<ConnectorMessage>>;

    /// # Errors
    ///
    /// Fails if the source did not finish cleanly.
    async fn close(&mut self) -> Result<()>;
}

/// Source backed by a connector's `read` command.
pub struct DefaultSource {
    launcher: Arc<dyn IntegrationLauncher>,
    process: Option<ConnectorProcess>,
}

impl DefaultSource {
    #[must_use]
    pub fn new(launcher: Arc<dyn IntegrationLauncher>) -> Self {
        Self {
            launcher,
            process: None,
        }
    }
}

#[async_trait]
impl Source for DefaultSource {
    async fn start(
        &mut self,
        job_root: &Path,
        config: &serde_json::Value,
        catalog: &ConfiguredCatalog,
        state: Option<&State>,
    ) -> Result<()> {
        write_json(job_root, SOURCE_CONFIG_JSON_FILENAME, config).await?;
        write_json(job_root, SOURCE_CATALOG_JSON_FILENAME, catalog).await?;
        let state_filename = match state {
            Some(state) => {
                write_json(job_root, INPUT_STATE_JSON_FILENAME, state).await?;
                Some(INPUT_STATE_JSON_FILENAME)
            }
            None => None,
        };

        self.process = Some(self.launcher.read(
            job_root,
            SOURCE_CONFIG_JSON_FILENAME,
            SOURCE_CATALOG_JSON_FILENAME,
            state_filename,
        )?);
        Ok(())
    }

    async fn next_message(&mut self) -> Result<Option<ConnectorMessage>> {
        match self.process.as_mut() {
            Some(process) => process.next_message().await,
            None => Err(WorkerError::StreamClosed {
                image: self.launcher.image().to_string(),
                stream: "stdout",
            }),
        }
    }

    async fn close(&mut self) -> Result<()> {
        match self.process.take() {
            Some(mut process) => process.wait().await,
            None => Ok(()),
        }
    }
}

/// Source that emits nothing. Stands in for the real source on resets, so
/// the destination sees an empty stream for every configured catalog entry.
#[derive(Debug, Default)]
pub struct EmptySource;

#[async_trait]
impl Source for EmptySource {
    async fn start(
        &mut self,
        _job_root: &Path,
        _config: &serde_json::Value,
        catalog: &ConfiguredCatalog,
        _state: Option<&State>,
    ) -> Result<()> {
        tracing::info!(
            streams = catalog.streams.len(),
            "Resetting streams with an empty source"
        );
        Ok(())
    }

    async fn next_message(&mut self) -> Result<Option<ConnectorMessage>> {
        Ok(None)
    }

    async fn close(&mut self) -> Result<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use relaybyte_types::job::IntegrationLauncherConfig;

    use super::*;
    use crate::launcher::{LaunchCommand, LauncherFactory, ScriptedLauncherFactory};
    use crate::workers::test_support::{catalog, record};

    const IMAGE: &str = "relaybyte/source-faker:0.1";

    #[tokio::test]
    async fn writes_inputs_and_passes_state_file() {
        let job_root = tempfile::tempdir().unwrap();
        let factory = ScriptedLauncherFactory::new();
        factory.respond(
            IMAGE,
            LaunchCommand::Read,
            [record("users", serde_json::json!({"id": 1}))],
        );
        let mut source = DefaultSource::new(factory.create(&IntegrationLauncherConfig::new(1, 0, IMAGE)));

        let state = State::new(serde_json::json!({"cursor": "2024-01-01"}));
        source
            .start(
                job_root.path(),
                &serde_json::json!({"seed": 7}),
                &catalog(&["users"]),
                Some(&state),
            )
            .await
            .unwrap();

        assert!(source.next_message().await.unwrap().is_some());
        assert!(source.next_message().await.unwrap().is_none());
        source.close().await.unwrap();

        for file in [
            SOURCE_CONFIG_JSON_FILENAME,
            SOURCE_CATALOG_JSON_FILENAME,
            INPUT_STATE_JSON_FILENAME,
        ] {
            assert!(job_root.path().join(file).is_file(), "{file}");
        }
        let launches = factory.launches();
        assert_eq!(launches[0].args.last().map(String::as_str), Some(INPUT_STATE_JSON_FILENAME));
    }

    #[tokio::test]
    async fn read_before_start_is_an_error() {
        let factory = ScriptedLauncherFactory::new();
        let mut source = DefaultSource::new(factory.create(&IntegrationLauncherConfig::new(1, 0, IMAGE)));
        assert!(source.next_message().await.is_err());
        source.close().await.unwrap();
    }

    #[tokio::test]
    async fn empty_source_emits_nothing() {
        let mut source = EmptySource;
        source
            .start(Path::new("/unused"), &serde_json::Value::Null, &catalog(&["a"]), None)
            .await
            .unwrap();
        assert!(source.next_message().await.unwrap().is_none());
        source.close().await.unwrap();
    }
}
