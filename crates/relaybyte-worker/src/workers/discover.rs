//! Discovers the streams a source exposes.

use std::path::Path;
use std::sync::Arc;

use relaybyte_types::catalog::Catalog;
use relaybyte_types::input::DiscoverCatalogInput;
use relaybyte_types::protocol::ConnectorMessage;

use super::{read_first, write_json, SOURCE_CONFIG_JSON_FILENAME};
use crate::error::Result;
use crate::launcher::IntegrationLauncher;

pub struct DefaultDiscoverCatalogWorker {
    launcher: Arc<dyn IntegrationLauncher>,
}

impl DefaultDiscoverCatalogWorker {
    #[must_use]
    pub fn new(launcher: Arc<dyn IntegrationLauncher>) -> Self {
        Self { launcher }
    }

    /// # Errors
    ///
    /// Fails if the config cannot be written, the connector cannot be
    /// launched, exits non-zero, or emits no `catalog` message.
    pub async fn run(&self, input: &DiscoverCatalogInput, job_root: &Path) -> Result<Catalog> {
        write_json(
            job_root,
            SOURCE_CONFIG_JSON_FILENAME,
            &input.connection_configuration,
        )
        .await?;

        let process = self
            .launcher
            .discover(job_root, SOURCE_CONFIG_JSON_FILENAME)?;
        let catalog = read_first(process, "catalog", |message| match message {
            ConnectorMessage::Catalog(catalog) => Some(catalog),
            _ => None,
        })
        .await?;

        tracing::info!(
            image = self.launcher.image(),
            streams = catalog.streams.len(),
            "Discovered catalog"
        );
        Ok(catalog)
    }
}

#[cfg(test)]
mod tests {
    use relaybyte_types::catalog::Stream;
    use relaybyte_types::job::IntegrationLauncherConfig;

    use super::*;
    use crate::error::WorkerError;
    use crate::launcher::{LaunchCommand, LauncherFactory, ScriptedLauncherFactory};

    const IMAGE: &str = "relaybyte/source-postgres:0.3";

    fn catalog() -> Catalog {
        Catalog {
            streams: vec![Stream {
                name: "users".into(),
                json_schema: serde_json::json!({"type": "object"}),
                supported_sync_modes: Vec::new(),
                source_defined_cursor: None,
            }],
        }
    }

    #[tokio::test]
    async fn returns_discovered_catalog() {
        let job_root = tempfile::tempdir().unwrap();
        let factory = ScriptedLauncherFactory::new();
        factory.respond(IMAGE, LaunchCommand::Discover, [ConnectorMessage::Catalog(catalog())]);
        let worker = DefaultDiscoverCatalogWorker::new(
            factory.create(&IntegrationLauncherConfig::new(3, 0, IMAGE)),
        );

        let input = DiscoverCatalogInput {
            connection_configuration: serde_json::json!({"database": "app"}),
        };
        assert_eq!(worker.run(&input, job_root.path()).await.unwrap(), catalog());
        assert!(job_root.path().join(SOURCE_CONFIG_JSON_FILENAME).is_file());
    }

    #[tokio::test]
    async fn connector_failure_is_reported() {
        let job_root = tempfile::tempdir().unwrap();
        let factory = ScriptedLauncherFactory::new();
        factory.exit_with(IMAGE, LaunchCommand::Discover, 1);
        let worker = DefaultDiscoverCatalogWorker::new(
            factory.create(&IntegrationLauncherConfig::new(3, 0, IMAGE)),
        );

        let input = DiscoverCatalogInput {
            connection_configuration: serde_json::Value::Null,
        };
        let err = worker.run(&input, job_root.path()).await.unwrap_err();
        assert!(matches!(err, WorkerError::ConnectorExit { code: 1, .. }));
    }
}
