//! Fetches a connector's specification document.

use std::path::Path;
use std::sync::Arc;

use relaybyte_types::output::ConnectorSpecification;
use relaybyte_types::protocol::ConnectorMessage;

use super::read_first;
use crate::error::Result;
use crate::launcher::IntegrationLauncher;

pub struct DefaultGetSpecWorker {
    launcher: Arc<dyn IntegrationLauncher>,
}

impl DefaultGetSpecWorker {
    #[must_use]
    pub fn new(launcher: Arc<dyn IntegrationLauncher>) -> Self {
        Self { launcher }
    }

    /// Run `spec` and return the first specification the connector emits.
    ///
    /// # Errors
    ///
    /// Fails if the connector cannot be launched, exits non-zero, or emits
    /// no `spec` message.
    pub async fn run(&self, job_root: &Path) -> Result<ConnectorSpecification> {
        let process = self.launcher.spec(job_root)?;
        let spec = read_first(process, "spec", |message| match message {
            ConnectorMessage::Spec(spec) => Some(spec),
            _ => None,
        })
        .await?;
        tracing::info!(image = self.launcher.image(), "Fetched connector specification");
        Ok(spec)
    }
}

#[cfg(test)]
mod tests {
    use relaybyte_types::job::IntegrationLauncherConfig;

    use super::*;
    use crate::error::WorkerError;
    use crate::launcher::{LaunchCommand, LauncherFactory, ScriptedLauncherFactory};

    const IMAGE: &str = "relaybyte/source-faker:0.1";

    fn spec(url: &str) -> ConnectorSpecification {
        ConnectorSpecification {
            documentation_url: Some(url.into()),
            connection_specification: serde_json::json!({"type": "object"}),
            supports_incremental: true,
            supports_normalization: false,
        }
    }

    fn worker(factory: &ScriptedLauncherFactory) -> DefaultGetSpecWorker {
        DefaultGetSpecWorker::new(factory.create(&IntegrationLauncherConfig::new(1, 0, IMAGE)))
    }

    #[tokio::test]
    async fn returns_first_spec_message() {
        let factory = ScriptedLauncherFactory::new();
        factory.respond_lines(IMAGE, LaunchCommand::Spec, ["booting"]);
        factory.respond(
            IMAGE,
            LaunchCommand::Spec,
            [
                ConnectorMessage::Spec(spec("https://first")),
                ConnectorMessage::Spec(spec("https://second")),
            ],
        );

        let result = worker(&factory).run(Path::new("/ws/1/0")).await.unwrap();
        assert_eq!(result, spec("https://first"));
        assert_eq!(factory.launches()[0].args, vec!["spec"]);
    }

    #[tokio::test]
    async fn missing_spec_is_reported() {
        let factory = ScriptedLauncherFactory::new();
        let err = worker(&factory).run(Path::new("/ws/1/0")).await.unwrap_err();
        assert!(matches!(err, WorkerError::MissingOutput { expected: "spec", .. }));
    }

    #[tokio::test]
    async fn non_zero_exit_wins_over_output() {
        let factory = ScriptedLauncherFactory::new();
        factory.respond(IMAGE, LaunchCommand::Spec, [ConnectorMessage::Spec(spec("u"))]);
        factory.exit_with(IMAGE, LaunchCommand::Spec, 137);
        let err = worker(&factory).run(Path::new("/ws/1/0")).await.unwrap_err();
        assert!(matches!(err, WorkerError::ConnectorExit { code: 137, .. }));
    }
}
