//! Integration tests for job files and the in-process engine.
//!
//! Jobs are parsed from the shared fixtures, dispatched through a
//! `LocalWorkflowEngine`, and run against scripted connectors inside a
//! temporary workspace.

use std::path::PathBuf;
use std::sync::Arc;

use relaybyte_types::catalog::{Catalog, Stream};
use relaybyte_types::config::JobConfig;
use relaybyte_types::output::{CheckConnectionOutput, CheckConnectionStatus};
use relaybyte_types::protocol::{ConnectorMessage, RecordMessage, StateMessage};
use relaybyte_worker::config::{parser, validator, WorkerConfig};
use relaybyte_worker::launcher::{LaunchCommand, ScriptedLauncherFactory};
use relaybyte_worker::workers::SOURCE_CONFIG_JSON_FILENAME;
use relaybyte_worker::{JobDispatcher, LocalWorkflowEngine, WorkerError, WorkflowOutput};

fn fixture(name: &str) -> PathBuf {
    std::path::Path::new(env!("CARGO_MANIFEST_DIR"))
        .parent()
        .unwrap()
        .parent()
        .unwrap()
        .join("tests/fixtures/jobs")
        .join(name)
}

fn dispatcher(launchers: &ScriptedLauncherFactory, workspace: &std::path::Path) -> JobDispatcher {
    let (_, normalization) = WorkerConfig::default().docker_factories();
    let engine = LocalWorkflowEngine::with_default_activities(
        Arc::new(launchers.clone()),
        Arc::new(normalization),
        workspace,
    );
    JobDispatcher::new(Arc::new(engine))
}

fn record(stream: &str, id: i64) -> ConnectorMessage {
    ConnectorMessage::Record(RecordMessage {
        stream: stream.into(),
        data: serde_json::json!({ "id": id }),
        emitted_at: 0,
    })
}

#[test]
fn test_parse_and_validate_fixture_jobs() {
    std::env::set_var("TEST_SOURCE_PG_HOST", "localhost");
    std::env::set_var("TEST_SOURCE_PG_PASSWORD", "secret");

    let check = parser::parse_job(&fixture("check_postgres.yaml")).expect("check fixture parses");
    assert_eq!((check.job_id, check.attempt), (11, 21));
    let JobConfig::CheckConnection(config) = &check.job else {
        panic!("expected check_connection, got {:?}", check.job);
    };
    assert_eq!(config.connection_configuration["host"], "localhost");
    assert_eq!(config.connection_configuration["password"], "secret");
    validator::validate_job(&check).expect("check fixture is valid");

    let sync = parser::parse_job(&fixture("sync_pg_to_pg.yaml")).expect("sync fixture parses");
    let JobConfig::Sync(config) = &sync.job else {
        panic!("expected sync, got {:?}", sync.job);
    };
    assert_eq!(
        config.configured_catalog.stream_names().collect::<Vec<_>>(),
        vec!["users", "orders"]
    );
    assert!(config.state.is_some());
    validator::validate_job(&sync).expect("sync fixture is valid");

    let reset = parser::parse_job(&fixture("reset_users.yaml")).expect("reset fixture parses");
    validator::validate_job(&reset).expect("reset fixture is valid");

    std::env::remove_var("TEST_SOURCE_PG_HOST");
    std::env::remove_var("TEST_SOURCE_PG_PASSWORD");
}

#[test]
fn test_invalid_fixture_reports_every_problem() {
    let job = parser::parse_job(&fixture("invalid_sync.yaml")).expect("invalid fixture still parses");
    let err = validator::validate_job(&job).unwrap_err().to_string();
    assert!(err.contains("job_id must not be negative"));
    assert!(err.contains("sync source: docker image must not be empty"));
    assert!(err.contains("only valid as a source image"));
    assert!(err.contains("no cursor_field"));
    assert!(err.contains("configured more than once"));
}

#[test]
fn test_worker_config_fixture() {
    std::env::set_var("TEST_RELAYBYTE_NETWORK", "relaybyte_net");
    let config = parser::parse_worker_config(&fixture("worker.yaml")).expect("worker fixture parses");
    assert_eq!(config.docker_settings().workspace_mount, "relaybyte_workspace");
    assert_eq!(config.docker_network, "relaybyte_net");
    validator::validate_worker_config(&config).expect("worker fixture is valid");
    std::env::remove_var("TEST_RELAYBYTE_NETWORK");
}

#[tokio::test]
async fn test_check_connection_end_to_end() {
    let workspace = tempfile::tempdir().unwrap();
    let launchers = ScriptedLauncherFactory::new();
    let image = "relaybyte/source-postgres:0.3.1";
    let succeeded = CheckConnectionOutput {
        status: CheckConnectionStatus::Succeeded,
        message: None,
    };
    launchers.respond(
        image,
        LaunchCommand::Check,
        [ConnectorMessage::ConnectionStatus(succeeded.clone())],
    );

    let config = JobConfig::CheckConnection(relaybyte_types::config::JobCheckConnectionConfig {
        docker_image: image.into(),
        connection_configuration: serde_json::json!({"host": "localhost"}),
    });
    let output = dispatcher(&launchers, workspace.path())
        .submit(11, 21, &config)
        .await
        .unwrap();

    assert_eq!(output, WorkflowOutput::CheckConnection(succeeded));
    let job_root = workspace.path().join("11").join("21");
    assert!(job_root.join(SOURCE_CONFIG_JSON_FILENAME).is_file());
    assert_eq!(launchers.launches()[0].job_root, job_root);
}

#[tokio::test]
async fn test_failed_attempt_points_at_attempt_log() {
    let workspace = tempfile::tempdir().unwrap();
    let launchers = ScriptedLauncherFactory::new();

    let config = relaybyte_types::config::JobGetSpecConfig {
        docker_image: "relaybyte/source-silent:0.1".into(),
    };
    let err = dispatcher(&launchers, workspace.path())
        .submit_get_spec(11, 21, &config)
        .await
        .unwrap_err();

    let failure = err.as_attempt_failure().expect("attempt failure");
    assert_eq!(
        failure.log_path(),
        workspace.path().join("11").join("21").join("logs.log")
    );
    let cause = failure
        .cause()
        .and_then(|cause| cause.downcast_ref::<WorkerError>())
        .expect("worker error cause");
    assert!(matches!(cause, WorkerError::MissingOutput { expected: "spec", .. }));
}

#[tokio::test]
async fn test_discover_end_to_end() {
    let workspace = tempfile::tempdir().unwrap();
    let launchers = ScriptedLauncherFactory::new();
    let image = "relaybyte/source-postgres:0.3.1";
    let catalog = Catalog {
        streams: vec![Stream {
            name: "users".into(),
            json_schema: serde_json::json!({"type": "object"}),
            supported_sync_modes: Vec::new(),
            source_defined_cursor: None,
        }],
    };
    launchers.respond(image, LaunchCommand::Discover, [ConnectorMessage::Catalog(catalog.clone())]);

    let config = relaybyte_types::config::JobDiscoverCatalogConfig {
        docker_image: image.into(),
        connection_configuration: serde_json::json!({}),
    };
    let discovered = dispatcher(&launchers, workspace.path())
        .submit_discover_schema(3, 0, &config)
        .await
        .unwrap();
    assert_eq!(discovered, catalog);
}

#[tokio::test]
async fn test_sync_fixture_end_to_end() {
    let workspace = tempfile::tempdir().unwrap();
    let launchers = ScriptedLauncherFactory::new();
    launchers.respond(
        "relaybyte/source-postgres:0.3.1",
        LaunchCommand::Read,
        [
            record("users", 1),
            record("orders", 10),
            ConnectorMessage::State(StateMessage {
                data: serde_json::json!({"users": {"updated_at": "2024-02-01T00:00:00Z"}}),
            }),
        ],
    );

    let job = parser::parse_job(&fixture("sync_pg_to_pg.yaml")).unwrap();
    let JobConfig::Sync(config) = &job.job else {
        panic!("expected sync fixture");
    };
    let output = dispatcher(&launchers, workspace.path())
        .submit_sync(job.job_id, job.attempt, config)
        .await
        .unwrap();

    assert_eq!(output.summary.records_synced, 2);
    assert_eq!(
        output.state.map(|state| state.0),
        Some(serde_json::json!({"users": {"updated_at": "2024-02-01T00:00:00Z"}}))
    );
    let received = launchers.received("relaybyte/destination-postgres:0.2.0");
    assert_eq!(received.len(), 3);
    assert_eq!(received[0], record("raw_users", 1));
    assert_eq!(received[1], record("raw_orders", 10));

    let job_root = workspace.path().join("12").join("0");
    for file in [
        "source_config.json",
        "source_catalog.json",
        "input_state.json",
        "destination_config.json",
        "destination_catalog.json",
    ] {
        assert!(job_root.join(file).is_file(), "{file} should be written");
    }
}

#[tokio::test]
async fn test_reset_fixture_never_reads_source() {
    let workspace = tempfile::tempdir().unwrap();
    let launchers = ScriptedLauncherFactory::new();

    let job = parser::parse_job(&fixture("reset_users.yaml")).unwrap();
    let output = dispatcher(&launchers, workspace.path())
        .submit(job.job_id, job.attempt, &job.job)
        .await
        .unwrap();

    let WorkflowOutput::Sync(output) = output else {
        panic!("expected sync output, got {output:?}");
    };
    assert_eq!(output.summary.records_synced, 0);
    let commands: Vec<_> = launchers.launches().iter().map(|l| l.command).collect();
    assert_eq!(commands, vec![LaunchCommand::Write]);
    assert!(!workspace.path().join("13").join("1").join("source_config.json").exists());
}
