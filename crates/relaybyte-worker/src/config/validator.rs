//! Semantic validation for parsed job files and worker config.

use std::collections::HashSet;

use anyhow::{bail, Result};
use relaybyte_types::catalog::{ConfiguredCatalog, SyncMode};
use relaybyte_types::config::JobConfig;
use relaybyte_types::job::RESET_JOB_SOURCE_DOCKER_IMAGE_STUB;

use crate::config::types::{JobFile, WorkerConfig};

/// Image references must be non-empty and free of whitespace.
fn validate_image(image: &str, context: &str, errors: &mut Vec<String>) {
    if image.trim().is_empty() {
        errors.push(format!("{context}: docker image must not be empty"));
    } else if image.chars().any(char::is_whitespace) {
        errors.push(format!(
            "{context}: docker image '{image}' must not contain whitespace"
        ));
    }
}

fn validate_connection_configuration(
    config: &serde_json::Value,
    context: &str,
    errors: &mut Vec<String>,
) {
    if !(config.is_object() || config.is_null()) {
        errors.push(format!(
            "{context}: connection configuration must be a mapping"
        ));
    }
}

fn validate_catalog(catalog: &ConfiguredCatalog, errors: &mut Vec<String>) {
    let mut seen = HashSet::new();
    for (i, configured) in catalog.streams.iter().enumerate() {
        let name = configured.stream.name.as_str();
        if name.trim().is_empty() {
            errors.push(format!("Stream {i} has an empty name"));
            continue;
        }
        if !seen.insert(name) {
            errors.push(format!("Stream '{name}' is configured more than once"));
        }
        if configured.sync_mode == SyncMode::Incremental
            && configured.cursor_field.is_empty()
            && configured.stream.source_defined_cursor.is_none()
        {
            errors.push(format!(
                "Stream '{name}' uses incremental sync but has no cursor_field"
            ));
        }
    }
}

/// Validate a parsed job file.
/// Returns `Ok(())` if valid, Err with all validation errors if not.
///
/// # Errors
///
/// Returns an error listing all validation failures found in the job file.
pub fn validate_job(job: &JobFile) -> Result<()> {
    let mut errors = Vec::new();

    if job.job_id < 0 {
        errors.push(format!("job_id must not be negative, got {}", job.job_id));
    }
    if job.attempt < 0 {
        errors.push(format!("attempt must not be negative, got {}", job.attempt));
    }

    match &job.job {
        JobConfig::GetSpec(config) => validate_image(&config.docker_image, "get_spec", &mut errors),
        JobConfig::CheckConnection(config) => {
            validate_image(&config.docker_image, "check_connection", &mut errors);
            validate_connection_configuration(
                &config.connection_configuration,
                "check_connection",
                &mut errors,
            );
        }
        JobConfig::DiscoverSchema(config) => {
            validate_image(&config.docker_image, "discover_schema", &mut errors);
            validate_connection_configuration(
                &config.connection_configuration,
                "discover_schema",
                &mut errors,
            );
        }
        JobConfig::Sync(config) => {
            validate_image(&config.source_docker_image, "sync source", &mut errors);
            validate_image(
                &config.destination_docker_image,
                "sync destination",
                &mut errors,
            );
            if config.destination_docker_image == RESET_JOB_SOURCE_DOCKER_IMAGE_STUB {
                errors.push(format!(
                    "sync destination: '{RESET_JOB_SOURCE_DOCKER_IMAGE_STUB}' is only valid as a source image"
                ));
            }
            validate_connection_configuration(
                &config.source_configuration,
                "sync source",
                &mut errors,
            );
            validate_connection_configuration(
                &config.destination_configuration,
                "sync destination",
                &mut errors,
            );
            validate_catalog(&config.configured_catalog, &mut errors);
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        bail!("Job validation failed:\n  - {}", errors.join("\n  - "));
    }
}

/// Validate worker settings.
///
/// # Errors
///
/// Returns an error listing all validation failures found in the config.
pub fn validate_worker_config(config: &WorkerConfig) -> Result<()> {
    let mut errors = Vec::new();

    if !config.workspace_root.is_absolute() {
        errors.push(format!(
            "workspace_root must be an absolute path, got '{}'",
            config.workspace_root.display()
        ));
    }
    if config.docker_network.trim().is_empty() {
        errors.push("docker_network must not be empty".to_string());
    }
    if config.local_mount.trim().is_empty() {
        errors.push("local_mount must not be empty".to_string());
    }
    validate_image(&config.normalization_image, "normalization", &mut errors);

    if errors.is_empty() {
        Ok(())
    } else {
        bail!("Worker config validation failed:\n  - {}", errors.join("\n  - "));
    }
}
