use std::path::Path;

use anyhow::Result;
use relaybyte_types::config::JobConfig;
use relaybyte_types::job::JobType;
use relaybyte_types::output::CheckConnectionStatus;

use super::{job_failed, prepare, print_json, Settings};

/// Execute the `check` command: validate a connector's connection configuration.
pub async fn execute(settings: &Settings, job_path: &Path) -> Result<()> {
    let prepared = prepare(settings, job_path, JobType::CheckConnection)?;
    let JobConfig::CheckConnection(config) = &prepared.job.job else {
        unreachable!("prepare checked the job kind");
    };

    let output = prepared
        .dispatcher
        .submit_check_connection(prepared.job.job_id, prepared.job.attempt, config)
        .await
        .map_err(job_failed)?;

    let status = match output.status {
        CheckConnectionStatus::Succeeded => "OK",
        CheckConnectionStatus::Failed => "FAILED",
    };
    println!("{:18} {}", "Connection:", status);
    if let Some(message) = &output.message {
        println!("  {message}");
    }
    print_json("CHECK_JSON", &output)?;

    // A failed check is a result, not an attempt failure; still exit non-zero.
    if output.status == CheckConnectionStatus::Failed {
        anyhow::bail!("Connection check failed for {}", config.docker_image);
    }
    Ok(())
}
