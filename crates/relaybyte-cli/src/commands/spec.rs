use std::path::Path;

use anyhow::{Context, Result};
use relaybyte_types::config::JobConfig;
use relaybyte_types::job::JobType;

use super::{job_failed, prepare, print_json, Settings};

/// Execute the `spec` command: fetch the connector's specification.
pub async fn execute(settings: &Settings, job_path: &Path) -> Result<()> {
    let prepared = prepare(settings, job_path, JobType::GetSpec)?;
    let JobConfig::GetSpec(config) = &prepared.job.job else {
        unreachable!("prepare checked the job kind");
    };

    let spec = prepared
        .dispatcher
        .submit_get_spec(prepared.job.job_id, prepared.job.attempt, config)
        .await
        .map_err(job_failed)?;

    println!("Connector:           {}", config.docker_image);
    if let Some(url) = &spec.documentation_url {
        println!("Documentation:       {url}");
    }
    println!("Incremental:         {}", yes_no(spec.supports_incremental));
    println!("Normalization:       {}", yes_no(spec.supports_normalization));
    println!(
        "Connection spec:\n{}",
        serde_json::to_string_pretty(&spec.connection_specification)
            .context("Failed to render connection specification")?
    );

    print_json("SPEC_JSON", &spec)
}

fn yes_no(flag: bool) -> &'static str {
    if flag {
        "yes"
    } else {
        "no"
    }
}
