use std::path::Path;

use anyhow::Result;
use relaybyte_types::config::JobConfig;
use relaybyte_types::job::{JobType, RESET_JOB_SOURCE_DOCKER_IMAGE_STUB};
use relaybyte_types::output::SyncStatus;

use super::{job_failed, prepare, print_json, Settings};

/// Execute the `sync` command: move records from source to destination.
pub async fn execute(settings: &Settings, job_path: &Path) -> Result<()> {
    let prepared = prepare(settings, job_path, JobType::Sync)?;
    let JobConfig::Sync(config) = &prepared.job.job else {
        unreachable!("prepare checked the job kind");
    };

    let reset = config.source_docker_image == RESET_JOB_SOURCE_DOCKER_IMAGE_STUB;
    tracing::info!(
        source = config.source_docker_image,
        destination = config.destination_docker_image,
        streams = config.configured_catalog.streams.len(),
        reset,
        "Starting sync"
    );

    let output = prepared
        .dispatcher
        .submit_sync(prepared.job.job_id, prepared.job.attempt, config)
        .await
        .map_err(job_failed)?;

    let summary = &output.summary;
    let verb = if reset { "Reset" } else { "Sync" };
    println!("{verb} of job {} completed.", prepared.job.job_id);
    println!("  Records synced:  {}", summary.records_synced);
    println!("  Bytes synced:    {}", format_bytes(summary.bytes_synced));
    #[allow(clippy::cast_precision_loss)]
    let duration_secs = (summary.end_time - summary.start_time).max(0) as f64 / 1000.0;
    println!("  Duration:        {duration_secs:.2}s");
    println!(
        "  State:           {}",
        if output.state.is_some() { "updated" } else { "unchanged" }
    );
    print_json("SYNC_JSON", &output)?;

    if summary.status == SyncStatus::Failed {
        anyhow::bail!("Sync reported failure for job {}", prepared.job.job_id);
    }
    Ok(())
}

#[allow(clippy::cast_precision_loss)]
fn format_bytes(bytes: u64) -> String {
    if bytes >= 1_073_741_824 {
        format!("{:.2} GB", bytes as f64 / 1_073_741_824.0)
    } else if bytes >= 1_048_576 {
        format!("{:.2} MB", bytes as f64 / 1_048_576.0)
    } else if bytes >= 1024 {
        format!("{:.2} KB", bytes as f64 / 1024.0)
    } else {
        format!("{bytes} B")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn format_bytes_picks_unit() {
        assert_eq!(format_bytes(512), "512 B");
        assert_eq!(format_bytes(2048), "2.00 KB");
        assert_eq!(format_bytes(3 * 1_048_576), "3.00 MB");
        assert_eq!(format_bytes(1_073_741_824), "1.00 GB");
    }
}
