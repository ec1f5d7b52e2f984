use std::path::Path;

use anyhow::Result;
use relaybyte_types::config::JobConfig;
use relaybyte_types::job::JobType;

use super::{job_failed, prepare, print_json, Settings};

/// Execute the `discover` command: discover available streams from a source connector.
pub async fn execute(settings: &Settings, job_path: &Path) -> Result<()> {
    let prepared = prepare(settings, job_path, JobType::DiscoverSchema)?;
    let JobConfig::DiscoverSchema(config) = &prepared.job.job else {
        unreachable!("prepare checked the job kind");
    };

    let catalog = prepared
        .dispatcher
        .submit_discover_schema(prepared.job.job_id, prepared.job.attempt, config)
        .await
        .map_err(job_failed)?;

    println!("Discovered {} stream(s):\n", catalog.streams.len());
    for stream in &catalog.streams {
        println!("Stream: {}", stream.name);

        let modes: Vec<String> = stream
            .supported_sync_modes
            .iter()
            .map(|mode| format!("{mode:?}"))
            .collect();
        if !modes.is_empty() {
            println!("  Sync modes:  {}", modes.join(", "));
        }
        if let Some(cursor) = &stream.source_defined_cursor {
            println!("  Cursor:      {}", cursor.join("."));
        }
        println!();
    }

    print_json("CATALOG_JSON", &catalog)
}
