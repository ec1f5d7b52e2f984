mod commands;
mod logging;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use commands::Settings;

#[derive(Parser)]
#[command(
    name = "relaybyte",
    version,
    about = "Run one attempt of a connector job"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Log level (error, warn, info, debug, trace)
    #[arg(long, default_value = "info", global = true)]
    log_level: String,

    /// Path to worker config YAML (defaults apply when omitted)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Override the workspace root attempts run under
    #[arg(long, global = true)]
    workspace_root: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch a connector's specification
    Spec {
        /// Path to job YAML file
        job: PathBuf,
    },
    /// Check a connector's connection configuration
    Check {
        /// Path to job YAML file
        job: PathBuf,
    },
    /// Discover the catalog a source exposes
    Discover {
        /// Path to job YAML file
        job: PathBuf,
    },
    /// Run a sync from source to destination
    Sync {
        /// Path to job YAML file
        job: PathBuf,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    logging::init(&cli.log_level);

    let settings = Settings {
        config: cli.config,
        workspace_root: cli.workspace_root,
    };

    match cli.command {
        Commands::Spec { job } => commands::spec::execute(&settings, &job).await,
        Commands::Check { job } => commands::check::execute(&settings, &job).await,
        Commands::Discover { job } => commands::discover::execute(&settings, &job).await,
        Commands::Sync { job } => commands::sync::execute(&settings, &job).await,
    }
}
