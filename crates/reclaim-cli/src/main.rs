//! reclaim - disk-space reclamation CLI

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use reclaim_cli::Cli;

fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();
    reclaim_cli::crash::install_hook();

    let cli = Cli::parse();
    let summary = reclaim_cli::run(&cli)?;

    // Removal failures are warnings, not a failed run.
    if !summary.is_clean() {
        tracing::info!("Cleanup finished with warnings, see {}", summary.log_path.display());
    }
    Ok(())
}
