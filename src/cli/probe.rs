//! Handler for the `probe` command.

use crate::cli::{build_orchestrator, emit, ProbeArgs};
use crate::config::Config;
use crate::error::Result;

/// Probe one device and print its records as JSON lines.
pub async fn execute(args: &ProbeArgs) -> Result<()> {
    let config = Config::load(&args.config)?;
    config.init_logging();

    let orchestrator = build_orchestrator(&config)?;
    let result = orchestrator.probe(&args.device).await;
    orchestrator.shutdown().await;

    for record in result? {
        emit(&record)?;
    }
    Ok(())
}
