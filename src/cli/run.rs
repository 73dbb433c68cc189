//! Handler for the `run` command.

use tokio::signal;
use tokio::time::MissedTickBehavior;
use tracing::info;

use crate::cli::{build_orchestrator, emit, RunArgs};
use crate::config::{Config, LogFormat};
use crate::error::Result;

/// Execute the run command.
pub async fn execute(args: &RunArgs) -> Result<()> {
    let mut config = Config::load(&args.config)?;

    if let Some(ref level) = args.log_level {
        config.logging.level = level.clone();
    }
    if args.json_logs {
        config.logging.format = LogFormat::Json;
    }
    if let Some(interval) = args.interval {
        config.scrape.interval_secs = interval;
    }

    config.init_logging();

    let orchestrator = build_orchestrator(&config)?;
    info!(
        devices = orchestrator.device_names().len(),
        parallel = config.scrape.fetch_in_parallel,
        interval_secs = config.scrape.interval_secs,
        "fleetscrape starting"
    );

    if args.once {
        if let Some(batch) = orchestrator.collect_batch().await {
            emit(&batch)?;
        }
        orchestrator.shutdown().await;
        return Ok(());
    }

    let mut ticker = tokio::time::interval(config.scrape.interval());
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                if let Some(batch) = orchestrator.collect_batch().await {
                    emit(&batch)?;
                }
            }
            _ = signal::ctrl_c() => {
                info!("Shutdown signal received");
                break;
            }
        }
    }

    orchestrator.shutdown().await;
    info!("fleetscrape stopped");
    Ok(())
}
