//! Handlers for the `check` subcommands.

use std::path::Path;

use crate::cli::{build_orchestrator, emit};
use crate::config::Config;
use crate::error::Result;

/// Validate configuration file without contacting any device.
pub fn execute_config<P: AsRef<Path>>(config_path: P) -> Result<()> {
    let path = config_path.as_ref();
    println!("Checking configuration: {}", path.display());
    println!();

    let config = Config::load(path)?;
    let scrape = &config.scrape;

    println!("✓ Configuration file is valid");
    println!();
    println!("Summary:");
    println!(
        "  Devices: {} enabled of {}",
        config.enabled_devices().count(),
        config.devices.len()
    );
    println!(
        "  Mode: {}",
        if scrape.fetch_in_parallel {
            format!("parallel ({} workers)", scrape.max_worker_threads)
        } else {
            "sequential".to_string()
        }
    );
    println!(
        "  Deadlines: {}s per device, {}s per batch",
        scrape.max_scrape_duration_secs, scrape.total_max_scrape_duration_secs
    );
    println!("  Interval: {}s", scrape.interval_secs);

    for device in &config.devices {
        let credentials = if device.credentials_file.is_some() {
            "credentials file"
        } else if device.password.is_some() {
            "password"
        } else {
            "no password"
        };
        println!(
            "  - {} ({}:{}, {}{})",
            device.name,
            device.host,
            device.port,
            credentials,
            if device.enabled { "" } else { ", disabled" }
        );
    }

    println!();
    println!("Configuration is ready to use.");
    Ok(())
}

/// Connect to every enabled device once and print one status line each.
pub async fn execute_connection<P: AsRef<Path>>(config_path: P) -> Result<()> {
    let config = Config::load(config_path)?;
    config.init_logging();

    let orchestrator = build_orchestrator(&config)?;
    orchestrator.collect().await;
    for status in orchestrator.status().await {
        emit(&status)?;
    }
    orchestrator.shutdown().await;
    Ok(())
}
