//! Command-line interface definitions.

pub mod check;
pub mod probe;
pub mod run;

use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};

use crate::adapter::TcpConnector;
use crate::collector::CollectorRegistry;
use crate::config::Config;
use crate::error::Result;
use crate::orchestrator::ScrapeOrchestrator;

/// fleetscrape - scrape metrics from a fleet of network devices.
#[derive(Parser, Debug)]
#[command(name = "fleetscrape")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Scrape all enabled devices on an interval, printing one JSON line per batch
    Run(RunArgs),

    /// Scrape a single device once through the connection pool
    Probe(ProbeArgs),

    /// Run diagnostic checks
    #[command(subcommand)]
    Check(CheckCommand),
}

/// Subcommands for `fleetscrape check`
#[derive(Subcommand, Debug)]
pub enum CheckCommand {
    /// Validate configuration file
    Config(ConfigPathArg),
    /// Try to connect to every enabled device and report its status
    Connection(ConfigPathArg),
}

/// Shared argument for commands that only need a config path.
#[derive(Parser, Debug)]
pub struct ConfigPathArg {
    /// Path to configuration file
    #[arg(short, long, default_value = "fleetscrape.toml")]
    pub config: PathBuf,
}

/// Arguments for the `run` subcommand.
#[derive(Parser, Debug)]
pub struct RunArgs {
    /// Path to configuration file
    #[arg(short, long, default_value = "fleetscrape.toml")]
    pub config: PathBuf,

    /// Run a single batch and exit
    #[arg(long)]
    pub once: bool,

    /// Override the interval between batches (seconds)
    #[arg(long, value_parser = clap::value_parser!(u64).range(1..))]
    pub interval: Option<u64>,

    /// Override log level (debug, info, warn, error)
    #[arg(long)]
    pub log_level: Option<String>,

    /// Use JSON log format instead of pretty
    #[arg(long)]
    pub json_logs: bool,
}

/// Arguments for the `probe` subcommand.
#[derive(Parser, Debug)]
pub struct ProbeArgs {
    /// Name of the configured device to probe
    pub device: String,

    /// Path to configuration file
    #[arg(short, long, default_value = "fleetscrape.toml")]
    pub config: PathBuf,
}

/// Wire the TCP connector and the built-in collectors to a loaded config.
pub(crate) fn build_orchestrator(config: &Config) -> Result<ScrapeOrchestrator> {
    let connector = Arc::new(TcpConnector::from(&config.connection));
    let orchestrator = ScrapeOrchestrator::builder(connector)
        .config(config)
        .registry(CollectorRegistry::builtin())
        .build()?;
    Ok(orchestrator)
}

/// Print one value as a JSON line on stdout.
pub(crate) fn emit<T: serde::Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string(value)?);
    Ok(())
}
