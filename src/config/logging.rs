//! Logging configuration and subscriber setup.
//!
//! Logs always go to stderr: stdout is reserved for the JSON lines the CLI
//! prints, so a scrape can be piped straight into another tool.

use serde::Deserialize;
use tracing_subscriber::{fmt, EnvFilter};

/// Output format for log lines.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Human-readable lines.
    #[default]
    Pretty,
    /// One JSON object per event.
    Json,
}

/// `[logging]` section.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Default filter directive, e.g. `info` or `fleetscrape=debug,warn`.
    pub level: String,
    pub format: LogFormat,
}

impl LoggingConfig {
    /// Filter for this configuration. `RUST_LOG` wins when set and valid.
    #[must_use]
    pub fn filter(&self) -> EnvFilter {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&self.level))
    }

    /// Install the global subscriber.
    ///
    /// A second call in the same process leaves the first subscriber in
    /// place.
    pub fn init(&self) {
        let builder = fmt()
            .with_env_filter(self.filter())
            .with_writer(std::io::stderr);
        let installed = match self.format {
            LogFormat::Json => builder.json().try_init(),
            LogFormat::Pretty => builder.try_init(),
        };
        if installed.is_err() {
            tracing::debug!("Tracing subscriber already installed");
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".into(),
            format: LogFormat::Pretty,
        }
    }
}
