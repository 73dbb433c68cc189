use thiserror::Error;

/// Configuration-related errors with structured variants.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("missing required field: {field}")]
    MissingField { field: &'static str },

    #[error("invalid value for {field}: {reason}")]
    InvalidValue { field: &'static str, reason: String },

    #[error("duplicate device name: {name}")]
    DuplicateDevice { name: String },

    #[error("device '{device}' references unknown lease source '{source_name}'")]
    UnknownLeaseSource { device: String, source_name: String },

    #[error("failed to read config file: {0}")]
    ReadFile(#[source] std::io::Error),

    #[error("failed to parse config: {0}")]
    Parse(#[source] toml::de::Error),
}

/// Errors raised while opening or using a device connection.
///
/// `connect()` reports these to its caller; device readiness checks catch
/// them and turn them into "skip this device for the current batch".
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConnectionError {
    #[error("connection to {host}:{port} refused: {reason}")]
    Refused {
        host: String,
        port: u16,
        reason: String,
    },

    #[error("connection to {host}:{port} timed out after {timeout_secs}s")]
    Timeout {
        host: String,
        port: u16,
        timeout_secs: u64,
    },

    #[error("failed to load credentials from {path}: {reason}")]
    Credentials { path: String, reason: String },

    #[error("not connected")]
    NotConnected,

    #[error("device API error: {0}")]
    Protocol(String),
}

#[derive(Error, Debug)]
pub enum Error {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Connection(#[from] ConnectionError),

    #[error("unknown device: {device}")]
    UnknownDevice { device: String },

    #[error("device '{device}' is not reachable")]
    DeviceUnavailable { device: String },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
