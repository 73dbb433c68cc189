//! Configuration modules.

pub mod device;
pub mod logging;
pub mod pool;
pub mod scrape;
mod settings;

pub use device::DeviceConfig;
pub use logging::{LogFormat, LoggingConfig};
pub use pool::{ConnectionConfig, PoolConfig};
pub use scrape::ScrapeConfig;
pub use settings::{password_env_var, Config};
