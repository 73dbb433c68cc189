//! Per-device configuration.

use std::collections::BTreeSet;
use std::fmt;
use std::path::PathBuf;

use serde::Deserialize;

use crate::domain::{ConnectionKey, TlsSettings};

/// One configured device.
///
/// Connection parameters compose the device's [`ConnectionKey`]; `features`
/// is opaque to the scrape core and only consulted by collectors.
#[derive(Clone, Deserialize)]
pub struct DeviceConfig {
    pub name: String,
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    /// Disabled devices stay in the file but are never polled.
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default)]
    pub username: Option<String>,
    /// Inline password. Falls back to `FLEETSCRAPE_<NAME>_PASSWORD`.
    #[serde(default)]
    pub password: Option<String>,
    /// TOML file with `username`/`password`, read at connect time.
    #[serde(default)]
    pub credentials_file: Option<PathBuf>,
    #[serde(default)]
    pub use_ssl: bool,
    #[serde(default)]
    pub no_ssl_certificate: bool,
    #[serde(default)]
    pub ssl_certificate_verify: bool,
    #[serde(default = "default_true")]
    pub ssl_check_hostname: bool,
    #[serde(default)]
    pub ssl_ca_file: Option<PathBuf>,
    #[serde(default = "default_true")]
    pub plaintext_login: bool,
    /// Logical module name; defaults to the device name.
    #[serde(default)]
    pub module: Option<String>,
    /// Name of another device whose DHCP lease table this device uses.
    #[serde(default)]
    pub remote_lease_source: Option<String>,
    #[serde(default)]
    pub features: BTreeSet<String>,
}

const fn default_port() -> u16 {
    8728
}

const fn default_true() -> bool {
    true
}

impl DeviceConfig {
    /// A device at `host` on the default API port with default settings.
    pub fn new(name: impl Into<String>, host: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            host: host.into(),
            port: default_port(),
            enabled: true,
            username: None,
            password: None,
            credentials_file: None,
            use_ssl: false,
            no_ssl_certificate: false,
            ssl_certificate_verify: false,
            ssl_check_hostname: true,
            ssl_ca_file: None,
            plaintext_login: true,
            module: None,
            remote_lease_source: None,
            features: BTreeSet::new(),
        }
    }

    pub fn module_name(&self) -> &str {
        self.module.as_deref().unwrap_or(&self.name)
    }

    pub fn has_feature(&self, feature: &str) -> bool {
        self.features.contains(feature)
    }

    /// Identity of the connection this device opens.
    #[must_use]
    pub fn connection_key(&self) -> ConnectionKey {
        let mut key = ConnectionKey::new(self.host.clone(), self.port)
            .with_tls(TlsSettings {
                use_ssl: self.use_ssl,
                no_ssl_certificate: self.no_ssl_certificate,
                ssl_certificate_verify: self.ssl_certificate_verify,
                ssl_check_hostname: self.ssl_check_hostname,
                ssl_ca_file: self.ssl_ca_file.clone(),
            })
            .with_plaintext_login(self.plaintext_login)
            .with_module(self.module_name());
        if let Some(username) = &self.username {
            key = key.with_username(username.clone());
        }
        if let Some(password) = &self.password {
            key = key.with_password(password.clone());
        }
        if let Some(path) = &self.credentials_file {
            key = key.with_credentials_file(path.clone());
        }
        key
    }
}

impl fmt::Debug for DeviceConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DeviceConfig")
            .field("name", &self.name)
            .field("host", &self.host)
            .field("port", &self.port)
            .field("enabled", &self.enabled)
            .field("username", &self.username)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .field("credentials_file", &self.credentials_file)
            .field("use_ssl", &self.use_ssl)
            .field("module", &self.module)
            .field("remote_lease_source", &self.remote_lease_source)
            .field("features", &self.features)
            .finish_non_exhaustive()
    }
}
