//! Connection identity.
//!
//! A [`ConnectionKey`] captures every parameter that decides which device
//! session a connection opens. Two keys are interchangeable exactly when all
//! of their fields are equal, which is what the connection pool relies on.

use std::fmt;
use std::path::{Path, PathBuf};

/// TLS mode and certificate verification settings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct TlsSettings {
    /// Open the API session over TLS.
    pub use_ssl: bool,
    /// Connect without presenting a client certificate.
    pub no_ssl_certificate: bool,
    /// Verify the device certificate chain.
    pub ssl_certificate_verify: bool,
    /// Verify the certificate hostname against the configured host.
    pub ssl_check_hostname: bool,
    /// Custom CA bundle used for verification.
    pub ssl_ca_file: Option<PathBuf>,
}

/// Immutable identity of a device connection.
///
/// Built once with the `with_*` methods and never mutated afterwards. The
/// password is part of the identity but is redacted from `Debug` output
/// and the key is never serialized.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct ConnectionKey {
    host: String,
    port: u16,
    username: Option<String>,
    password: Option<String>,
    credentials_file: Option<PathBuf>,
    tls: TlsSettings,
    plaintext_login: bool,
    module: String,
}

impl ConnectionKey {
    /// Create a key for `host:port` with no credentials and plain TCP.
    ///
    /// The module name defaults to the host.
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        let host = host.into();
        Self {
            module: host.clone(),
            host,
            port,
            username: None,
            password: None,
            credentials_file: None,
            tls: TlsSettings::default(),
            plaintext_login: true,
        }
    }

    #[must_use]
    pub fn with_username(mut self, username: impl Into<String>) -> Self {
        self.username = Some(username.into());
        self
    }

    #[must_use]
    pub fn with_password(mut self, password: impl Into<String>) -> Self {
        self.password = Some(password.into());
        self
    }

    #[must_use]
    pub fn with_credentials_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.credentials_file = Some(path.into());
        self
    }

    #[must_use]
    pub fn with_tls(mut self, tls: TlsSettings) -> Self {
        self.tls = tls;
        self
    }

    #[must_use]
    pub fn with_plaintext_login(mut self, plaintext_login: bool) -> Self {
        self.plaintext_login = plaintext_login;
        self
    }

    #[must_use]
    pub fn with_module(mut self, module: impl Into<String>) -> Self {
        self.module = module.into();
        self
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub fn username(&self) -> Option<&str> {
        self.username.as_deref()
    }

    pub fn password(&self) -> Option<&str> {
        self.password.as_deref()
    }

    pub fn credentials_file(&self) -> Option<&Path> {
        self.credentials_file.as_deref()
    }

    pub fn tls(&self) -> &TlsSettings {
        &self.tls
    }

    pub fn plaintext_login(&self) -> bool {
        self.plaintext_login
    }

    pub fn module(&self) -> &str {
        &self.module
    }

    /// Credentials carried inline on the key.
    #[must_use]
    pub fn inline_credentials(&self) -> Credentials {
        Credentials {
            username: self.username.clone(),
            password: self.password.clone(),
        }
    }
}

impl fmt::Debug for ConnectionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionKey")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("username", &self.username)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .field("credentials_file", &self.credentials_file)
            .field("tls", &self.tls)
            .field("plaintext_login", &self.plaintext_login)
            .field("module", &self.module)
            .finish()
    }
}

impl fmt::Display for ConnectionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}:{}", self.module, self.host, self.port)
    }
}

/// Username and password handed to a connector when opening a session.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct Credentials {
    pub username: Option<String>,
    pub password: Option<String>,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}
