//! Credential resolution at connect time.

use serde::Deserialize;

use crate::domain::{ConnectionKey, Credentials};
use crate::error::ConnectionError;

#[derive(Debug, Deserialize)]
struct CredentialsFile {
    #[serde(default)]
    username: Option<String>,
    #[serde(default)]
    password: Option<String>,
}

/// Resolve the credentials to present for `key`.
///
/// When the key names a credentials file, values from that file win over
/// the inline ones; fields missing from the file fall back to inline values.
/// The file is re-read on every connect so rotated secrets apply without a
/// restart.
///
/// # Errors
///
/// Returns [`ConnectionError::Credentials`] when the file cannot be read or
/// parsed.
pub(crate) async fn resolve(key: &ConnectionKey) -> Result<Credentials, ConnectionError> {
    let inline = key.inline_credentials();
    let Some(path) = key.credentials_file() else {
        return Ok(inline);
    };

    let failed = |reason: String| ConnectionError::Credentials {
        path: path.display().to_string(),
        reason,
    };

    let content = tokio::fs::read_to_string(path)
        .await
        .map_err(|e| failed(e.to_string()))?;
    let file: CredentialsFile = toml::from_str(&content).map_err(|e| failed(e.to_string()))?;

    Ok(Credentials {
        username: file.username.or(inline.username),
        password: file.password.or(inline.password),
    })
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    #[tokio::test]
    async fn test_inline_credentials_without_file() {
        let key = ConnectionKey::new("10.0.0.1", 8728)
            .with_username("monitor")
            .with_password("inline");

        let creds = resolve(&key).await.unwrap();
        assert_eq!(creds.username.as_deref(), Some("monitor"));
        assert_eq!(creds.password.as_deref(), Some("inline"));
    }

    #[tokio::test]
    async fn test_file_values_override_inline() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "password = \"from-file\"").unwrap();

        let key = ConnectionKey::new("10.0.0.1", 8728)
            .with_username("monitor")
            .with_password("inline")
            .with_credentials_file(file.path());

        let creds = resolve(&key).await.unwrap();
        assert_eq!(creds.username.as_deref(), Some("monitor"));
        assert_eq!(creds.password.as_deref(), Some("from-file"));
    }

    #[tokio::test]
    async fn test_missing_file_is_a_credentials_error() {
        let key = ConnectionKey::new("10.0.0.1", 8728)
            .with_credentials_file("/nonexistent/fleetscrape/credentials.toml");

        let err = resolve(&key).await.unwrap_err();
        assert!(matches!(err, ConnectionError::Credentials { .. }));
    }

    #[tokio::test]
    async fn test_malformed_file_is_a_credentials_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "password = ").unwrap();

        let key = ConnectionKey::new("10.0.0.1", 8728).with_credentials_file(file.path());
        let err = resolve(&key).await.unwrap_err();
        assert!(matches!(err, ConnectionError::Credentials { .. }));
    }
}
