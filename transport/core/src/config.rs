//! Transport Configuration
//!
//! Endpoint and timeout settings for the Unix socket transport, loadable
//! from defaults, environment variables, or a TOML file.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Default send timeout in milliseconds
pub const DEFAULT_SEND_TIMEOUT_MS: u64 = 15_000;

/// Transport configuration
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TransportConfig {
    /// Path of the collector's Unix domain socket
    ///
    /// Default: $XDG_RUNTIME_DIR/telemetry/collector.sock
    /// Fallback: /tmp/telemetry-$UID/collector.sock
    pub endpoint: PathBuf,

    /// Send timeout in milliseconds
    ///
    /// Bounds how long a single transmit may block when the collector
    /// stops draining its socket. Does not apply to connecting.
    pub send_timeout_ms: u64,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            endpoint: default_socket_path(),
            send_timeout_ms: DEFAULT_SEND_TIMEOUT_MS,
        }
    }
}

impl TransportConfig {
    /// Create configuration for an explicit endpoint with the default timeout
    #[must_use]
    pub fn for_endpoint(endpoint: impl Into<PathBuf>) -> Self {
        Self {
            endpoint: endpoint.into(),
            ..Default::default()
        }
    }

    /// Load configuration from environment variables
    ///
    /// Environment variables:
    /// - `TELEMETRY_SOCKET`: Path to the collector socket
    /// - `TELEMETRY_SEND_TIMEOUT_MS`: Send timeout in ms
    #[must_use]
    pub fn from_env() -> Self {
        Self {
            endpoint: std::env::var("TELEMETRY_SOCKET")
                .ok()
                .filter(|v| !v.is_empty())
                .map_or_else(default_socket_path, PathBuf::from),
            send_timeout_ms: std::env::var("TELEMETRY_SEND_TIMEOUT_MS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(DEFAULT_SEND_TIMEOUT_MS),
        }
    }

    /// Parse configuration from a TOML document
    ///
    /// Missing keys take their default values.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] for malformed TOML, or the
    /// [`validate`](Self::validate) error for unusable values.
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Send timeout as a [`Duration`]
    #[must_use]
    pub fn send_timeout(&self) -> Duration {
        Duration::from_millis(self.send_timeout_ms)
    }

    /// Check that the configuration can drive a transport
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::EmptyEndpoint`] or [`ConfigError::ZeroTimeout`].
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.endpoint.as_os_str().is_empty() {
            return Err(ConfigError::EmptyEndpoint);
        }
        if self.send_timeout_ms == 0 {
            return Err(ConfigError::ZeroTimeout);
        }
        Ok(())
    }
}

/// Load and validate configuration from a TOML file
///
/// # Errors
///
/// Returns [`ConfigError::Io`] if the file cannot be read, otherwise the
/// errors of [`TransportConfig::from_toml_str`].
pub fn load_config_from_path(path: &Path) -> Result<TransportConfig, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    TransportConfig::from_toml_str(&content)
}

/// Get the default collector socket path
///
/// Uses XDG_RUNTIME_DIR if available, otherwise /tmp/telemetry-$UID/
#[must_use]
pub fn default_socket_path() -> PathBuf {
    if let Ok(runtime_dir) = std::env::var("XDG_RUNTIME_DIR") {
        PathBuf::from(runtime_dir)
            .join("telemetry")
            .join("collector.sock")
    } else {
        let uid = unsafe { libc::getuid() };
        PathBuf::from(format!("/tmp/telemetry-{uid}/collector.sock"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_config_default() {
        let config = TransportConfig::default();
        assert_eq!(config.send_timeout_ms, DEFAULT_SEND_TIMEOUT_MS);
        assert_eq!(config.send_timeout(), Duration::from_secs(15));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_default_socket_path() {
        let path = default_socket_path();
        assert!(path.to_string_lossy().ends_with("collector.sock"));
    }

    #[test]
    fn test_from_toml_partial() {
        let config = TransportConfig::from_toml_str(r#"endpoint = "/tmp/x.sock""#).unwrap();
        assert_eq!(config.endpoint, PathBuf::from("/tmp/x.sock"));
        assert_eq!(config.send_timeout_ms, DEFAULT_SEND_TIMEOUT_MS);
    }

    #[test]
    fn test_from_toml_zero_timeout_rejected() {
        let result = TransportConfig::from_toml_str(
            r#"
            endpoint = "/tmp/x.sock"
            send_timeout_ms = 0
            "#,
        );
        assert!(matches!(result, Err(ConfigError::ZeroTimeout)));
    }

    #[test]
    fn test_from_toml_bad_type() {
        let result = TransportConfig::from_toml_str(r#"send_timeout_ms = "soon""#);
        assert!(matches!(result, Err(ConfigError::Parse(_))));
    }

    #[test]
    fn test_empty_endpoint_rejected() {
        let config = TransportConfig::for_endpoint("");
        assert!(matches!(config.validate(), Err(ConfigError::EmptyEndpoint)));
    }

    #[test]
    fn test_load_config_from_path() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "endpoint = \"/run/collector.sock\"").unwrap();
        writeln!(file, "send_timeout_ms = 250").unwrap();

        let config = load_config_from_path(file.path()).unwrap();
        assert_eq!(config.endpoint, PathBuf::from("/run/collector.sock"));
        assert_eq!(config.send_timeout(), Duration::from_millis(250));
    }

    #[test]
    fn test_load_config_missing_file() {
        let result = load_config_from_path(Path::new("/nonexistent/telemetry.toml"));
        assert!(matches!(result, Err(ConfigError::Io { .. })));
    }
}
