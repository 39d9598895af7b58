//! Error Types
//!
//! Errors produced inside the transport. None of these ever cross the
//! public `send` boundary: they are logged and dropped there. Configuration
//! errors are the exception and are returned from constructors.

use std::io;
use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

/// Failure of a single send attempt
#[derive(Debug, Error)]
pub enum TransportError {
    /// The endpoint is missing, refused the connection, or failed to configure
    #[error("failed to connect to {path:?}: {source}")]
    ConnectFailed {
        /// Endpoint that was dialed
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: io::Error,
    },

    /// The peer reset the connection, the pipe broke, or the write failed
    #[error("send failed: {0}")]
    SendFailed(#[source] io::Error),

    /// The transmit did not complete within the send timeout
    #[error("send timed out after {timeout:?}")]
    Timeout {
        /// Configured send timeout
        timeout: Duration,
    },

    /// The transport was closed before the send
    #[error("transport has been closed")]
    Disposed,
}

impl TransportError {
    /// Classify a write error, separating timeout expiry from hard failures
    ///
    /// A socket write timeout surfaces as `WouldBlock` on Unix and as
    /// `TimedOut` on some platforms.
    pub(crate) fn from_write(err: io::Error, timeout: Duration) -> Self {
        match err.kind() {
            io::ErrorKind::WouldBlock | io::ErrorKind::TimedOut => Self::Timeout { timeout },
            _ => Self::SendFailed(err),
        }
    }

    /// Whether this failure happened while connecting
    #[must_use]
    pub fn is_connect(&self) -> bool {
        matches!(self, Self::ConnectFailed { .. })
    }
}

/// Invalid or unreadable transport configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A zero send timeout would disable the write bound entirely
    #[error("send timeout must be greater than zero")]
    ZeroTimeout,

    /// The endpoint path is empty
    #[error("endpoint path must not be empty")]
    EmptyEndpoint,

    /// The configuration file could not be read
    #[error("failed to read config file {path:?}: {source}")]
    Io {
        /// File that was read
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: io::Error,
    },

    /// The configuration file is not valid TOML for this schema
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_write_timeout_is_classified_as_timeout() {
        let timeout = Duration::from_millis(50);
        let err = TransportError::from_write(io::ErrorKind::WouldBlock.into(), timeout);
        assert!(matches!(err, TransportError::Timeout { timeout: t } if t == timeout));

        let err = TransportError::from_write(io::ErrorKind::TimedOut.into(), timeout);
        assert!(matches!(err, TransportError::Timeout { .. }));
    }

    #[test]
    fn test_broken_pipe_is_classified_as_send_failure() {
        let err = TransportError::from_write(
            io::ErrorKind::BrokenPipe.into(),
            Duration::from_secs(1),
        );
        assert!(matches!(err, TransportError::SendFailed(_)));
        assert!(!err.is_connect());
    }

    #[test]
    fn test_connect_error_display_names_path() {
        let err = TransportError::ConnectFailed {
            path: PathBuf::from("/tmp/missing.sock"),
            source: io::ErrorKind::NotFound.into(),
        };
        assert!(err.is_connect());
        assert!(err.to_string().contains("missing.sock"));
    }
}
