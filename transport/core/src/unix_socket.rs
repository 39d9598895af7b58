//! Unix Socket Transport
//!
//! Synchronous, fire-and-forget sender for a local collector listening on a
//! Unix domain socket.
//!
//! # State Machine
//!
//! ```text
//!                 connect ok
//!  ┌──────────────┐ ───────────► ┌───────────┐
//!  │ Disconnected │              │ Connected │ ──┐ write ok
//!  └──────────────┘ ◄─────────── └───────────┘ ◄─┘
//!    ▲        │     write error /
//!    └────────┘     timeout
//!   connect failed
//! ```
//!
//! Every `send` makes at most one connect attempt and one write attempt.
//! A failed payload is dropped, never retried; the next `send` reconnects.
//!
//! # Blocking
//!
//! The whole transmit runs against one deadline, so a collector that stops
//! reading, or drains slower than the caller writes, costs the caller at most
//! one timeout per call instead of an indefinite stall on a full kernel
//! buffer.

use std::io::{self, Write};
use std::net::Shutdown;
use std::os::unix::net::UnixStream;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use parking_lot::Mutex;

use crate::config::{TransportConfig, DEFAULT_SEND_TIMEOUT_MS};
use crate::error::{ConfigError, TransportError};
use crate::stats::{TransportCounters, TransportStats};

/// Connection state of a transport
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum ConnectionState {
    Disconnected,
    Connected,
}

/// Socket handle plus disposal flag, guarded together
#[derive(Debug, Default)]
struct Connection {
    stream: Option<UnixStream>,
    closed: bool,
}

impl Connection {
    fn state(&self) -> ConnectionState {
        if self.stream.is_some() {
            ConnectionState::Connected
        } else {
            ConnectionState::Disconnected
        }
    }
}

/// Fire-and-forget Unix domain socket transport
///
/// Connects lazily to `endpoint` on the first [`send`](Self::send) and after
/// any failure. Transport failures are logged and the payload is dropped;
/// nothing is ever reported back to the caller.
///
/// The transport is `Send + Sync`. Concurrent callers are serialized so that
/// each payload reaches the socket as one contiguous write.
///
/// # Example
///
/// ```no_run
/// use telemetry_transport::UnixDomainSocketTransport;
///
/// let transport = UnixDomainSocketTransport::new("/run/telemetry/collector.sock");
/// let payload = [0x01, 0x02, 0x03];
/// transport.send(&payload, payload.len());
/// transport.close();
/// ```
#[derive(Debug)]
pub struct UnixDomainSocketTransport {
    endpoint: PathBuf,
    send_timeout: Duration,
    connection: Mutex<Connection>,
    counters: TransportCounters,
}

impl UnixDomainSocketTransport {
    /// Create a transport for `endpoint` with the default send timeout
    ///
    /// No connection is made until the first send.
    pub fn new(endpoint: impl Into<PathBuf>) -> Self {
        Self::build(endpoint.into(), Duration::from_millis(DEFAULT_SEND_TIMEOUT_MS))
    }

    /// Create a transport with an explicit send timeout
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::ZeroTimeout`] for a zero timeout.
    pub fn with_send_timeout(
        endpoint: impl Into<PathBuf>,
        send_timeout: Duration,
    ) -> Result<Self, ConfigError> {
        if send_timeout.is_zero() {
            return Err(ConfigError::ZeroTimeout);
        }
        Ok(Self::build(endpoint.into(), send_timeout))
    }

    /// Create a transport from validated configuration
    ///
    /// # Errors
    ///
    /// Returns the validation error if the configuration is unusable.
    pub fn from_config(config: &TransportConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self::build(config.endpoint.clone(), config.send_timeout()))
    }

    fn build(endpoint: PathBuf, send_timeout: Duration) -> Self {
        tracing::debug!(path = ?endpoint, timeout = ?send_timeout, "Transport created");
        Self {
            endpoint,
            send_timeout,
            connection: Mutex::new(Connection::default()),
            counters: TransportCounters::default(),
        }
    }

    /// Path of the collector socket
    pub fn endpoint(&self) -> &Path {
        &self.endpoint
    }

    /// Timeout applied to each transmit
    #[must_use]
    pub fn send_timeout(&self) -> Duration {
        self.send_timeout
    }

    /// Snapshot of the transport's counters
    #[must_use]
    pub fn stats(&self) -> TransportStats {
        self.counters.snapshot()
    }

    /// Send the first `length` bytes of `buffer` to the collector
    ///
    /// `length` is clamped to the buffer size. Never fails from the
    /// caller's point of view: connect errors, write errors and timeouts
    /// drop the payload and reset the connection for the next call.
    pub fn send(&self, buffer: &[u8], length: usize) {
        let payload = &buffer[..length.min(buffer.len())];

        match self.try_send(payload) {
            Ok(()) => {
                self.counters.record_sent(payload.len());
                tracing::trace!(bytes = payload.len(), "Payload sent");
            }
            Err(e) => {
                self.counters.record_dropped();
                match e {
                    TransportError::ConnectFailed { .. } => {
                        self.counters.record_connect_failure();
                        tracing::debug!(error = %e, bytes = payload.len(), "Payload dropped");
                    }
                    TransportError::SendFailed(_) | TransportError::Timeout { .. } => {
                        self.counters.record_send_failure();
                        tracing::warn!(
                            error = %e,
                            path = ?self.endpoint,
                            bytes = payload.len(),
                            "Payload dropped, connection reset"
                        );
                    }
                    TransportError::Disposed => {
                        tracing::trace!(bytes = payload.len(), "Send after close ignored");
                    }
                }
            }
        }
    }

    /// One connect-if-needed plus one write, under the connection lock
    ///
    /// On a write failure the socket is released before returning, so the
    /// connection is left `Disconnected`.
    pub(crate) fn try_send(&self, payload: &[u8]) -> Result<(), TransportError> {
        let mut connection = self.connection.lock();
        if connection.closed {
            return Err(TransportError::Disposed);
        }

        tracing::trace!(state = ?connection.state(), bytes = payload.len(), "Sending");

        let stream = match connection.stream.take() {
            Some(stream) => stream,
            None => {
                let stream = self.connect()?;
                self.counters.record_connect();
                tracing::info!(path = ?self.endpoint, "Connected to collector");
                stream
            }
        };

        match write_before_deadline(&stream, payload, self.send_timeout) {
            Ok(()) => {
                connection.stream = Some(stream);
                Ok(())
            }
            Err(e) => {
                release(stream);
                Err(e)
            }
        }
    }

    fn connect(&self) -> Result<UnixStream, TransportError> {
        let connect_failed = |source: std::io::Error| TransportError::ConnectFailed {
            path: self.endpoint.clone(),
            source,
        };

        UnixStream::connect(&self.endpoint).map_err(connect_failed)
    }

    /// Release the socket and refuse further sends
    ///
    /// Safe to call from any state and any number of times. A send already
    /// in progress on another thread finishes (bounded by the send timeout)
    /// before the socket is released.
    pub fn close(&self) {
        let mut connection = self.connection.lock();
        if connection.closed {
            return;
        }
        connection.closed = true;

        if let Some(stream) = connection.stream.take() {
            release(stream);
        }
        tracing::debug!(path = ?self.endpoint, "Transport closed");
    }

    /// Whether [`close`](Self::close) has been called
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.connection.lock().closed
    }
}

impl Drop for UnixDomainSocketTransport {
    fn drop(&mut self) {
        self.close();
    }
}

/// Write all of `payload` before `timeout` elapses
///
/// `SO_SNDTIMEO` only bounds a single `write(2)`, so a peer draining slowly
/// would let `write_all` run on indefinitely. The socket timeout is re-armed
/// with the time left before each write instead.
fn write_before_deadline(
    stream: &UnixStream,
    payload: &[u8],
    timeout: Duration,
) -> Result<(), TransportError> {
    let deadline = Instant::now() + timeout;
    let mut writer = stream;
    let mut written = 0;

    while written < payload.len() {
        let remaining = deadline.saturating_duration_since(Instant::now());
        if remaining.is_zero() {
            tracing::debug!(written, bytes = payload.len(), "Send deadline passed");
            return Err(TransportError::Timeout { timeout });
        }
        stream
            .set_write_timeout(Some(remaining))
            .map_err(TransportError::SendFailed)?;

        match writer.write(&payload[written..]) {
            Ok(0) => return Err(TransportError::SendFailed(io::ErrorKind::WriteZero.into())),
            Ok(n) => written += n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
            Err(e) => return Err(TransportError::from_write(e, timeout)),
        }
    }

    Ok(())
}

/// Shut down both directions and drop the handle
fn release(stream: UnixStream) {
    if let Err(e) = stream.shutdown(Shutdown::Both) {
        // Already torn down by the peer
        tracing::trace!(error = %e, "Socket shutdown failed");
    }
}
