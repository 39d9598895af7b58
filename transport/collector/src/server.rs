//! Collector Server Implementation
//!
//! Accept loop for the local collector:
//! - Binds the Unix socket (owner-only permissions)
//! - Spawns a reader task per connection
//! - Accounts received bytes per connection and in total
//! - Optionally forwards raw chunks to a sink channel
//! - Removes the socket file on shutdown
//!
//! The byte stream is not framed or interpreted; chunk boundaries reflect
//! socket reads, not sender payloads.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;

use anyhow::{Context, Result};
use dashmap::DashMap;
use tokio::io::AsyncReadExt;
use tokio::net::{UnixListener, UnixStream};
use tokio::sync::{mpsc, watch};
use tokio::task::JoinSet;
use tracing::{debug, error, info, warn, Instrument};

/// Identifier assigned to each accepted connection
pub type ConnectionId = u64;

/// Configuration for the collector server
#[derive(Clone, Debug)]
pub struct CollectorConfig {
    /// Maximum number of concurrent connections
    pub max_connections: usize,
    /// Size of the per-connection read buffer
    pub read_buffer_size: usize,
}

impl Default for CollectorConfig {
    fn default() -> Self {
        Self {
            max_connections: 64,
            read_buffer_size: 64 * 1024,
        }
    }
}

/// A chunk of bytes read from one connection
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ReceivedChunk {
    /// Connection the bytes arrived on
    pub connection: ConnectionId,
    /// Raw bytes, in arrival order
    pub bytes: Vec<u8>,
}

/// Per-connection bookkeeping
#[derive(Debug)]
struct ConnectionEntry {
    connected_at: Instant,
    bytes: u64,
}

/// Snapshot of collector counters
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CollectorStats {
    /// Bytes received across all connections
    pub total_bytes: u64,
    /// Connections accepted since start
    pub total_connections: u64,
    /// Connections currently open
    pub active_connections: usize,
}

/// Shared, cloneable view of the collector's counters
#[derive(Clone, Debug, Default)]
pub struct StatsHandle {
    total_bytes: Arc<AtomicU64>,
    total_connections: Arc<AtomicU64>,
    connections: Arc<DashMap<ConnectionId, ConnectionEntry>>,
}

impl StatsHandle {
    /// Current counters
    #[must_use]
    pub fn snapshot(&self) -> CollectorStats {
        CollectorStats {
            total_bytes: self.total_bytes.load(Ordering::Relaxed),
            total_connections: self.total_connections.load(Ordering::Relaxed),
            active_connections: self.connections.len(),
        }
    }

    /// Bytes received so far on one connection, if it is still open
    #[must_use]
    pub fn connection_bytes(&self, id: ConnectionId) -> Option<u64> {
        self.connections.get(&id).map(|entry| entry.bytes)
    }

    fn record(&self, id: ConnectionId, n: usize) {
        self.total_bytes.fetch_add(n as u64, Ordering::Relaxed);
        if let Some(mut entry) = self.connections.get_mut(&id) {
            entry.bytes += n as u64;
        }
    }
}

/// Local collector listening on a Unix domain socket
pub struct CollectorServer {
    socket_path: PathBuf,
    config: CollectorConfig,
    listener: UnixListener,
    stats: StatsHandle,
    sink: Option<mpsc::Sender<ReceivedChunk>>,
    next_id: ConnectionId,
}

impl CollectorServer {
    /// Bind the collector socket
    ///
    /// Creates the parent directory if needed and replaces a stale socket
    /// file. Must be called from within a Tokio runtime.
    ///
    /// # Errors
    ///
    /// Fails if the socket directory cannot be prepared, the socket cannot
    /// be bound, or its permissions cannot be set.
    pub fn bind(socket_path: impl Into<PathBuf>, config: CollectorConfig) -> Result<Self> {
        let socket_path = socket_path.into();
        prepare_socket(&socket_path)?;

        let listener = UnixListener::bind(&socket_path)
            .with_context(|| format!("Failed to bind to {socket_path:?}"))?;

        {
            use std::os::unix::fs::PermissionsExt;
            let perms = fs::Permissions::from_mode(0o600);
            fs::set_permissions(&socket_path, perms)
                .with_context(|| format!("Failed to set permissions on {socket_path:?}"))?;
        }

        info!(path = ?socket_path, "Listening for connections");

        Ok(Self {
            socket_path,
            config,
            listener,
            stats: StatsHandle::default(),
            sink: None,
            next_id: 1,
        })
    }

    /// Forward every received chunk to `sink`
    ///
    /// A full or closed sink never stalls reading; chunks that cannot be
    /// forwarded are still counted.
    #[must_use]
    pub fn with_sink(mut self, sink: mpsc::Sender<ReceivedChunk>) -> Self {
        self.sink = Some(sink);
        self
    }

    /// Path of the bound socket
    pub fn socket_path(&self) -> &Path {
        &self.socket_path
    }

    /// Cloneable handle for observing counters while the server runs
    #[must_use]
    pub fn stats_handle(&self) -> StatsHandle {
        self.stats.clone()
    }

    /// Run the accept loop until `shutdown` flips to `true`
    ///
    /// Returns the final counters after all connection tasks have stopped
    /// and the socket file has been removed.
    ///
    /// # Errors
    ///
    /// Accept and read errors are logged without ending the loop, so no
    /// error is returned today.
    pub async fn run(mut self, mut shutdown: watch::Receiver<bool>) -> Result<CollectorStats> {
        let mut tasks = JoinSet::new();

        loop {
            tokio::select! {
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        info!("Shutdown requested, stopping accept loop");
                        break;
                    }
                }

                Some(joined) = tasks.join_next(), if !tasks.is_empty() => {
                    if let Err(e) = joined {
                        if e.is_panic() {
                            error!(error = %e, "Connection task panicked");
                        }
                    }
                }

                accepted = self.listener.accept() => {
                    let stream = match accepted {
                        Ok((stream, _addr)) => stream,
                        Err(e) => {
                            error!(error = %e, "Accept failed");
                            continue;
                        }
                    };

                    if self.stats.connections.len() >= self.config.max_connections {
                        warn!("Connection limit reached, rejecting new connection");
                        drop(stream);
                        continue;
                    }

                    let id = self.next_id;
                    self.next_id += 1;

                    self.stats.total_connections.fetch_add(1, Ordering::Relaxed);
                    self.stats.connections.insert(
                        id,
                        ConnectionEntry {
                            connected_at: Instant::now(),
                            bytes: 0,
                        },
                    );
                    info!(
                        conn_id = id,
                        active_connections = self.stats.connections.len(),
                        "New connection accepted"
                    );

                    tasks.spawn(
                        handle_connection(
                            id,
                            stream,
                            self.config.read_buffer_size,
                            self.stats.clone(),
                            self.sink.clone(),
                        )
                        .instrument(tracing::info_span!("connection", conn_id = id)),
                    );
                }
            }
        }

        tasks.shutdown().await;
        self.stats.connections.clear();
        self.remove_socket();

        Ok(self.stats.snapshot())
    }

    /// Remove the socket file
    fn remove_socket(&self) {
        if self.socket_path.exists() {
            if let Err(e) = fs::remove_file(&self.socket_path) {
                warn!(error = %e, path = ?self.socket_path, "Failed to remove socket file");
            } else {
                info!(path = ?self.socket_path, "Socket file removed");
            }
        }
    }
}

/// Create the parent directory and remove a stale socket file
fn prepare_socket(socket_path: &Path) -> Result<()> {
    if let Some(parent) = socket_path.parent() {
        if !parent.exists() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create socket directory: {parent:?}"))?;
            info!(path = ?parent, "Created socket directory");
        }
    }

    if socket_path.exists() {
        warn!(path = ?socket_path, "Removing stale socket file");
        fs::remove_file(socket_path)
            .with_context(|| format!("Failed to remove stale socket: {socket_path:?}"))?;
    }

    Ok(())
}

/// Read raw bytes from one connection until EOF or error
async fn handle_connection(
    id: ConnectionId,
    mut stream: UnixStream,
    buffer_size: usize,
    stats: StatsHandle,
    sink: Option<mpsc::Sender<ReceivedChunk>>,
) {
    let mut buf = vec![0u8; buffer_size.max(1)];

    loop {
        match stream.read(&mut buf).await {
            Ok(0) => {
                debug!("Client disconnected (EOF)");
                break;
            }
            Ok(n) => {
                stats.record(id, n);
                debug!(bytes = n, "Received");

                if let Some(ref sink) = sink {
                    let chunk = ReceivedChunk {
                        connection: id,
                        bytes: buf[..n].to_vec(),
                    };
                    if sink.try_send(chunk).is_err() {
                        debug!(bytes = n, "Sink full or closed, chunk not forwarded");
                    }
                }
            }
            Err(e) => {
                warn!(error = %e, "Read error");
                break;
            }
        }
    }

    if let Some((_, entry)) = stats.connections.remove(&id) {
        info!(
            bytes = entry.bytes,
            duration_ms = entry.connected_at.elapsed().as_millis(),
            "Connection closed"
        );
    }
}
