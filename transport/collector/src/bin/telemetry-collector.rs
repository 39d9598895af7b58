//! Telemetry Collector Daemon
//!
//! Listens on a Unix socket and logs what telemetry senders deliver.
//!
//! # Usage
//!
//! ```bash
//! # Start with default socket path ($XDG_RUNTIME_DIR/telemetry/collector.sock)
//! telemetry-collector
//!
//! # Start with custom socket path
//! TELEMETRY_SOCKET=/tmp/collector.sock telemetry-collector
//!
//! # Log every received chunk
//! RUST_LOG=telemetry_collector=debug telemetry-collector --dump
//! ```
//!
//! # Signals
//!
//! - SIGTERM/SIGINT: Graceful shutdown (removes the socket file)

use std::path::PathBuf;

use clap::Parser;
use tokio::signal;
use tokio::sync::{mpsc, watch};
use tracing::{debug, info};

use telemetry_collector::{CollectorConfig, CollectorServer, ReceivedChunk};
use telemetry_transport::TransportConfig;

/// Local collector for Unix socket telemetry transports
#[derive(Debug, Parser)]
#[command(name = "telemetry-collector", version, about)]
struct Args {
    /// Socket path to listen on
    #[arg(long, env = "TELEMETRY_SOCKET")]
    socket: Option<PathBuf>,

    /// Maximum number of concurrent connections
    #[arg(long, default_value_t = 64)]
    max_connections: usize,

    /// Per-connection read buffer size in bytes
    #[arg(long, default_value_t = 64 * 1024)]
    read_buffer: usize,

    /// Log every received chunk at debug level
    #[arg(long)]
    dump: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("telemetry_collector=info".parse()?),
        )
        .with_target(true)
        .init();

    let args = Args::parse();
    let socket_path = args
        .socket
        .unwrap_or_else(|| TransportConfig::from_env().endpoint);

    info!(pid = std::process::id(), path = ?socket_path, "Starting telemetry collector");

    let config = CollectorConfig {
        max_connections: args.max_connections,
        read_buffer_size: args.read_buffer,
    };
    let mut server = CollectorServer::bind(socket_path, config)?;

    if args.dump {
        let (chunk_tx, chunk_rx) = mpsc::channel::<ReceivedChunk>(1024);
        server = server.with_sink(chunk_tx);
        tokio::spawn(dump_chunks(chunk_rx));
    }

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    tokio::spawn(async move {
        wait_for_signal().await;
        let _ = shutdown_tx.send(true);
    });

    let stats = server.run(shutdown_rx).await?;

    info!(
        total_bytes = stats.total_bytes,
        total_connections = stats.total_connections,
        "Collector stopped"
    );
    Ok(())
}

/// Resolve when SIGINT or SIGTERM arrives
async fn wait_for_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    tokio::select! {
        () = ctrl_c => info!("Received Ctrl+C, shutting down"),
        () = terminate => info!("Received SIGTERM, shutting down"),
    }
}

async fn dump_chunks(mut chunk_rx: mpsc::Receiver<ReceivedChunk>) {
    while let Some(chunk) = chunk_rx.recv().await {
        debug!(
            conn_id = chunk.connection,
            bytes = chunk.bytes.len(),
            data = ?chunk.bytes,
            "Chunk"
        );
    }
}
