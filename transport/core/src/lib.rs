//! Telemetry Transport - Fire-and-Forget Local IPC for Telemetry Exporters
//!
//! This crate ships already-serialized telemetry payloads from an in-process
//! exporter to a local collector process over a Unix domain socket. It is
//! built to never get in the way of the instrumented application: a slow,
//! missing, or restarting collector costs dropped payloads, never a hang or
//! a crash.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────┐                 ┌─────────────────────┐
//! │     Instrumented process     │                 │      Collector      │
//! │                              │                 │                     │
//! │  exporter ──► send(buf, len) │   Unix socket   │                     │
//! │      UnixDomainSocketTransport├────────────────►│  raw byte stream    │
//! │   (lazy connect, write timeout)│  collector.sock │                     │
//! └──────────────────────────────┘                 └─────────────────────┘
//! ```
//!
//! # Key Types
//!
//! - [`UnixDomainSocketTransport`]: The transport itself
//! - [`TransportConfig`]: Endpoint and send timeout, from env or TOML
//! - [`TransportStats`]: Counters for sent and dropped payloads
//! - [`TransportError`]: Internal failure taxonomy (logged, never returned from `send`)
//!
//! # Quick Start
//!
//! ```no_run
//! use telemetry_transport::{TransportConfig, UnixDomainSocketTransport};
//!
//! let config = TransportConfig::from_env();
//! let transport = UnixDomainSocketTransport::from_config(&config)?;
//!
//! let payload = b"serialized spans";
//! transport.send(payload, payload.len());
//!
//! transport.close();
//! # Ok::<(), telemetry_transport::ConfigError>(())
//! ```
//!
//! # Wire Format
//!
//! None. Bytes are written exactly as given; any framing belongs to the
//! caller's serialization format.

#![deny(missing_docs)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

#[cfg(not(unix))]
compile_error!("telemetry-transport requires Unix domain sockets");

pub mod config;
pub mod error;
pub mod stats;
pub mod unix_socket;

// Re-exports for convenience
pub use config::{
    default_socket_path, load_config_from_path, TransportConfig, DEFAULT_SEND_TIMEOUT_MS,
};
pub use error::{ConfigError, TransportError};
pub use stats::TransportStats;
pub use unix_socket::UnixDomainSocketTransport;
