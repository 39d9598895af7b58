//! Telemetry Collector - Local Receiver for the Unix Socket Transport
//!
//! A small listener that accepts connections from
//! `telemetry_transport::UnixDomainSocketTransport` senders and accounts
//! for every byte it receives. Payloads are not framed or decoded here.
//!
//! Used as a development collector and as the peer in end-to-end tests.

#![deny(missing_docs)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod server;

pub use server::{
    CollectorConfig, CollectorServer, CollectorStats, ConnectionId, ReceivedChunk, StatsHandle,
};
