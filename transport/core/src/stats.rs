//! Transport Statistics
//!
//! Lock-free counters describing what happened to payloads handed to the
//! transport. Purely observational: nothing in the send path reads them.

use std::sync::atomic::{AtomicU64, Ordering};

/// Live counters owned by a transport
#[derive(Debug, Default)]
pub(crate) struct TransportCounters {
    payloads_sent: AtomicU64,
    payloads_dropped: AtomicU64,
    bytes_sent: AtomicU64,
    connects: AtomicU64,
    connect_failures: AtomicU64,
    send_failures: AtomicU64,
}

impl TransportCounters {
    pub(crate) fn record_sent(&self, bytes: usize) {
        self.payloads_sent.fetch_add(1, Ordering::Relaxed);
        self.bytes_sent.fetch_add(bytes as u64, Ordering::Relaxed);
    }

    pub(crate) fn record_dropped(&self) {
        self.payloads_dropped.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_connect(&self) {
        self.connects.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_connect_failure(&self) {
        self.connect_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_send_failure(&self) {
        self.send_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn snapshot(&self) -> TransportStats {
        TransportStats {
            payloads_sent: self.payloads_sent.load(Ordering::Relaxed),
            payloads_dropped: self.payloads_dropped.load(Ordering::Relaxed),
            bytes_sent: self.bytes_sent.load(Ordering::Relaxed),
            connects: self.connects.load(Ordering::Relaxed),
            connect_failures: self.connect_failures.load(Ordering::Relaxed),
            send_failures: self.send_failures.load(Ordering::Relaxed),
        }
    }
}

/// Point-in-time snapshot of transport counters
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TransportStats {
    /// Payloads fully written to the socket
    pub payloads_sent: u64,
    /// Payloads discarded because of a connect, send, or timeout failure
    pub payloads_dropped: u64,
    /// Total bytes written
    pub bytes_sent: u64,
    /// Connections established, including reconnects
    pub connects: u64,
    /// Failed connect attempts
    pub connect_failures: u64,
    /// Failed transmits (errors and timeouts)
    pub send_failures: u64,
}

impl TransportStats {
    /// Total payloads handed to `send`
    #[must_use]
    pub fn payloads_attempted(&self) -> u64 {
        self.payloads_sent + self.payloads_dropped
    }
}
