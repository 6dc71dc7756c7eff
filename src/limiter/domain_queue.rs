//! Per-domain execution queue state.

use std::sync::atomic::{AtomicU64, Ordering};

use tokio::sync::Mutex;

/// Serialization and counters for a single domain.
///
/// The gate is a fair mutex: waiters acquire it in arrival order, which is
/// what gives a domain its FIFO execution guarantee.
#[derive(Debug)]
pub(crate) struct DomainQueue {
    pub(crate) gate: Mutex<()>,
    dispatched: AtomicU64,
    failed: AtomicU64,
}

impl DomainQueue {
    pub(crate) fn new() -> Self {
        Self {
            gate: Mutex::new(()),
            dispatched: AtomicU64::new(0),
            failed: AtomicU64::new(0),
        }
    }

    pub(crate) fn record_dispatch(&self) {
        self.dispatched.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_failure(&self) {
        self.failed.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn stats(&self) -> DomainStats {
        DomainStats {
            dispatched: self.dispatched.load(Ordering::Relaxed),
            failed: self.failed.load(Ordering::Relaxed),
        }
    }
}

/// Read-only per-domain dispatch counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DomainStats {
    /// Actions that reached execution for this domain.
    pub dispatched: u64,
    /// Actions that returned an error or panicked.
    pub failed: u64,
}
