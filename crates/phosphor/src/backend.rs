//! # Headless Backend
//!
//! A present backend that records instead of touching a GPU. Used by the
//! demo binary and the integration tests; the pipeline neither knows nor
//! cares that nothing real is drawn.

use parking_lot::Mutex;
use phosphor_present::{BackendError, PresentBackend};
use phosphor_core::RenderBackend;
use std::sync::Arc;
use std::time::Duration;

/// Counters from backend operations.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BackendStats {
    /// Flush boundaries emitted (one per stale frame drained).
    pub flushes: u64,
    /// Successful presents (buffer swaps).
    pub presents: u64,
}

/// A backend whose "display" is a pair of counters.
///
/// Stats are shared through the handle returned by [`stats_handle`]
/// (`HeadlessBackend::stats_handle`), so other threads can watch them while
/// the present loop owns the backend itself.
#[derive(Debug)]
pub struct HeadlessBackend {
    refresh: Duration,
    stats: Arc<Mutex<BackendStats>>,
}

impl HeadlessBackend {
    /// Creates a backend pretending to be a display with the given refresh
    /// interval.
    #[must_use]
    pub fn new(refresh: Duration) -> Self {
        Self {
            refresh,
            stats: Arc::new(Mutex::new(BackendStats::default())),
        }
    }

    /// Returns a handle for reading the stats from any thread.
    #[must_use]
    pub fn stats_handle(&self) -> Arc<Mutex<BackendStats>> {
        Arc::clone(&self.stats)
    }

    /// Current stats snapshot.
    #[must_use]
    pub fn stats(&self) -> BackendStats {
        *self.stats.lock()
    }
}

impl RenderBackend for HeadlessBackend {
    fn flush(&mut self) {
        self.stats.lock().flushes += 1;
    }
}

impl PresentBackend for HeadlessBackend {
    fn present(&mut self) -> Result<(), BackendError> {
        self.stats.lock().presents += 1;
        Ok(())
    }

    fn refresh_interval(&mut self) -> Duration {
        self.refresh
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stats_visible_through_handle() {
        let mut backend = HeadlessBackend::new(Duration::from_millis(16));
        let handle = backend.stats_handle();

        backend.flush();
        backend.present().expect("present failed");
        backend.present().expect("present failed");

        let stats = *handle.lock();
        assert_eq!(
            stats,
            BackendStats {
                flushes: 1,
                presents: 2
            }
        );
    }
}
