use std::sync::atomic::{AtomicU64, Ordering};

/// Counters for one service instance. Created by the caller and handed to
/// [`CodeNavService`](crate::CodeNavService); share it with an `Arc` to read
/// it from elsewhere.
#[derive(Debug, Default)]
pub struct Operations {
    requests: AtomicU64,
    driver_rounds: AtomicU64,
    locations: AtomicU64,
    dropped_locations: AtomicU64,
    translation_failures: AtomicU64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct OperationsSnapshot {
    pub requests: u64,
    /// Local then remote passes of the page driver; a page takes one or more
    pub driver_rounds: u64,
    pub locations: u64,
    /// Untranslatable locations left out of a response
    pub dropped_locations: u64,
    pub translation_failures: u64,
}

impl Operations {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn record_request(&self) {
        self.requests.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_driver_round(&self) {
        self.driver_rounds.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_locations(&self, n: usize) {
        self.locations.fetch_add(n as u64, Ordering::Relaxed);
    }

    pub(crate) fn record_dropped_location(&self) {
        self.dropped_locations.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_translation_failure(&self) {
        self.translation_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> OperationsSnapshot {
        OperationsSnapshot {
            requests: self.requests.load(Ordering::Relaxed),
            driver_rounds: self.driver_rounds.load(Ordering::Relaxed),
            locations: self.locations.load(Ordering::Relaxed),
            dropped_locations: self.dropped_locations.load(Ordering::Relaxed),
            translation_failures: self.translation_failures.load(Ordering::Relaxed),
        }
    }
}
