use std::sync::atomic::{AtomicU64, Ordering};

/// Lock-free run counters, one instance per `Orchestrator`. Plain data, no
/// behavior beyond incrementing and snapshotting.
#[derive(Default)]
pub struct Metrics {
    pub candidates_discovered: AtomicU64,
    pub candidates_filtered: AtomicU64,
    pub candidates_scraped: AtomicU64,
    pub candidates_validated: AtomicU64,
    pub records_upserted: AtomicU64,
    pub errors: AtomicU64,
}

impl Metrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            candidates_discovered: self.candidates_discovered.load(Ordering::Relaxed),
            candidates_filtered: self.candidates_filtered.load(Ordering::Relaxed),
            candidates_scraped: self.candidates_scraped.load(Ordering::Relaxed),
            candidates_validated: self.candidates_validated.load(Ordering::Relaxed),
            records_upserted: self.records_upserted.load(Ordering::Relaxed),
            errors: self.errors.load(Ordering::Relaxed),
        }
    }

    pub fn incr(counter: &AtomicU64) {
        counter.fetch_add(1, Ordering::Relaxed);
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct MetricsSnapshot {
    pub candidates_discovered: u64,
    pub candidates_filtered: u64,
    pub candidates_scraped: u64,
    pub candidates_validated: u64,
    pub records_upserted: u64,
    pub errors: u64,
}
