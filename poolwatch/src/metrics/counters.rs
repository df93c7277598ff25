use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Minimal counters for operational visibility.
#[derive(Clone, Default, Debug)]
pub struct Counters {
    pub refreshes_started: Arc<AtomicU64>,
    pub refreshes_published: Arc<AtomicU64>,
    pub refresh_failures: Arc<AtomicU64>,

    // skip reasons
    pub skipped_invalid_pair: Arc<AtomicU64>,
    pub skipped_in_flight: Arc<AtomicU64>,
    pub skipped_cooldown: Arc<AtomicU64>,

    pub swap_notices: Arc<AtomicU64>,
    pub events_dropped: Arc<AtomicU64>,
}

impl Counters {
    pub(crate) fn bump(counter: &AtomicU64) {
        counter.fetch_add(1, Ordering::Relaxed);
    }

    pub fn get(counter: &AtomicU64) -> u64 {
        counter.load(Ordering::Relaxed)
    }
}
