//! Chunk access instrumentation

use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};

/// Monotonic access counter with a bounded history of snapshots.
///
/// Scans only do a relaxed increment; a single background sampler thread
/// calls [`AccessCounter::record_snapshot`] to append to the history ring.
#[derive(Debug)]
pub struct AccessCounter {
    counter: AtomicU64,
    history: Mutex<VecDeque<u64>>,
    capacity: usize,
}

impl AccessCounter {
    pub fn new(capacity: usize) -> Self {
        Self {
            counter: AtomicU64::new(0),
            history: Mutex::new(VecDeque::with_capacity(capacity)),
            capacity,
        }
    }

    pub fn increment(&self) {
        self.counter.fetch_add(1, Ordering::Relaxed);
    }

    pub fn add(&self, value: u64) {
        self.counter.fetch_add(value, Ordering::Relaxed);
    }

    pub fn count(&self) -> u64 {
        self.counter.load(Ordering::Relaxed)
    }

    /// Snapshot the current counter into the history ring, evicting the
    /// oldest sample once the ring is full.
    pub fn record_snapshot(&self) {
        let mut history = self.history.lock();
        if history.len() == self.capacity {
            history.pop_front();
        }
        history.push_back(self.count());
    }

    /// Accesses observed over the most recent `lookback` snapshot
    /// intervals, clamped to the retained history.
    pub fn history_sample(&self, lookback: usize) -> u64 {
        let history = self.history.lock();
        let newest = match history.back() {
            Some(value) => *value,
            None => return 0,
        };
        let span = lookback.min(history.len() - 1);
        let base = history[history.len() - 1 - span];
        newest - base
    }
}

impl Default for AccessCounter {
    fn default() -> Self {
        Self::new(100)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counting() {
        let counter = AccessCounter::new(4);
        counter.increment();
        counter.add(4);
        assert_eq!(counter.count(), 5);
    }

    #[test]
    fn test_history_sample() {
        let counter = AccessCounter::new(4);
        counter.record_snapshot(); // 0
        counter.add(10);
        counter.record_snapshot(); // 10
        counter.add(5);
        counter.record_snapshot(); // 15

        assert_eq!(counter.history_sample(1), 5);
        assert_eq!(counter.history_sample(2), 15);
        // clamped to retained history
        assert_eq!(counter.history_sample(10), 15);
    }

    #[test]
    fn test_history_eviction() {
        let counter = AccessCounter::new(2);
        for _ in 0..5 {
            counter.add(1);
            counter.record_snapshot();
        }
        // only two samples retained: 4 and 5
        assert_eq!(counter.history_sample(10), 1);
    }

    #[test]
    fn test_empty_history() {
        let counter = AccessCounter::new(2);
        assert_eq!(counter.history_sample(3), 0);
    }
}
