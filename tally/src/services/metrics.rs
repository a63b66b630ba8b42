//! Pipeline counters.
//!
//! [`DrainMetrics`] keeps lock-free totals that tests and the CLI can read
//! back, and mirrors every update to the `metrics` facade so whatever
//! recorder the host installs sees the same numbers.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use serde::Serialize;

#[derive(Debug, Default)]
pub struct DrainMetrics {
    /// Increments accepted by the recorder
    pub recorded: AtomicU64,
    /// Fields persisted and settled
    pub fields_drained: AtomicU64,
    /// Fields retained because they could not be decoded
    pub dead_letters: AtomicU64,
    /// Fields retained because the sink rejected them
    pub persist_failures: AtomicU64,
    /// Ticks dropped because a drain was still running
    pub ticks_skipped: AtomicU64,
    pub ticks_completed: AtomicU64,
}

impl DrainMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_hit(&self, kind: &'static str) {
        self.recorded.fetch_add(1, Ordering::Relaxed);
        metrics::counter!("tally_recorded_total", "kind" => kind).increment(1);
    }

    pub fn record_drained(&self, pass: &'static str, fields: u64) {
        if fields == 0 {
            return;
        }
        self.fields_drained.fetch_add(fields, Ordering::Relaxed);
        metrics::counter!("tally_fields_drained_total", "pass" => pass).increment(fields);
    }

    pub fn record_dead_letter(&self, pass: &'static str) {
        self.dead_letters.fetch_add(1, Ordering::Relaxed);
        metrics::counter!("tally_dead_letter_total", "pass" => pass).increment(1);
    }

    pub fn record_persist_failure(&self, pass: &'static str) {
        self.persist_failures.fetch_add(1, Ordering::Relaxed);
        metrics::counter!("tally_persist_failures_total", "pass" => pass).increment(1);
    }

    pub fn record_tick_skipped(&self) {
        self.ticks_skipped.fetch_add(1, Ordering::Relaxed);
        metrics::counter!("tally_ticks_skipped_total").increment(1);
    }

    pub fn record_tick_completed(&self, elapsed: Duration) {
        self.ticks_completed.fetch_add(1, Ordering::Relaxed);
        metrics::histogram!("tally_tick_duration_seconds").record(elapsed.as_secs_f64());
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            recorded: self.recorded.load(Ordering::Relaxed),
            fields_drained: self.fields_drained.load(Ordering::Relaxed),
            dead_letters: self.dead_letters.load(Ordering::Relaxed),
            persist_failures: self.persist_failures.load(Ordering::Relaxed),
            ticks_skipped: self.ticks_skipped.load(Ordering::Relaxed),
            ticks_completed: self.ticks_completed.load(Ordering::Relaxed),
        }
    }
}

/// Point-in-time copy of [`DrainMetrics`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricsSnapshot {
    pub recorded: u64,
    pub fields_drained: u64,
    pub dead_letters: u64,
    pub persist_failures: u64,
    pub ticks_skipped: u64,
    pub ticks_completed: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_snapshot_reflects_updates() {
        let metrics = DrainMetrics::new();
        metrics.record_hit("geo");
        metrics.record_hit("activity");
        metrics.record_drained("live_geo", 3);
        metrics.record_drained("live_geo", 0);
        metrics.record_dead_letter("live_geo");
        metrics.record_tick_skipped();
        metrics.record_tick_completed(Duration::from_millis(5));

        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.recorded, 2);
        assert_eq!(snapshot.fields_drained, 3);
        assert_eq!(snapshot.dead_letters, 1);
        assert_eq!(snapshot.persist_failures, 0);
        assert_eq!(snapshot.ticks_skipped, 1);
        assert_eq!(snapshot.ticks_completed, 1);
    }
}
