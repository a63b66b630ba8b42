//! Periodic drain driver.
//!
//! The scheduler owns a two-state machine, [`SchedulerState::Idle`] and
//! [`SchedulerState::Running`]. A tick moves it from idle to running with a
//! compare-and-set; a tick that finds it already running is skipped, never
//! queued. Ticks run on their own task so a slow drain never delays the
//! timer, and nothing cancels a tick once it has started.

pub mod tick;

pub use tick::{IntervalTicks, ManualTickHandle, ManualTicks, TickSource};

use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicU8, Ordering};
use std::time::Instant;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use crate::drainer::{Drainer, TickReport};
use crate::services::DrainMetrics;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[repr(u8)]
pub enum SchedulerState {
    Idle = 0,
    Running = 1,
}

impl SchedulerState {
    fn from_u8(value: u8) -> Self {
        match value {
            1 => SchedulerState::Running,
            _ => SchedulerState::Idle,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum TickOutcome {
    Completed(TickReport),
    Skipped,
}

impl TickOutcome {
    pub fn report(&self) -> Option<&TickReport> {
        match self {
            TickOutcome::Completed(report) => Some(report),
            TickOutcome::Skipped => None,
        }
    }
}

/// Totals of one [`DrainScheduler::run`] loop.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RunSummary {
    pub started: u64,
    pub skipped: u64,
}

/// Holds the scheduler in `Running` and puts it back to `Idle` when dropped,
/// including when a tick panics.
#[derive(Debug)]
struct RunningGuard {
    state: Arc<AtomicU8>,
}

impl Drop for RunningGuard {
    fn drop(&mut self) {
        self.state
            .store(SchedulerState::Idle as u8, Ordering::Release);
    }
}

#[derive(Debug, Clone)]
pub struct DrainScheduler {
    drainer: Arc<Drainer>,
    metrics: Arc<DrainMetrics>,
    state: Arc<AtomicU8>,
}

impl DrainScheduler {
    pub fn new(drainer: Arc<Drainer>, metrics: Arc<DrainMetrics>) -> Self {
        Self {
            drainer,
            metrics,
            state: Arc::new(AtomicU8::new(SchedulerState::Idle as u8)),
        }
    }

    pub fn state(&self) -> SchedulerState {
        SchedulerState::from_u8(self.state.load(Ordering::Acquire))
    }

    fn try_begin(&self) -> Option<RunningGuard> {
        self.state
            .compare_exchange(
                SchedulerState::Idle as u8,
                SchedulerState::Running as u8,
                Ordering::AcqRel,
                Ordering::Acquire,
            )
            .ok()
            .map(|_| RunningGuard {
                state: self.state.clone(),
            })
    }

    /// Runs a single guarded tick on the current task.
    pub async fn run_once(&self, now: DateTime<Utc>) -> TickOutcome {
        match self.try_begin() {
            Some(guard) => self.run_tick(guard, now).await,
            None => self.skip(now),
        }
    }

    /// Drives ticks from `source` until it ends or `shutdown` resolves, then
    /// waits for the tick in flight, if any.
    pub async fn run<S, F>(&self, mut source: S, shutdown: F) -> RunSummary
    where
        S: TickSource,
        F: Future<Output = ()>,
    {
        let mut summary = RunSummary::default();
        let mut in_flight: Option<JoinHandle<TickOutcome>> = None;
        tokio::pin!(shutdown);

        info!("Drain scheduler started");

        loop {
            let now = tokio::select! {
                tick = source.tick() => match tick {
                    Some(now) => now,
                    None => break,
                },
                _ = &mut shutdown => {
                    info!("Drain scheduler received shutdown");
                    break;
                }
            };

            let Some(guard) = self.try_begin() else {
                self.skip(now);
                summary.skipped += 1;
                continue;
            };

            summary.started += 1;
            let scheduler = self.clone();
            in_flight = Some(tokio::spawn(
                async move { scheduler.run_tick(guard, now).await },
            ));
        }

        if let Some(handle) = in_flight.take() {
            if let Err(e) = handle.await {
                error!("Drain tick task failed: {}", e);
            }
        }

        info!(
            started = summary.started,
            skipped = summary.skipped,
            "Drain scheduler stopped"
        );
        summary
    }

    async fn run_tick(&self, guard: RunningGuard, now: DateTime<Utc>) -> TickOutcome {
        let started = Instant::now();
        debug!(%now, "Drain tick started");

        let report = self.drainer.drain_all(now).await;
        drop(guard);

        let elapsed = started.elapsed();
        self.metrics.record_tick_completed(elapsed);

        if report.total.is_clean() {
            info!(
                fields = report.total.fields_drained,
                records = report.total.records_persisted,
                elapsed_ms = elapsed.as_millis() as u64,
                "Drain tick completed"
            );
        } else {
            warn!(
                fields = report.total.fields_drained,
                dead_letters = report.total.dead_letters,
                persist_failures = report.total.persist_failures,
                store_failures = report.total.store_failures,
                elapsed_ms = elapsed.as_millis() as u64,
                "Drain tick completed with retained fields"
            );
        }

        TickOutcome::Completed(report)
    }

    fn skip(&self, now: DateTime<Utc>) -> TickOutcome {
        warn!(%now, "Previous drain still running, skipping tick");
        self.metrics.record_tick_skipped();
        TickOutcome::Skipped
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sink::MemoryStatSink;
    use crate::store::MemoryCounterStore;

    fn scheduler() -> DrainScheduler {
        let metrics = Arc::new(DrainMetrics::new());
        let drainer = Drainer::new(
            Arc::new(MemoryCounterStore::new()),
            Arc::new(MemoryStatSink::new()),
            metrics.clone(),
        );
        DrainScheduler::new(Arc::new(drainer), metrics)
    }

    #[test]
    fn test_guard_is_exclusive() {
        let scheduler = scheduler();
        assert_eq!(scheduler.state(), SchedulerState::Idle);

        let guard = scheduler.try_begin();
        assert!(guard.is_some());
        assert_eq!(scheduler.state(), SchedulerState::Running);
        assert!(scheduler.try_begin().is_none());

        drop(guard);
        assert_eq!(scheduler.state(), SchedulerState::Idle);
        assert!(scheduler.try_begin().is_some());
    }

    #[tokio::test]
    async fn test_run_once_returns_to_idle() {
        let scheduler = scheduler();

        let outcome = scheduler.run_once(Utc::now()).await;

        assert!(outcome.report().is_some());
        assert_eq!(scheduler.state(), SchedulerState::Idle);
    }

    #[tokio::test]
    async fn test_run_once_skips_while_running() {
        let scheduler = scheduler();
        let _guard = scheduler.try_begin();

        assert_eq!(scheduler.run_once(Utc::now()).await, TickOutcome::Skipped);
        assert_eq!(scheduler.metrics.snapshot().ticks_skipped, 1);
    }
}
