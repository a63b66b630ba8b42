//! Tick sources driving the drain scheduler.

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::mpsc;
use tokio::time::{Interval, MissedTickBehavior};

/// Yields the instant of each drain tick. `None` ends the scheduler loop.
#[async_trait]
pub trait TickSource: Send {
    async fn tick(&mut self) -> Option<DateTime<Utc>>;
}

/// Wall-clock ticks at a fixed period. The first tick fires immediately so
/// that counters left behind by a previous process are drained on startup.
/// Ticks missed while the runtime was busy are dropped rather than bunched.
#[derive(Debug)]
pub struct IntervalTicks {
    interval: Interval,
}

impl IntervalTicks {
    pub fn new(period: Duration) -> Self {
        let mut interval = tokio::time::interval(period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
        Self { interval }
    }

    pub fn period(&self) -> Duration {
        self.interval.period()
    }
}

#[async_trait]
impl TickSource for IntervalTicks {
    async fn tick(&mut self) -> Option<DateTime<Utc>> {
        self.interval.tick().await;
        Some(Utc::now())
    }
}

/// Ticks pushed by hand through a [`ManualTickHandle`]. The source ends once
/// every handle is dropped.
#[derive(Debug)]
pub struct ManualTicks {
    rx: mpsc::UnboundedReceiver<DateTime<Utc>>,
}

#[derive(Debug, Clone)]
pub struct ManualTickHandle {
    tx: mpsc::UnboundedSender<DateTime<Utc>>,
}

impl ManualTicks {
    pub fn channel() -> (ManualTickHandle, ManualTicks) {
        let (tx, rx) = mpsc::unbounded_channel();
        (ManualTickHandle { tx }, ManualTicks { rx })
    }
}

impl ManualTickHandle {
    /// Returns `false` if the scheduler has already stopped listening.
    pub fn tick(&self, at: DateTime<Utc>) -> bool {
        self.tx.send(at).is_ok()
    }
}

#[async_trait]
impl TickSource for ManualTicks {
    async fn tick(&mut self) -> Option<DateTime<Utc>> {
        self.rx.recv().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[tokio::test]
    async fn test_manual_ticks_end_when_handle_dropped() {
        let (handle, mut ticks) = ManualTicks::channel();
        let at = Utc.with_ymd_and_hms(2025, 3, 1, 0, 0, 0).unwrap();

        assert!(handle.tick(at));
        drop(handle);

        assert_eq!(ticks.tick().await, Some(at));
        assert_eq!(ticks.tick().await, None);
    }

    #[tokio::test]
    async fn test_interval_ticks_fire_immediately() {
        let mut ticks = IntervalTicks::new(Duration::from_secs(300));
        assert_eq!(ticks.period(), Duration::from_secs(300));

        let first = tokio::time::timeout(Duration::from_secs(1), ticks.tick()).await;
        assert!(matches!(first, Ok(Some(_))));
    }
}
