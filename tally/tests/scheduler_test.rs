use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use ripple_tally::codec::ActivityKey;
use ripple_tally::records::StatRecord;
use ripple_tally::scheduler::{ManualTicks, SchedulerState, TickOutcome};
use ripple_tally::sink::{MemoryStatSink, StatSink};
use ripple_tally::store::MemoryCounterStore;
use ripple_tally::types::{ActivityAction, ActivityFamily};
use ripple_tally::{Config, Pipeline, Result};
use tokio::sync::{Semaphore, oneshot};

/// Sink that blocks every persist until the test hands out a permit.
#[derive(Debug)]
struct GatedSink {
    inner: MemoryStatSink,
    gate: Semaphore,
}

impl GatedSink {
    fn new() -> Self {
        Self {
            inner: MemoryStatSink::new(),
            gate: Semaphore::new(0),
        }
    }
}

#[async_trait]
impl StatSink for GatedSink {
    async fn persist(&self, record: &StatRecord) -> Result<()> {
        let _permit = self.gate.acquire().await.map_err(|e| {
            ripple_tally::TallyError::Internal {
                message: e.to_string(),
            }
        })?;
        self.inner.persist(record).await
    }

    async fn add_post_views(&self, client: &str, entity: &str, views: i64) -> Result<bool> {
        self.inner.add_post_views(client, entity, views).await
    }
}

async fn wait_for<F: Fn() -> bool>(condition: F) {
    tokio::time::timeout(Duration::from_secs(5), async {
        while !condition() {
            tokio::time::sleep(Duration::from_millis(2)).await;
        }
    })
    .await
    .expect("condition not reached in time");
}

async fn record_like(pipeline: &Pipeline) {
    let key = ActivityKey::new(ActivityFamily::Likes, "CID1").unwrap();
    pipeline
        .recorder()
        .record_activity_hit(&key, ActivityAction::Added, None, None)
        .await
        .unwrap();
}

#[tokio::test]
async fn test_tick_during_running_drain_is_skipped() {
    let sink = Arc::new(GatedSink::new());
    let pipeline = Pipeline::new(
        Arc::new(Config::default()),
        Arc::new(MemoryCounterStore::new()),
        sink.clone(),
    );
    record_like(&pipeline).await;

    let first = {
        let pipeline = pipeline.clone();
        tokio::spawn(async move { pipeline.drain_now(Utc::now()).await })
    };

    let scheduler = pipeline.scheduler().clone();
    wait_for(|| scheduler.state() == SchedulerState::Running).await;

    assert_eq!(pipeline.drain_now(Utc::now()).await, TickOutcome::Skipped);
    assert_eq!(pipeline.metrics().snapshot().ticks_skipped, 1);

    sink.gate.add_permits(1);
    let outcome = first.await.unwrap();

    assert_eq!(outcome.report().unwrap().total.fields_drained, 1);
    assert_eq!(pipeline.scheduler().state(), SchedulerState::Idle);
    assert_eq!(sink.inner.len(), 1);
}

#[tokio::test]
async fn test_manual_ticks_drive_the_loop() {
    let sink = Arc::new(MemoryStatSink::new());
    let pipeline = Pipeline::new(
        Arc::new(Config::default()),
        Arc::new(MemoryCounterStore::new()),
        sink.clone(),
    );
    let (handle, ticks) = ManualTicks::channel();

    let runner = {
        let pipeline = pipeline.clone();
        tokio::spawn(async move {
            pipeline
                .scheduler()
                .run(ticks, std::future::pending::<()>())
                .await
        })
    };

    record_like(&pipeline).await;
    assert!(handle.tick(Utc.with_ymd_and_hms(2025, 3, 1, 9, 0, 0).unwrap()));
    let metrics = pipeline.metrics().clone();
    wait_for(|| metrics.snapshot().ticks_completed == 1).await;

    record_like(&pipeline).await;
    assert!(handle.tick(Utc.with_ymd_and_hms(2025, 3, 1, 9, 5, 0).unwrap()));
    wait_for(|| metrics.snapshot().ticks_completed == 2).await;

    drop(handle);
    let summary = runner.await.unwrap();

    assert_eq!(summary.started, 2);
    assert_eq!(summary.skipped, 0);
    assert_eq!(sink.len(), 2);
    assert_eq!(metrics.snapshot().fields_drained, 2);
}

#[tokio::test]
async fn test_run_loop_skips_overlapping_tick() {
    let sink = Arc::new(GatedSink::new());
    let pipeline = Pipeline::new(
        Arc::new(Config::default()),
        Arc::new(MemoryCounterStore::new()),
        sink.clone(),
    );
    record_like(&pipeline).await;
    let (handle, ticks) = ManualTicks::channel();

    let runner = {
        let pipeline = pipeline.clone();
        tokio::spawn(async move {
            pipeline
                .scheduler()
                .run(ticks, std::future::pending::<()>())
                .await
        })
    };

    let scheduler = pipeline.scheduler().clone();
    let metrics = pipeline.metrics().clone();

    assert!(handle.tick(Utc.with_ymd_and_hms(2025, 3, 1, 9, 0, 0).unwrap()));
    wait_for(|| scheduler.state() == SchedulerState::Running).await;

    // The first tick is parked on the sink gate
    assert!(handle.tick(Utc.with_ymd_and_hms(2025, 3, 1, 9, 5, 0).unwrap()));
    wait_for(|| metrics.snapshot().ticks_skipped == 1).await;

    sink.gate.add_permits(1);
    wait_for(|| metrics.snapshot().ticks_completed == 1).await;

    drop(handle);
    let summary = runner.await.unwrap();

    assert_eq!(summary.started, 1);
    assert_eq!(summary.skipped, 1);
    assert_eq!(sink.inner.len(), 1);
}

#[tokio::test]
async fn test_shutdown_waits_for_in_flight_tick() {
    let sink = Arc::new(GatedSink::new());
    let pipeline = Pipeline::new(
        Arc::new(Config::default()),
        Arc::new(MemoryCounterStore::new()),
        sink.clone(),
    );
    record_like(&pipeline).await;
    let (handle, ticks) = ManualTicks::channel();

    let (stop_tx, stop_rx) = oneshot::channel::<()>();
    let runner = {
        let pipeline = pipeline.clone();
        tokio::spawn(async move {
            pipeline
                .scheduler()
                .run(ticks, async {
                    let _ = stop_rx.await;
                })
                .await
        })
    };

    let scheduler = pipeline.scheduler().clone();
    assert!(handle.tick(Utc.with_ymd_and_hms(2025, 3, 1, 9, 0, 0).unwrap()));
    wait_for(|| scheduler.state() == SchedulerState::Running).await;

    stop_tx.send(()).unwrap();
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert!(!runner.is_finished());
    assert_eq!(pipeline.metrics().snapshot().ticks_completed, 0);

    sink.gate.add_permits(1);
    let summary = runner.await.unwrap();

    assert_eq!(summary.started, 1);
    assert_eq!(summary.skipped, 0);
    assert_eq!(pipeline.metrics().snapshot().ticks_completed, 1);
    assert_eq!(sink.inner.len(), 1);
    assert!(pipeline.store().keys("*").await.unwrap().is_empty());
}

#[tokio::test]
async fn test_interval_run_drains_leftovers_on_startup() {
    let sink = Arc::new(MemoryStatSink::new());
    let mut config = Config::default();
    config.drain.interval_secs = 3600;
    let pipeline = Pipeline::new(
        Arc::new(config),
        Arc::new(MemoryCounterStore::new()),
        sink.clone(),
    );
    record_like(&pipeline).await;

    let (stop_tx, stop_rx) = oneshot::channel::<()>();
    let runner = {
        let pipeline = pipeline.clone();
        tokio::spawn(async move {
            pipeline
                .run(async {
                    let _ = stop_rx.await;
                })
                .await
        })
    };

    // The interval fires once immediately on startup
    let metrics = pipeline.metrics().clone();
    wait_for(|| metrics.snapshot().ticks_completed == 1).await;

    stop_tx.send(()).unwrap();
    let summary = runner.await.unwrap();

    assert_eq!(summary.started, 1);
    assert_eq!(sink.len(), 1);
    assert!(pipeline.store().keys("*").await.unwrap().is_empty());
}
