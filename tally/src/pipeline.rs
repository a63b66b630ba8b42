use std::future::Future;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::info;

use crate::config::Config;
use crate::drainer::Drainer;
use crate::error::{ConfigError, Result};
use crate::recorder::EventRecorder;
use crate::scheduler::{DrainScheduler, IntervalTicks, RunSummary, TickOutcome};
use crate::services::DrainMetrics;
use crate::sink::StatSink;
use crate::store::{CounterStore, MemoryCounterStore};

/// Central coordinator wiring the counter store, recorder, drainer and
/// scheduler around one durable sink.
#[derive(Debug, Clone)]
pub struct Pipeline {
    config: Arc<Config>,
    store: Arc<dyn CounterStore>,
    metrics: Arc<DrainMetrics>,
    recorder: EventRecorder,
    drainer: Arc<Drainer>,
    scheduler: DrainScheduler,
}

impl Pipeline {
    pub fn new(
        config: Arc<Config>,
        store: Arc<dyn CounterStore>,
        sink: Arc<dyn StatSink>,
    ) -> Self {
        let metrics = Arc::new(DrainMetrics::new());
        let recorder = EventRecorder::new(
            store.clone(),
            metrics.clone(),
            config.drain.post_view_ttl(),
        );
        let drainer = Arc::new(Drainer::new(store.clone(), sink, metrics.clone()));
        let scheduler = DrainScheduler::new(drainer.clone(), metrics.clone());

        Self {
            config,
            store,
            metrics,
            recorder,
            drainer,
            scheduler,
        }
    }

    /// Builds the pipeline with the counter store named in the config.
    pub fn from_config(config: Arc<Config>, sink: Arc<dyn StatSink>) -> Result<Self> {
        let store = counter_store(&config)?;
        Ok(Self::new(config, store, sink))
    }

    pub fn config(&self) -> &Arc<Config> {
        &self.config
    }

    pub fn store(&self) -> &Arc<dyn CounterStore> {
        &self.store
    }

    pub fn metrics(&self) -> &Arc<DrainMetrics> {
        &self.metrics
    }

    pub fn recorder(&self) -> &EventRecorder {
        &self.recorder
    }

    pub fn drainer(&self) -> &Arc<Drainer> {
        &self.drainer
    }

    pub fn scheduler(&self) -> &DrainScheduler {
        &self.scheduler
    }

    /// Runs a single guarded tick right away.
    pub async fn drain_now(&self, now: DateTime<Utc>) -> TickOutcome {
        self.scheduler.run_once(now).await
    }

    /// Drains on the configured interval until `shutdown` resolves.
    pub async fn run<F>(&self, shutdown: F) -> RunSummary
    where
        F: Future<Output = ()>,
    {
        let interval = self.config.drain.interval();
        info!(interval_secs = interval.as_secs(), "Starting drain loop");

        self.scheduler
            .run(IntervalTicks::new(interval), shutdown)
            .await
    }
}

fn counter_store(config: &Config) -> Result<Arc<dyn CounterStore>> {
    match config.counter_store.url.trim() {
        "memory://" => Ok(Arc::new(MemoryCounterStore::new())),
        other => Err(ConfigError::UnsupportedCounterStore {
            url: other.to_string(),
        }
        .into()),
    }
}
