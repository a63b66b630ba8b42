//! Flush path: counter buckets into durable records.
//!
//! Each pass lists its buckets, reads every field, decodes and routes it,
//! persists the record and only then settles the field by the drained
//! amount. Increments that land between the read and the settle survive for
//! the next cycle. Fields that cannot be decoded are never deleted.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{debug, error, warn};

use crate::codec::bucket::{
    LIVE_ACTIVITY_PATTERN, LIVE_GEO_PATTERN, POST_VIEWS_PATTERN, TIMESTAMPED_ACTIVITY_PATTERN,
    TIMESTAMPED_GEO_PATTERN,
};
use crate::codec::{BucketKey, decode_geo_key, truncate_to_minute};
use crate::error::{Result, TallyError};
use crate::records::{ActivityCounts, GeoFields, StatRecord};
use crate::recorder::POST_VIEW_FIELD;
use crate::router::{Measurement, route};
use crate::services::DrainMetrics;
use crate::sink::StatSink;
use crate::store::CounterStore;
use crate::types::ActivityAction;

const POST_VIEWS_LABEL: &str = "post_views";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DrainPass {
    LiveGeo,
    LiveActivity,
    TimestampedGeo,
    TimestampedActivity,
}

impl DrainPass {
    /// Passes in the order a tick runs them.
    pub const ALL: [DrainPass; 4] = [
        DrainPass::LiveGeo,
        DrainPass::LiveActivity,
        DrainPass::TimestampedGeo,
        DrainPass::TimestampedActivity,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            DrainPass::LiveGeo => "live_geo",
            DrainPass::LiveActivity => "live_activity",
            DrainPass::TimestampedGeo => "timestamped_geo",
            DrainPass::TimestampedActivity => "timestamped_activity",
        }
    }

    pub fn pattern(&self) -> &'static str {
        match self {
            DrainPass::LiveGeo => LIVE_GEO_PATTERN,
            DrainPass::LiveActivity => LIVE_ACTIVITY_PATTERN,
            DrainPass::TimestampedGeo => TIMESTAMPED_GEO_PATTERN,
            DrainPass::TimestampedActivity => TIMESTAMPED_ACTIVITY_PATTERN,
        }
    }

    pub fn is_geo(&self) -> bool {
        matches!(self, DrainPass::LiveGeo | DrainPass::TimestampedGeo)
    }

    pub fn is_timestamped(&self) -> bool {
        matches!(
            self,
            DrainPass::TimestampedGeo | DrainPass::TimestampedActivity
        )
    }

    /// Live patterns also match the timestamped keys of the same family.
    fn accepts(&self, key: &str) -> bool {
        match self {
            DrainPass::LiveGeo => !key.starts_with(prefix(TIMESTAMPED_GEO_PATTERN)),
            DrainPass::LiveActivity => !key.starts_with(prefix(TIMESTAMPED_ACTIVITY_PATTERN)),
            DrainPass::TimestampedGeo | DrainPass::TimestampedActivity => true,
        }
    }
}

fn prefix(pattern: &str) -> &str {
    pattern.trim_end_matches('*')
}

/// Outcome of one pass over one family of buckets.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DrainReport {
    pub buckets: u64,
    pub fields_drained: u64,
    pub records_persisted: u64,
    pub zero_skipped: u64,
    pub dead_letters: u64,
    pub persist_failures: u64,
    pub store_failures: u64,
}

impl DrainReport {
    pub fn merge(&mut self, other: &DrainReport) {
        self.buckets += other.buckets;
        self.fields_drained += other.fields_drained;
        self.records_persisted += other.records_persisted;
        self.zero_skipped += other.zero_skipped;
        self.dead_letters += other.dead_letters;
        self.persist_failures += other.persist_failures;
        self.store_failures += other.store_failures;
    }

    pub fn is_clean(&self) -> bool {
        self.dead_letters == 0 && self.persist_failures == 0 && self.store_failures == 0
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PassReport {
    pub pass: &'static str,
    #[serde(flatten)]
    pub report: DrainReport,
}

/// Every pass of one tick, plus their sum.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TickReport {
    pub at: DateTime<Utc>,
    pub passes: Vec<PassReport>,
    pub total: DrainReport,
}

impl TickReport {
    pub fn new(at: DateTime<Utc>) -> Self {
        Self {
            at,
            passes: Vec::new(),
            total: DrainReport::default(),
        }
    }

    pub fn push(&mut self, pass: &'static str, report: DrainReport) {
        self.total.merge(&report);
        self.passes.push(PassReport { pass, report });
    }

    pub fn pass(&self, pass: &str) -> Option<&DrainReport> {
        self.passes
            .iter()
            .find(|p| p.pass == pass)
            .map(|p| &p.report)
    }
}

#[derive(Debug, Clone)]
pub struct Drainer {
    store: Arc<dyn CounterStore>,
    sink: Arc<dyn StatSink>,
    metrics: Arc<DrainMetrics>,
}

impl Drainer {
    pub fn new(
        store: Arc<dyn CounterStore>,
        sink: Arc<dyn StatSink>,
        metrics: Arc<DrainMetrics>,
    ) -> Self {
        Self {
            store,
            sink,
            metrics,
        }
    }

    /// Runs every pass in order, then the post view drain.
    pub async fn drain_all(&self, now: DateTime<Utc>) -> TickReport {
        let mut tick = TickReport::new(now);

        for pass in DrainPass::ALL {
            let report = self.drain_pass(pass, now).await;
            tick.push(pass.as_str(), report);
        }

        let report = self.drain_post_views().await;
        tick.push(POST_VIEWS_LABEL, report);

        tick
    }

    /// Drains every bucket of one pass. Live buckets are stamped with `now`
    /// truncated to the minute.
    pub async fn drain_pass(&self, pass: DrainPass, now: DateTime<Utc>) -> DrainReport {
        let mut report = DrainReport::default();
        let tick_minute = truncate_to_minute(now);

        let keys = match self.store.keys(pass.pattern()).await {
            Ok(keys) => keys,
            Err(e) => {
                error!(pass = pass.as_str(), "Failed to list buckets: {}", e);
                report.store_failures += 1;
                return report;
            }
        };

        for raw in keys.iter().filter(|key| pass.accepts(key)) {
            let bucket = match BucketKey::parse(raw).and_then(|b| check_pass(pass, raw, b)) {
                Ok(bucket) => bucket,
                Err(e) => {
                    self.dead_letter(pass.as_str(), raw, None, &e, &mut report);
                    continue;
                }
            };

            if let Err(e) = self
                .drain_bucket(pass, raw, &bucket, tick_minute, &mut report)
                .await
            {
                error!(pass = pass.as_str(), bucket = %raw, "Bucket drain aborted: {}", e);
                report.store_failures += 1;
            }
        }

        self.metrics
            .record_drained(pass.as_str(), report.fields_drained);
        report
    }

    async fn drain_bucket(
        &self,
        pass: DrainPass,
        raw: &str,
        bucket: &BucketKey,
        tick_minute: DateTime<Utc>,
        report: &mut DrainReport,
    ) -> Result<()> {
        let fields = self.store.read_all(raw).await?;
        let timestamp = bucket.minute().unwrap_or(tick_minute);
        report.buckets += 1;

        debug!(
            pass = pass.as_str(),
            bucket = %raw,
            fields = fields.len(),
            "Draining bucket"
        );

        for (field, count) in fields {
            let record = match decode_field(bucket, &field, count, timestamp) {
                Ok(record) => record,
                Err(e) => {
                    self.dead_letter(pass.as_str(), raw, Some(&field), &e, report);
                    continue;
                }
            };

            if record.is_zero() {
                self.store.settle(raw, &field, count).await?;
                report.zero_skipped += 1;
                continue;
            }

            if let Err(e) = self.sink.persist(&record).await {
                warn!(
                    pass = pass.as_str(),
                    bucket = %raw,
                    field = %field,
                    shape = %record.shape(),
                    "Persist failed, field retained: {}",
                    e
                );
                report.persist_failures += 1;
                self.metrics.record_persist_failure(pass.as_str());
                continue;
            }

            report.records_persisted += 1;
            self.store.settle(raw, &field, count).await?;
            report.fields_drained += 1;
        }

        self.store.remove_if_empty(raw).await?;
        Ok(())
    }

    /// Adds drained view counters onto their posts. A post that no longer
    /// exists still has its counter settled.
    pub async fn drain_post_views(&self) -> DrainReport {
        let mut report = DrainReport::default();

        let keys = match self.store.keys(POST_VIEWS_PATTERN).await {
            Ok(keys) => keys,
            Err(e) => {
                error!(pass = POST_VIEWS_LABEL, "Failed to list buckets: {}", e);
                report.store_failures += 1;
                return report;
            }
        };

        for raw in &keys {
            let (client, entity) = match BucketKey::parse(raw) {
                Ok(BucketKey::PostViews { client, entity }) => (client, entity),
                Ok(_) => {
                    let e = TallyError::decode(raw, "not a post view bucket");
                    self.dead_letter(POST_VIEWS_LABEL, raw, None, &e, &mut report);
                    continue;
                }
                Err(e) => {
                    self.dead_letter(POST_VIEWS_LABEL, raw, None, &e, &mut report);
                    continue;
                }
            };

            if let Err(e) = self
                .drain_post_view_bucket(raw, &client, &entity, &mut report)
                .await
            {
                error!(pass = POST_VIEWS_LABEL, bucket = %raw, "Bucket drain aborted: {}", e);
                report.store_failures += 1;
            }
        }

        self.metrics
            .record_drained(POST_VIEWS_LABEL, report.fields_drained);
        report
    }

    async fn drain_post_view_bucket(
        &self,
        raw: &str,
        client: &str,
        entity: &str,
        report: &mut DrainReport,
    ) -> Result<()> {
        let fields = self.store.read_all(raw).await?;
        report.buckets += 1;

        for (field, count) in fields {
            if field != POST_VIEW_FIELD || count < 0 {
                let e = TallyError::decode(&field, "unexpected post view field");
                self.dead_letter(POST_VIEWS_LABEL, raw, Some(&field), &e, report);
                continue;
            }

            if count == 0 {
                self.store.settle(raw, &field, 0).await?;
                report.zero_skipped += 1;
                continue;
            }

            match self.sink.add_post_views(client, entity, count).await {
                Ok(true) => report.records_persisted += 1,
                Ok(false) => {
                    warn!(client, entity, views = count, "Post not found, dropping views");
                }
                Err(e) => {
                    warn!(bucket = %raw, "Persist failed, field retained: {}", e);
                    report.persist_failures += 1;
                    self.metrics.record_persist_failure(POST_VIEWS_LABEL);
                    continue;
                }
            }

            self.store.settle(raw, &field, count).await?;
            report.fields_drained += 1;
        }

        self.store.remove_if_empty(raw).await?;
        Ok(())
    }

    fn dead_letter(
        &self,
        pass: &'static str,
        bucket: &str,
        field: Option<&str>,
        err: &TallyError,
        report: &mut DrainReport,
    ) {
        warn!(
            pass,
            bucket,
            field = field.unwrap_or_default(),
            "Retaining undecodable entry: {}",
            err
        );
        report.dead_letters += 1;
        self.metrics.record_dead_letter(pass);
    }
}

/// A key that parses but belongs to another pass is undecodable here.
fn check_pass(pass: DrainPass, raw: &str, bucket: BucketKey) -> Result<BucketKey> {
    let matches = match &bucket {
        BucketKey::Geo { .. } => pass.is_geo(),
        BucketKey::Activity { .. } => !pass.is_geo(),
        BucketKey::PostViews { .. } => false,
    };

    if !matches || bucket.is_timestamped() != pass.is_timestamped() {
        return Err(TallyError::decode(raw, "bucket does not belong to this pass"));
    }

    Ok(bucket)
}

/// Turns one `(field, count)` pair into the durable record it stands for.
fn decode_field(
    bucket: &BucketKey,
    field: &str,
    count: i64,
    timestamp: DateTime<Utc>,
) -> Result<StatRecord> {
    if count < 0 {
        return Err(TallyError::decode(field, format!("negative count {count}")));
    }

    match bucket {
        BucketKey::Geo { action, .. } => {
            let dims = decode_geo_key(field)?;
            let measurement = Measurement::Geo {
                action: *action,
                geo: GeoFields::from(&dims),
                count,
            };
            Ok(route(&dims.client, dims.entity(), measurement, timestamp))
        }
        BucketKey::Activity {
            family,
            client,
            entity,
            ..
        } => {
            let action: ActivityAction = field.parse()?;
            let counts = ActivityCounts::from_field(*family, action, count);
            Ok(route(
                client,
                entity.as_deref(),
                Measurement::Activity(counts),
                timestamp,
            ))
        }
        BucketKey::PostViews { .. } => Err(TallyError::decode(field, "post view field")),
    }
}
