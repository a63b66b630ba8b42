use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use dashmap::DashMap;

use super::StatSink;
use crate::error::{Result, TallyError};
use crate::records::{ActivityCounts, StatRecord};

/// In-process sink used by tests and by `drain` runs without a database.
#[derive(Debug, Default)]
pub struct MemoryStatSink {
    rows: DashMap<String, StatRecord>,
    posts: DashMap<(String, String), i64>,
    failures_pending: AtomicUsize,
}

impl MemoryStatSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes the next `count` calls to [`StatSink::persist`] fail.
    pub fn fail_next(&self, count: usize) {
        self.failures_pending.store(count, Ordering::SeqCst);
    }

    pub fn register_post(&self, client: &str, entity: &str) {
        self.posts
            .entry((client.to_string(), entity.to_string()))
            .or_insert(0);
    }

    pub fn post_views(&self, client: &str, entity: &str) -> Option<i64> {
        self.posts
            .get(&(client.to_string(), entity.to_string()))
            .map(|views| *views)
    }

    /// Every stored row, in identity order.
    pub fn records(&self) -> Vec<StatRecord> {
        let mut rows: Vec<(String, StatRecord)> = self
            .rows
            .iter()
            .map(|entry| (entry.key().clone(), entry.value().clone()))
            .collect();
        rows.sort_by(|a, b| a.0.cmp(&b.0));
        rows.into_iter().map(|(_, record)| record).collect()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    fn take_failure(&self) -> bool {
        self.failures_pending
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |pending| {
                pending.checked_sub(1)
            })
            .is_ok()
    }
}

/// Row identity: shape, identity fields and timestamp, never the counts.
fn identity(record: &StatRecord) -> String {
    let shape = record.shape();
    let timestamp = record.timestamp().timestamp();

    match record {
        StatRecord::Aggregate(r) => format!("{shape}|{}|{timestamp}", r.client),
        StatRecord::Post(r) => format!("{shape}|{}|{}|{timestamp}", r.client, r.entity),
        StatRecord::Geo(r) => format!(
            "{shape}|{}|{}|{:?}|{timestamp}",
            r.client, r.action, r.geo
        ),
        StatRecord::GeoPost(r) => format!(
            "{shape}|{}|{}|{}|{:?}|{timestamp}",
            r.client, r.entity, r.action, r.geo
        ),
    }
}

fn absorb(stored: &mut StatRecord, incoming: &StatRecord) {
    match (stored, incoming) {
        (StatRecord::Aggregate(a), StatRecord::Aggregate(b)) => add_counts(&mut a.counts, &b.counts),
        (StatRecord::Post(a), StatRecord::Post(b)) => add_counts(&mut a.counts, &b.counts),
        (StatRecord::Geo(a), StatRecord::Geo(b)) => a.count += b.count,
        (StatRecord::GeoPost(a), StatRecord::GeoPost(b)) => a.count += b.count,
        _ => {}
    }
}

fn add_counts(a: &mut ActivityCounts, b: &ActivityCounts) {
    a.likes_added += b.likes_added;
    a.likes_removed += b.likes_removed;
    a.shares_added += b.shares_added;
    a.comments_added += b.comments_added;
    a.replies_added += b.replies_added;
}

#[async_trait]
impl StatSink for MemoryStatSink {
    async fn persist(&self, record: &StatRecord) -> Result<()> {
        if self.take_failure() {
            return Err(TallyError::Database {
                message: "injected persist failure".to_string(),
                source: None,
            });
        }

        self.rows
            .entry(identity(record))
            .and_modify(|stored| absorb(stored, record))
            .or_insert_with(|| record.clone());

        Ok(())
    }

    async fn add_post_views(&self, client: &str, entity: &str, views: i64) -> Result<bool> {
        match self.posts.get_mut(&(client.to_string(), entity.to_string())) {
            Some(mut total) => {
                *total += views;
                Ok(true)
            }
            None => Ok(false),
        }
    }
}
