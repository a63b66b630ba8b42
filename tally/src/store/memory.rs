use std::collections::HashMap;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use dashmap::DashMap;
use tracing::{debug, warn};

use super::{CounterStore, KeyPattern};
use crate::error::Result;

#[derive(Debug, Default)]
struct Bucket {
    fields: HashMap<String, i64>,
    expires_at: Option<Instant>,
}

impl Bucket {
    fn is_expired(&self) -> bool {
        self.expires_at
            .map(|deadline| Instant::now() >= deadline)
            .unwrap_or(false)
    }
}

/// In-process counter store backed by a sharded concurrent map.
///
/// Every operation holds a single shard lock for its own duration, which
/// gives the per-field atomicity the recorder and drainer rely on.
/// Expired buckets are dropped lazily on access.
#[derive(Debug, Default)]
pub struct MemoryCounterStore {
    buckets: DashMap<String, Bucket>,
}

impl MemoryCounterStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.buckets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buckets.is_empty()
    }
}

#[async_trait]
impl CounterStore for MemoryCounterStore {
    async fn increment(&self, key: &str, field: &str, delta: i64) -> Result<i64> {
        let mut bucket = self.buckets.entry(key.to_string()).or_default();
        if bucket.is_expired() {
            *bucket = Bucket::default();
        }

        let value = bucket.fields.entry(field.to_string()).or_insert(0);
        *value += delta;
        Ok(*value)
    }

    async fn expire(&self, key: &str, ttl: Duration) -> Result<bool> {
        match self.buckets.get_mut(key) {
            Some(mut bucket) => {
                bucket.expires_at = Some(Instant::now() + ttl);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn read_all(&self, key: &str) -> Result<Vec<(String, i64)>> {
        let expired = match self.buckets.get(key) {
            Some(bucket) if !bucket.is_expired() => {
                let mut fields: Vec<(String, i64)> = bucket
                    .fields
                    .iter()
                    .map(|(field, count)| (field.clone(), *count))
                    .collect();
                fields.sort();
                return Ok(fields);
            }
            Some(_) => true,
            None => false,
        };

        if expired {
            self.buckets.remove_if(key, |_, bucket| bucket.is_expired());
        }

        Ok(Vec::new())
    }

    async fn settle(&self, key: &str, field: &str, drained: i64) -> Result<i64> {
        let remaining = {
            let Some(mut bucket) = self.buckets.get_mut(key) else {
                return Ok(0);
            };

            let Some(value) = bucket.fields.get_mut(field) else {
                return Ok(0);
            };

            *value -= drained;
            let remaining = *value;

            if remaining <= 0 {
                if remaining < 0 {
                    warn!(key, field, remaining, "Settled more than was recorded");
                }
                bucket.fields.remove(field);
            }

            remaining.max(0)
        };

        self.buckets.remove_if(key, |_, bucket| bucket.fields.is_empty());
        Ok(remaining)
    }

    async fn remove_if_empty(&self, key: &str) -> Result<bool> {
        Ok(self
            .buckets
            .remove_if(key, |_, bucket| bucket.fields.is_empty())
            .is_some())
    }

    async fn keys(&self, pattern: &str) -> Result<Vec<String>> {
        let pattern = KeyPattern::new(pattern)?;

        let before = self.buckets.len();
        self.buckets.retain(|_, bucket| !bucket.is_expired());
        let purged = before.saturating_sub(self.buckets.len());
        if purged > 0 {
            debug!(purged, "Dropped expired counter buckets");
        }

        let mut keys: Vec<String> = self
            .buckets
            .iter()
            .filter(|entry| pattern.matches(entry.key()))
            .map(|entry| entry.key().clone())
            .collect();
        keys.sort();
        Ok(keys)
    }
}
