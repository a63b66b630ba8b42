//! Keyed counter store abstraction.
//!
//! The pipeline only relies on per-operation atomicity: each call below is a
//! single round-trip that either fully applies or fails. No operation holds a
//! lock across calls, so recorders never wait behind a drain.

pub mod memory;
pub mod pattern;

pub use memory::MemoryCounterStore;
pub use pattern::KeyPattern;

use std::time::Duration;

use async_trait::async_trait;

use crate::error::Result;

#[async_trait]
pub trait CounterStore: Send + Sync + std::fmt::Debug {
    /// Atomically adds `delta` to `field` in bucket `key`, creating both on
    /// first use. Returns the new value.
    async fn increment(&self, key: &str, field: &str, delta: i64) -> Result<i64>;

    /// Sets a time-to-live on an existing bucket. Returns `false` if the
    /// bucket does not exist.
    async fn expire(&self, key: &str, ttl: Duration) -> Result<bool>;

    /// Reads every `(field, count)` pair of a bucket.
    async fn read_all(&self, key: &str) -> Result<Vec<(String, i64)>>;

    /// Atomically subtracts `drained` from `field` and removes the field once
    /// it reaches zero. Returns what is left, which is non-zero only when
    /// increments arrived after the drained value was read.
    async fn settle(&self, key: &str, field: &str, drained: i64) -> Result<i64>;

    /// Removes the bucket only if it holds no fields.
    async fn remove_if_empty(&self, key: &str) -> Result<bool>;

    /// Lists bucket keys matching a glob pattern (`*` and `?`).
    async fn keys(&self, pattern: &str) -> Result<Vec<String>>;
}
