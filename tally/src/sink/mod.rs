//! Durable record sink.
//!
//! [`StatSink::persist`] accumulates: persisting a record whose identity and
//! timestamp already exist adds its counts to the stored row.

pub mod memory;

pub use memory::MemoryStatSink;

use async_trait::async_trait;

use crate::error::Result;
use crate::records::StatRecord;

#[async_trait]
pub trait StatSink: Send + Sync + std::fmt::Debug {
    async fn persist(&self, record: &StatRecord) -> Result<()>;

    /// Adds drained views to an existing post. Returns `false` if the post is
    /// unknown.
    async fn add_post_views(&self, client: &str, entity: &str, views: i64) -> Result<bool>;
}
