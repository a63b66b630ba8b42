//! # Ripple Tally
//!
//! Write-buffered interaction counters for a social content platform:
//! - Likes, shares, comments, replies and geo-tagged hits are counted in a
//!   fast keyed counter store with one atomic increment per event
//! - A scheduler drains the counters every few minutes into accumulating
//!   time-series tables through SeaORM
//! - Historical events can be backdated into UTC-minute buckets
//!
//! ## Architecture
//!
//! - **Codec**: bucket keys, the escaped geo dimension key and minute tokens
//! - **Store**: the [`store::CounterStore`] seam and its in-process implementation
//! - **Recorder**: the ingestion entry point called by request handlers
//! - **Drainer**: read, decode, route, persist, then settle each field
//! - **Scheduler**: guarded periodic ticks from an injectable tick source
//! - **Sink**: the durable side, backed by [`services::DatabaseService`]
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//!
//! use ripple_tally::{Config, Pipeline};
//! use ripple_tally::recorder::GeoContext;
//! use ripple_tally::services::DatabaseService;
//! use ripple_tally::types::GeoAction;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let database = DatabaseService::new("sqlite::memory:").await?;
//!     database.migrate().await?;
//!
//!     let pipeline = Pipeline::from_config(Arc::new(Config::default()), Arc::new(database))?;
//!
//!     let ctx = GeoContext {
//!         client: "CID1".to_string(),
//!         country: Some("Spain".to_string()),
//!         ..Default::default()
//!     };
//!     pipeline
//!         .recorder()
//!         .record_geo_hit(&ctx, GeoAction::Hit, Some("POST1"), None)
//!         .await?;
//!
//!     pipeline.drain_now(chrono::Utc::now()).await;
//!     Ok(())
//! }
//! ```

/// Command-line interface for the tally service
pub mod cli;

/// Key encoding for counter buckets and geo fields
pub mod codec;

/// TOML configuration with environment overrides
pub mod config;

/// Flush path from counter buckets to durable records
pub mod drainer;

/// Typed errors for the recording and drain pipeline
pub mod error;

/// Central coordinator for all subsystems
pub mod pipeline;

/// Ingestion entry point
pub mod recorder;

/// Durable record shapes
pub mod records;

/// Mapping from drained fields to record shapes
pub mod router;

/// Periodic drain driver and tick sources
pub mod scheduler;

/// Service layer: database and metrics
pub mod services;

/// Durable record sink seam
pub mod sink;

/// Keyed counter store seam and implementations
pub mod store;

/// Actions, families and scopes shared across modules
pub mod types;

pub use config::Config;
pub use error::{ConfigError, Result, TallyError};
pub use pipeline::Pipeline;
