pub mod database;
pub mod metrics;

pub use database::DatabaseService;
pub use metrics::{DrainMetrics, MetricsSnapshot};
