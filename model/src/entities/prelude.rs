pub use super::aggregate_stats::Entity as AggregateStats;
pub use super::geo_post_stats::Entity as GeoPostStats;
pub use super::geo_stats::Entity as GeoStats;
pub use super::post_stats::Entity as PostStats;
pub use super::posts::Entity as Posts;
