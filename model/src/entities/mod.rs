pub mod prelude;

pub mod aggregate_stats;
pub mod geo_post_stats;
pub mod geo_stats;
pub mod post_stats;
pub mod posts;
