pub use sea_orm_migration::prelude::*;

mod m20250301_000001_create_aggregate_stats_table;
mod m20250301_000002_create_post_stats_table;
mod m20250301_000003_create_geo_stats_table;
mod m20250301_000004_create_geo_post_stats_table;
mod m20250301_000005_create_posts_table;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20250301_000001_create_aggregate_stats_table::Migration),
            Box::new(m20250301_000002_create_post_stats_table::Migration),
            Box::new(m20250301_000003_create_geo_stats_table::Migration),
            Box::new(m20250301_000004_create_geo_post_stats_table::Migration),
            Box::new(m20250301_000005_create_posts_table::Migration),
        ]
    }
}
