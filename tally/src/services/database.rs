use std::time::Duration;

use async_trait::async_trait;
use migration::{Migrator, MigratorTrait};
use ripple_model::entities::{aggregate_stats, geo_post_stats, geo_stats, post_stats, posts};
use sea_orm::{ConnectOptions, Database, DatabaseConnection};

use crate::error::{Result, TallyError};
use crate::records::StatRecord;
use crate::sink::StatSink;

/// Database service for managing SeaORM connection and migrations
#[derive(Debug, Clone)]
pub struct DatabaseService {
    pub url: String,
    pub connection: DatabaseConnection,
}

impl DatabaseService {
    /// Create a new database service with the default pool size
    pub async fn new(database_url: &str) -> Result<Self> {
        Self::new_with_options(database_url, 20, 1).await
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Create a new database service with custom connection options
    pub async fn new_with_options(
        database_url: &str,
        max_connections: u32,
        min_connections: u32,
    ) -> Result<Self> {
        let mut opt = ConnectOptions::new(database_url.to_owned());

        opt.max_connections(max_connections)
            .min_connections(min_connections)
            .connect_timeout(Duration::from_secs(8))
            .idle_timeout(Duration::from_secs(8))
            .sqlx_logging(false);

        let connection = Database::connect(opt)
            .await
            .map_err(|e| TallyError::Database {
                message: format!("Failed to connect to database: {e}"),
                source: Some(Box::new(e)),
            })?;

        tracing::info!(
            "Database connected (max: {}, min: {})",
            max_connections,
            min_connections
        );

        Ok(DatabaseService {
            url: database_url.to_owned(),
            connection,
        })
    }

    /// Run migrations manually
    pub async fn migrate(&self) -> Result<()> {
        Migrator::up(&self.connection, None)
            .await
            .map_err(|e| TallyError::Database {
                message: format!("Failed to run migrations: {e}"),
                source: Some(Box::new(e)),
            })?;

        tracing::info!("Migrations completed successfully");
        Ok(())
    }

    /// Number of migrations not yet applied
    pub async fn pending_migrations(&self) -> Result<usize> {
        let pending = Migrator::get_pending_migrations(&self.connection)
            .await
            .map_err(|e| TallyError::Database {
                message: format!("Failed to read migration status: {e}"),
                source: Some(Box::new(e)),
            })?;

        Ok(pending.len())
    }

    /// Health check for database connection
    pub async fn health_check(&self) -> Result<bool> {
        self.connection
            .ping()
            .await
            .map_err(|e| TallyError::Database {
                message: format!("Failed to ping database: {e}"),
                source: Some(Box::new(e)),
            })?;

        Ok(true)
    }

    /// Registers a post so that drained views have a row to land on
    pub async fn ensure_post(&self, client: &str, entity: &str) -> Result<posts::Model> {
        let post = posts::Model::first_or_create(&self.connection, entity, client).await?;
        Ok(post)
    }
}

#[async_trait]
impl StatSink for DatabaseService {
    async fn persist(&self, record: &StatRecord) -> Result<()> {
        let db = &self.connection;
        let timestamp = record.timestamp().naive_utc();

        match record {
            StatRecord::Aggregate(stat) => {
                aggregate_stats::Model::accumulate(db, &stat.client, stat.counts.into(), timestamp)
                    .await?
            }
            StatRecord::Post(stat) => {
                post_stats::Model::accumulate(
                    db,
                    &stat.client,
                    &stat.entity,
                    stat.counts.into(),
                    timestamp,
                )
                .await?
            }
            StatRecord::Geo(stat) => {
                let dims = stat.geo.dimensions(stat.action.as_str());
                geo_stats::Model::accumulate(db, &stat.client, dims, stat.count, timestamp).await?
            }
            StatRecord::GeoPost(stat) => {
                let dims = stat.geo.dimensions(stat.action.as_str());
                geo_post_stats::Model::accumulate(
                    db,
                    &stat.client,
                    &stat.entity,
                    dims,
                    stat.count,
                    timestamp,
                )
                .await?
            }
        }

        Ok(())
    }

    async fn add_post_views(&self, client: &str, entity: &str, views: i64) -> Result<bool> {
        let found = posts::Model::add_views(&self.connection, client, entity, views).await?;
        Ok(found)
    }
}
