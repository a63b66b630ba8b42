//! Ingestion entry point.
//!
//! Every call performs exactly one atomic increment against the counter
//! store. Nothing here reads counters or touches durable storage, so
//! recording never waits behind a drain.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tracing::{trace, warn};

use crate::codec::{
    ActivityKey, BucketKey, DimensionTuple, check_bucket_time, encode_geo_key, validate_identifier,
};
use crate::error::Result;
use crate::services::DrainMetrics;
use crate::store::CounterStore;
use crate::types::{ActivityAction, GeoAction, Scope};

/// Field name of the single counter inside a post view bucket.
pub const POST_VIEW_FIELD: &str = "count";

/// Request context resolved by the caller before recording a geo hit.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GeoContext {
    pub client: String,
    pub ip: Option<String>,
    pub country: Option<String>,
    pub country_code: Option<String>,
    pub region: Option<String>,
    pub region_code: Option<String>,
    pub city: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
}

impl GeoContext {
    fn dimensions(&self, scope: Scope) -> DimensionTuple {
        DimensionTuple {
            client: self.client.clone(),
            scope,
            ip: self.ip.clone(),
            country: self.country.clone(),
            country_code: self.country_code.clone(),
            region: self.region.clone(),
            region_code: self.region_code.clone(),
            city: self.city.clone(),
            latitude: self.latitude,
            longitude: self.longitude,
        }
        .normalized()
    }
}

#[derive(Debug, Clone)]
pub struct EventRecorder {
    store: Arc<dyn CounterStore>,
    metrics: Arc<DrainMetrics>,
    post_view_ttl: Duration,
}

impl EventRecorder {
    pub fn new(
        store: Arc<dyn CounterStore>,
        metrics: Arc<DrainMetrics>,
        post_view_ttl: Duration,
    ) -> Self {
        Self {
            store,
            metrics,
            post_view_ttl,
        }
    }

    /// Counts one geo-tagged event. Returns `false` without touching the
    /// store when the country could not be resolved.
    pub async fn record_geo_hit(
        &self,
        ctx: &GeoContext,
        action: GeoAction,
        entity: Option<&str>,
        at: Option<DateTime<Utc>>,
    ) -> Result<bool> {
        validate_identifier("client", &ctx.client)?;
        if let Some(entity) = entity {
            validate_identifier("entity", entity)?;
        }
        if let Some(at) = at {
            check_bucket_time(at)?;
        }

        let dims = ctx.dimensions(Scope::from_entity(entity));
        if dims.country.is_none() {
            trace!(client = %ctx.client, %action, "Skipping geo hit without country");
            return Ok(false);
        }

        let key = BucketKey::geo(action, at).to_string();
        let field = encode_geo_key(&dims);

        self.store.increment(&key, &field, 1).await?;
        self.metrics.record_hit("geo");

        Ok(true)
    }

    /// Counts one `added` or `removed` event for an activity family.
    pub async fn record_activity_hit(
        &self,
        key: &ActivityKey,
        action: ActivityAction,
        entity: Option<&str>,
        at: Option<DateTime<Utc>>,
    ) -> Result<()> {
        validate_identifier("client", &key.client)?;
        if let Some(entity) = entity {
            validate_identifier("entity", entity)?;
        }
        if let Some(at) = at {
            check_bucket_time(at)?;
        }

        let bucket = BucketKey::activity(key, entity, at).to_string();

        self.store.increment(&bucket, action.as_str(), 1).await?;
        self.metrics.record_hit("activity");

        Ok(())
    }

    /// Counts one view of a post and pushes its bucket's expiry forward.
    ///
    /// Once the increment has landed the call succeeds, so a caller retrying
    /// on `Err` never counts the same view twice. A failed expiry only leaves
    /// the bucket on its previous deadline.
    pub async fn record_post_view(&self, client: &str, entity: &str) -> Result<()> {
        validate_identifier("client", client)?;
        validate_identifier("entity", entity)?;

        let bucket = BucketKey::post_views(client, entity).to_string();

        self.store.increment(&bucket, POST_VIEW_FIELD, 1).await?;
        self.metrics.record_hit("post_view");

        if let Err(e) = self.store.expire(&bucket, self.post_view_ttl).await {
            warn!(%bucket, error = %e, "Failed to refresh post view expiry");
        }

        Ok(())
    }
}
