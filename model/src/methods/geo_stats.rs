use chrono::NaiveDateTime;
use sea_orm::prelude::*;
use sea_orm::sea_query::{Expr, SimpleExpr};
use sea_orm::{IntoActiveModel, Select};

use super::{GeoDimensions, require};
use crate::entities::{geo_post_stats, geo_stats};
use crate::{Error, Result};

fn eq_or_null<C: ColumnTrait>(column: C, value: Option<f64>) -> SimpleExpr {
    match value {
        Some(value) => column.eq(value),
        None => column.is_null(),
    }
}

fn validate(client: &str, dims: &GeoDimensions<'_>, count: i64) -> Result<()> {
    require("client", client)?;
    require("action", dims.action)?;

    if count < 0 {
        return Err(Error::invalid("count", "Count must be non-negative"));
    }

    Ok(())
}

fn filter_geo_stats(
    query: Select<geo_stats::Entity>,
    client: &str,
    dims: &GeoDimensions<'_>,
    timestamp: NaiveDateTime,
) -> Select<geo_stats::Entity> {
    query
        .filter(geo_stats::Column::Client.eq(client))
        .filter(geo_stats::Column::Action.eq(dims.action))
        .filter(geo_stats::Column::Ip.eq(dims.ip))
        .filter(geo_stats::Column::Country.eq(dims.country))
        .filter(geo_stats::Column::CountryCode.eq(dims.country_code))
        .filter(geo_stats::Column::Region.eq(dims.region))
        .filter(geo_stats::Column::RegionCode.eq(dims.region_code))
        .filter(geo_stats::Column::City.eq(dims.city))
        .filter(eq_or_null(geo_stats::Column::Latitude, dims.latitude))
        .filter(eq_or_null(geo_stats::Column::Longitude, dims.longitude))
        .filter(geo_stats::Column::Timestamp.eq(timestamp))
}

impl geo_stats::Model {
    /// Adds `count` to the row matching every dimension and the minute,
    /// inserting it when absent.
    #[tracing::instrument(skip(db))]
    pub async fn accumulate(
        db: &impl ConnectionTrait,
        client: &str,
        dims: GeoDimensions<'_>,
        count: i64,
        timestamp: NaiveDateTime,
    ) -> Result<()> {
        validate(client, &dims, count)?;

        let existing = filter_geo_stats(geo_stats::Entity::find(), client, &dims, timestamp)
            .one(db)
            .await?;

        if let Some(row) = existing {
            geo_stats::Entity::update_many()
                .col_expr(
                    geo_stats::Column::Count,
                    Expr::col(geo_stats::Column::Count).add(count),
                )
                .filter(geo_stats::Column::Id.eq(row.id))
                .exec(db)
                .await?;

            return Ok(());
        }

        geo_stats::Model {
            id: Uuid::new_v4(),
            client: client.to_string(),
            action: dims.action.to_string(),
            ip: dims.ip.to_string(),
            country: dims.country.to_string(),
            country_code: dims.country_code.to_string(),
            region: dims.region.to_string(),
            region_code: dims.region_code.to_string(),
            city: dims.city.to_string(),
            latitude: dims.latitude,
            longitude: dims.longitude,
            count,
            timestamp,
        }
        .into_active_model()
        .insert(db)
        .await?;

        Ok(())
    }

    pub async fn find_for_client(
        db: &impl ConnectionTrait,
        client: &str,
    ) -> Result<Vec<geo_stats::Model>> {
        let rows = geo_stats::Entity::find()
            .filter(geo_stats::Column::Client.eq(client))
            .all(db)
            .await?;

        Ok(rows)
    }
}

impl geo_post_stats::Model {
    /// Same as [`geo_stats::Model::accumulate`], scoped to one entity.
    #[tracing::instrument(skip(db))]
    pub async fn accumulate(
        db: &impl ConnectionTrait,
        client: &str,
        entity: &str,
        dims: GeoDimensions<'_>,
        count: i64,
        timestamp: NaiveDateTime,
    ) -> Result<()> {
        validate(client, &dims, count)?;
        require("entity", entity)?;

        let existing = geo_post_stats::Entity::find()
            .filter(geo_post_stats::Column::Client.eq(client))
            .filter(geo_post_stats::Column::Entity.eq(entity))
            .filter(geo_post_stats::Column::Action.eq(dims.action))
            .filter(geo_post_stats::Column::Ip.eq(dims.ip))
            .filter(geo_post_stats::Column::Country.eq(dims.country))
            .filter(geo_post_stats::Column::CountryCode.eq(dims.country_code))
            .filter(geo_post_stats::Column::Region.eq(dims.region))
            .filter(geo_post_stats::Column::RegionCode.eq(dims.region_code))
            .filter(geo_post_stats::Column::City.eq(dims.city))
            .filter(eq_or_null(geo_post_stats::Column::Latitude, dims.latitude))
            .filter(eq_or_null(geo_post_stats::Column::Longitude, dims.longitude))
            .filter(geo_post_stats::Column::Timestamp.eq(timestamp))
            .one(db)
            .await?;

        if let Some(row) = existing {
            geo_post_stats::Entity::update_many()
                .col_expr(
                    geo_post_stats::Column::Count,
                    Expr::col(geo_post_stats::Column::Count).add(count),
                )
                .filter(geo_post_stats::Column::Id.eq(row.id))
                .exec(db)
                .await?;

            return Ok(());
        }

        geo_post_stats::Model {
            id: Uuid::new_v4(),
            client: client.to_string(),
            entity: entity.to_string(),
            action: dims.action.to_string(),
            ip: dims.ip.to_string(),
            country: dims.country.to_string(),
            country_code: dims.country_code.to_string(),
            region: dims.region.to_string(),
            region_code: dims.region_code.to_string(),
            city: dims.city.to_string(),
            latitude: dims.latitude,
            longitude: dims.longitude,
            count,
            timestamp,
        }
        .into_active_model()
        .insert(db)
        .await?;

        Ok(())
    }

    pub async fn find_for_entity(
        db: &impl ConnectionTrait,
        client: &str,
        entity: &str,
    ) -> Result<Vec<geo_post_stats::Model>> {
        let rows = geo_post_stats::Entity::find()
            .filter(geo_post_stats::Column::Client.eq(client))
            .filter(geo_post_stats::Column::Entity.eq(entity))
            .all(db)
            .await?;

        Ok(rows)
    }
}
