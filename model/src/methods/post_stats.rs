use chrono::NaiveDateTime;
use sea_orm::IntoActiveModel;
use sea_orm::prelude::*;
use sea_orm::sea_query::Expr;

use super::{ActivityDelta, require};
use crate::Result;
use crate::entities::post_stats;

impl post_stats::Model {
    /// Adds `delta` to the row for `(client, entity, timestamp)`, inserting it when absent.
    #[tracing::instrument(skip(db))]
    pub async fn accumulate(
        db: &impl ConnectionTrait,
        client: &str,
        entity: &str,
        delta: ActivityDelta,
        timestamp: NaiveDateTime,
    ) -> Result<()> {
        require("client", client)?;
        require("entity", entity)?;
        delta.validate()?;

        let updated = post_stats::Entity::update_many()
            .col_expr(
                post_stats::Column::LikesAdded,
                Expr::col(post_stats::Column::LikesAdded).add(delta.likes_added),
            )
            .col_expr(
                post_stats::Column::LikesRemoved,
                Expr::col(post_stats::Column::LikesRemoved).add(delta.likes_removed),
            )
            .col_expr(
                post_stats::Column::SharesAdded,
                Expr::col(post_stats::Column::SharesAdded).add(delta.shares_added),
            )
            .col_expr(
                post_stats::Column::CommentsAdded,
                Expr::col(post_stats::Column::CommentsAdded).add(delta.comments_added),
            )
            .col_expr(
                post_stats::Column::RepliesAdded,
                Expr::col(post_stats::Column::RepliesAdded).add(delta.replies_added),
            )
            .filter(post_stats::Column::Client.eq(client))
            .filter(post_stats::Column::Entity.eq(entity))
            .filter(post_stats::Column::Timestamp.eq(timestamp))
            .exec(db)
            .await?;

        if updated.rows_affected > 0 {
            return Ok(());
        }

        post_stats::Model {
            id: Uuid::new_v4(),
            client: client.to_string(),
            entity: entity.to_string(),
            likes_added: delta.likes_added,
            likes_removed: delta.likes_removed,
            shares_added: delta.shares_added,
            comments_added: delta.comments_added,
            replies_added: delta.replies_added,
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
    ) -> Result<Vec<post_stats::Model>> {
        let rows = post_stats::Entity::find()
            .filter(post_stats::Column::Client.eq(client))
            .filter(post_stats::Column::Entity.eq(entity))
            .all(db)
            .await?;

        Ok(rows)
    }
}
