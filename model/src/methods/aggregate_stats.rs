use chrono::NaiveDateTime;
use sea_orm::IntoActiveModel;
use sea_orm::prelude::*;
use sea_orm::sea_query::Expr;

use super::{ActivityDelta, require};
use crate::Result;
use crate::entities::aggregate_stats;

impl aggregate_stats::Model {
    /// Adds `delta` to the row for `(client, timestamp)`, inserting it when absent.
    #[tracing::instrument(skip(db))]
    pub async fn accumulate(
        db: &impl ConnectionTrait,
        client: &str,
        delta: ActivityDelta,
        timestamp: NaiveDateTime,
    ) -> Result<()> {
        require("client", client)?;
        delta.validate()?;

        let updated = aggregate_stats::Entity::update_many()
            .col_expr(
                aggregate_stats::Column::LikesAdded,
                Expr::col(aggregate_stats::Column::LikesAdded).add(delta.likes_added),
            )
            .col_expr(
                aggregate_stats::Column::LikesRemoved,
                Expr::col(aggregate_stats::Column::LikesRemoved).add(delta.likes_removed),
            )
            .col_expr(
                aggregate_stats::Column::SharesAdded,
                Expr::col(aggregate_stats::Column::SharesAdded).add(delta.shares_added),
            )
            .col_expr(
                aggregate_stats::Column::CommentsAdded,
                Expr::col(aggregate_stats::Column::CommentsAdded).add(delta.comments_added),
            )
            .col_expr(
                aggregate_stats::Column::RepliesAdded,
                Expr::col(aggregate_stats::Column::RepliesAdded).add(delta.replies_added),
            )
            .filter(aggregate_stats::Column::Client.eq(client))
            .filter(aggregate_stats::Column::Timestamp.eq(timestamp))
            .exec(db)
            .await?;

        if updated.rows_affected > 0 {
            return Ok(());
        }

        aggregate_stats::Model {
            id: Uuid::new_v4(),
            client: client.to_string(),
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

    pub async fn find_for_client(
        db: &impl ConnectionTrait,
        client: &str,
    ) -> Result<Vec<aggregate_stats::Model>> {
        let rows = aggregate_stats::Entity::find()
            .filter(aggregate_stats::Column::Client.eq(client))
            .all(db)
            .await?;

        Ok(rows)
    }
}
