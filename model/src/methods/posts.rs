use chrono::Utc;
use sea_orm::IntoActiveModel;
use sea_orm::prelude::*;
use sea_orm::sea_query::Expr;

use super::require;
use crate::entities::posts;
use crate::{Error, Result};

impl posts::Model {
    pub async fn first_or_create(
        db: &impl ConnectionTrait,
        id: &str,
        client: &str,
    ) -> Result<posts::Model> {
        require("id", id)?;
        require("client", client)?;

        let exists = posts::Entity::find_by_id(id.to_string()).one(db).await?;

        match exists {
            Some(post) => Ok(post),
            None => {
                let post = posts::Model {
                    id: id.to_string(),
                    client: client.to_string(),
                    views_count: 0,
                    created_at: Utc::now().naive_utc(),
                };

                post.into_active_model()
                    .insert(db)
                    .await
                    .map_err(Error::from)
            }
        }
    }

    /// Increments `views_count` in place. Returns `false` when no such post exists.
    #[tracing::instrument(skip(db))]
    pub async fn add_views(
        db: &impl ConnectionTrait,
        client: &str,
        id: &str,
        views: i64,
    ) -> Result<bool> {
        if views < 0 {
            return Err(Error::invalid("views", "Views must be non-negative"));
        }

        let result = posts::Entity::update_many()
            .col_expr(
                posts::Column::ViewsCount,
                Expr::col(posts::Column::ViewsCount).add(views),
            )
            .filter(posts::Column::Id.eq(id))
            .filter(posts::Column::Client.eq(client))
            .exec(db)
            .await?;

        Ok(result.rows_affected > 0)
    }
}
