use sea_orm::entity::prelude::*;

/// Per-entity activity totals for one UTC minute.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "post_stats")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub client: String,
    pub entity: String,
    pub likes_added: i64,
    pub likes_removed: i64,
    pub shares_added: i64,
    pub comments_added: i64,
    pub replies_added: i64,
    pub timestamp: DateTime,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
