use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(PostStat::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(PostStat::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(PostStat::Client).string().not_null())
                    .col(ColumnDef::new(PostStat::Entity).string().not_null())
                    .col(
                        ColumnDef::new(PostStat::LikesAdded)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(PostStat::LikesRemoved)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(PostStat::SharesAdded)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(PostStat::CommentsAdded)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(PostStat::RepliesAdded)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(PostStat::Timestamp)
                            .timestamp()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name(PostStatIndex::EntityTimestamp.to_string())
                    .table(PostStat::Table)
                    .col(PostStat::Client)
                    .col(PostStat::Entity)
                    .col(PostStat::Timestamp)
                    .take(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(PostStat::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
pub(crate) enum PostStat {
    #[sea_orm(iden = "post_stats")]
    Table,
    Id,
    Client,
    Entity,
    LikesAdded,
    LikesRemoved,
    SharesAdded,
    CommentsAdded,
    RepliesAdded,
    Timestamp,
}

#[derive(DeriveIden)]
pub(crate) enum PostStatIndex {
    #[sea_orm(iden = "idx_post_stats_entity_timestamp")]
    EntityTimestamp,
}
