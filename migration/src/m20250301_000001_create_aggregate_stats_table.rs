use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(AggregateStat::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(AggregateStat::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(AggregateStat::Client).string().not_null())
                    .col(
                        ColumnDef::new(AggregateStat::LikesAdded)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(AggregateStat::LikesRemoved)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(AggregateStat::SharesAdded)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(AggregateStat::CommentsAdded)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(AggregateStat::RepliesAdded)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(AggregateStat::Timestamp)
                            .timestamp()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name(AggregateStatIndex::ClientTimestamp.to_string())
                    .table(AggregateStat::Table)
                    .col(AggregateStat::Client)
                    .col(AggregateStat::Timestamp)
                    .take(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(AggregateStat::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
pub(crate) enum AggregateStat {
    #[sea_orm(iden = "aggregate_stats")]
    Table,
    Id,
    Client,
    LikesAdded,
    LikesRemoved,
    SharesAdded,
    CommentsAdded,
    RepliesAdded,
    Timestamp,
}

#[derive(DeriveIden)]
pub(crate) enum AggregateStatIndex {
    #[sea_orm(iden = "idx_aggregate_stats_client_timestamp")]
    ClientTimestamp,
}
