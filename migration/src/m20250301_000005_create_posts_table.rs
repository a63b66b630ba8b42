use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Post::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Post::Id).string().not_null().primary_key())
                    .col(ColumnDef::new(Post::Client).string().not_null())
                    .col(
                        ColumnDef::new(Post::ViewsCount)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .col(ColumnDef::new(Post::CreatedAt).timestamp().not_null())
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name(PostIndex::Client.to_string())
                    .table(Post::Table)
                    .col(Post::Client)
                    .take(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Post::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
pub(crate) enum Post {
    #[sea_orm(iden = "posts")]
    Table,
    Id,
    Client,
    ViewsCount,
    CreatedAt,
}

#[derive(DeriveIden)]
pub(crate) enum PostIndex {
    #[sea_orm(iden = "idx_posts_client")]
    Client,
}
