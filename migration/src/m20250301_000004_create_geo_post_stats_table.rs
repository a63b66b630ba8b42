use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(GeoPostStat::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(GeoPostStat::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(GeoPostStat::Client).string().not_null())
                    .col(ColumnDef::new(GeoPostStat::Entity).string().not_null())
                    .col(ColumnDef::new(GeoPostStat::Action).string().not_null())
                    .col(ColumnDef::new(GeoPostStat::Ip).string().not_null())
                    .col(ColumnDef::new(GeoPostStat::Country).string().not_null())
                    .col(ColumnDef::new(GeoPostStat::CountryCode).string().not_null())
                    .col(ColumnDef::new(GeoPostStat::Region).string().not_null())
                    .col(ColumnDef::new(GeoPostStat::RegionCode).string().not_null())
                    .col(ColumnDef::new(GeoPostStat::City).string().not_null())
                    .col(ColumnDef::new(GeoPostStat::Latitude).double().null())
                    .col(ColumnDef::new(GeoPostStat::Longitude).double().null())
                    .col(
                        ColumnDef::new(GeoPostStat::Count)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .col(ColumnDef::new(GeoPostStat::Timestamp).timestamp().not_null())
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name(GeoPostStatIndex::EntityTimestamp.to_string())
                    .table(GeoPostStat::Table)
                    .col(GeoPostStat::Client)
                    .col(GeoPostStat::Entity)
                    .col(GeoPostStat::Timestamp)
                    .take(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name(GeoPostStatIndex::CountryCode.to_string())
                    .table(GeoPostStat::Table)
                    .col(GeoPostStat::CountryCode)
                    .take(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(GeoPostStat::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
pub(crate) enum GeoPostStat {
    #[sea_orm(iden = "geo_post_stats")]
    Table,
    Id,
    Client,
    Entity,
    Action,
    Ip,
    Country,
    CountryCode,
    Region,
    RegionCode,
    City,
    Latitude,
    Longitude,
    Count,
    Timestamp,
}

#[derive(DeriveIden)]
pub(crate) enum GeoPostStatIndex {
    #[sea_orm(iden = "idx_geo_post_stats_entity_timestamp")]
    EntityTimestamp,
    #[sea_orm(iden = "idx_geo_post_stats_country_code")]
    CountryCode,
}
