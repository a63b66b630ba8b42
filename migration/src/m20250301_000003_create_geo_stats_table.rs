use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(GeoStat::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(GeoStat::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(GeoStat::Client).string().not_null())
                    .col(ColumnDef::new(GeoStat::Action).string().not_null())
                    .col(ColumnDef::new(GeoStat::Ip).string().not_null())
                    .col(ColumnDef::new(GeoStat::Country).string().not_null())
                    .col(ColumnDef::new(GeoStat::CountryCode).string().not_null())
                    .col(ColumnDef::new(GeoStat::Region).string().not_null())
                    .col(ColumnDef::new(GeoStat::RegionCode).string().not_null())
                    .col(ColumnDef::new(GeoStat::City).string().not_null())
                    .col(ColumnDef::new(GeoStat::Latitude).double().null())
                    .col(ColumnDef::new(GeoStat::Longitude).double().null())
                    .col(
                        ColumnDef::new(GeoStat::Count)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .col(ColumnDef::new(GeoStat::Timestamp).timestamp().not_null())
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name(GeoStatIndex::ClientTimestamp.to_string())
                    .table(GeoStat::Table)
                    .col(GeoStat::Client)
                    .col(GeoStat::Timestamp)
                    .take(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name(GeoStatIndex::CountryCode.to_string())
                    .table(GeoStat::Table)
                    .col(GeoStat::CountryCode)
                    .take(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(GeoStat::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
pub(crate) enum GeoStat {
    #[sea_orm(iden = "geo_stats")]
    Table,
    Id,
    Client,
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
pub(crate) enum GeoStatIndex {
    #[sea_orm(iden = "idx_geo_stats_client_timestamp")]
    ClientTimestamp,
    #[sea_orm(iden = "idx_geo_stats_country_code")]
    CountryCode,
}
