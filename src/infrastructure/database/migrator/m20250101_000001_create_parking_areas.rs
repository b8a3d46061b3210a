//! Create parking_areas table

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(ParkingAreas::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(ParkingAreas::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(ParkingAreas::MallId).integer().not_null())
                    .col(ColumnDef::new(ParkingAreas::Name).string().not_null())
                    .col(
                        ColumnDef::new(ParkingAreas::Capacity)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(ParkingAreas::Status)
                            .string()
                            .not_null()
                            .default("available"),
                    )
                    .col(
                        ColumnDef::new(ParkingAreas::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_parking_areas_mall")
                    .table(ParkingAreas::Table)
                    .col(ParkingAreas::MallId)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(ParkingAreas::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
pub enum ParkingAreas {
    Table,
    Id,
    MallId,
    Name,
    Capacity,
    Status,
    CreatedAt,
}
