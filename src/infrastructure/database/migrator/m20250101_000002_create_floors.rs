//! Create floors table

use sea_orm_migration::prelude::*;

use super::m20250101_000001_create_parking_areas::ParkingAreas;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Floors::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Floors::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Floors::ParkingAreaId).integer().not_null())
                    .col(ColumnDef::new(Floors::FloorNumber).integer().not_null())
                    .col(ColumnDef::new(Floors::Name).string().not_null())
                    .col(ColumnDef::new(Floors::VehicleType).string())
                    .col(
                        ColumnDef::new(Floors::TotalSlots)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(Floors::AvailableSlots)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(Floors::Status)
                            .string()
                            .not_null()
                            .default("active"),
                    )
                    .col(
                        ColumnDef::new(Floors::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_floors_parking_area")
                            .from(Floors::Table, Floors::ParkingAreaId)
                            .to(ParkingAreas::Table, ParkingAreas::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_floors_area_number")
                    .table(Floors::Table)
                    .col(Floors::ParkingAreaId)
                    .col(Floors::FloorNumber)
                    .unique()
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Floors::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
pub enum Floors {
    Table,
    Id,
    ParkingAreaId,
    FloorNumber,
    Name,
    VehicleType,
    TotalSlots,
    AvailableSlots,
    Status,
    CreatedAt,
}
