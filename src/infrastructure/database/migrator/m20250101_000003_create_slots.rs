//! Create slots table
//!
//! Slots belong to exactly one floor and go with it when it is deleted.

use sea_orm_migration::prelude::*;

use super::m20250101_000002_create_floors::Floors;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Slots::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Slots::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Slots::FloorId).integer().not_null())
                    .col(ColumnDef::new(Slots::Code).string().not_null().unique_key())
                    .col(ColumnDef::new(Slots::VehicleType).string().not_null())
                    .col(
                        ColumnDef::new(Slots::PositionX)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(Slots::PositionY)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(Slots::Status)
                            .string()
                            .not_null()
                            .default("available"),
                    )
                    .col(
                        ColumnDef::new(Slots::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_slots_floor")
                            .from(Slots::Table, Slots::FloorId)
                            .to(Floors::Table, Floors::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_slots_floor_status")
                    .table(Slots::Table)
                    .col(Slots::FloorId)
                    .col(Slots::Status)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Slots::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
pub enum Slots {
    Table,
    Id,
    FloorId,
    Code,
    VehicleType,
    PositionX,
    PositionY,
    Status,
    UpdatedAt,
}
