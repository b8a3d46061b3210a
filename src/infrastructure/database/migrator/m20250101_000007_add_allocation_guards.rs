//! Partial unique indexes backing the allocation invariants
//!
//! - at most one `active` reservation per slot
//! - at most one `confirmed` booking per vehicle, counting the legacy
//!   `active`/`aktif` spellings
//!
//! Both SQLite and PostgreSQL accept the `WHERE` clause.

use sea_orm_migration::prelude::*;
use sea_orm_migration::sea_orm::ConnectionTrait;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();

        db.execute_unprepared(
            "CREATE UNIQUE INDEX IF NOT EXISTS ux_reservations_active_slot \
             ON reservations (slot_id) WHERE status = 'active'",
        )
        .await?;

        db.execute_unprepared(
            "CREATE UNIQUE INDEX IF NOT EXISTS ux_bookings_confirmed_vehicle \
             ON bookings (vehicle_id) WHERE status IN ('confirmed', 'active', 'aktif')",
        )
        .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();
        db.execute_unprepared("DROP INDEX IF EXISTS ux_bookings_confirmed_vehicle")
            .await?;
        db.execute_unprepared("DROP INDEX IF EXISTS ux_reservations_active_slot")
            .await?;
        Ok(())
    }
}
