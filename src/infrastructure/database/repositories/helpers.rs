//! Helpers shared by the SeaORM repositories

use chrono::{DateTime, Utc};
use sea_orm::sea_query::Expr;
use sea_orm::{
    ColumnTrait, ConnectionTrait, DbErr, EntityTrait, PaginatorTrait, QueryFilter, SqlErr,
};

use crate::domain::inventory::SlotStatus;
use crate::domain::{DomainError, StatusMachine, Transition};
use crate::infrastructure::database::entities::{floor, slot};

/// Map a database error into the domain. Unique-index violations are
/// business conflicts (double hold, second active booking, duplicate code).
pub(super) fn db_err(e: DbErr) -> DomainError {
    match e.sql_err() {
        Some(SqlErr::UniqueConstraintViolation(detail)) => {
            DomainError::Conflict(format!("Unique constraint violated: {}", detail))
        }
        _ => DomainError::Storage(e.to_string()),
    }
}

/// A stored status string that no longer parses is a storage fault.
pub(super) fn corrupt(column: &str, e: DomainError) -> DomainError {
    DomainError::Storage(format!("{}: {}", column, e))
}

/// Compare-and-swap a slot's status and refresh its floor's cached
/// `available_slots`. Returns `false` when the slot was not in `t.from`.
pub(super) async fn move_slot<C: ConnectionTrait>(
    conn: &C,
    slot_id: i32,
    t: Transition<SlotStatus>,
    at: DateTime<Utc>,
) -> Result<bool, DbErr> {
    let result = slot::Entity::update_many()
        .col_expr(slot::Column::Status, Expr::value(t.to.as_str()))
        .col_expr(slot::Column::UpdatedAt, Expr::value(at))
        .filter(slot::Column::Id.eq(slot_id))
        .filter(slot::Column::Status.eq(t.from.as_str()))
        .exec(conn)
        .await?;
    if result.rows_affected == 0 {
        return Ok(false);
    }

    if let Some(moved) = slot::Entity::find_by_id(slot_id).one(conn).await? {
        refresh_available(conn, moved.floor_id).await?;
    }
    Ok(true)
}

/// Recount a floor's available slots into its cached column.
pub(super) async fn refresh_available<C: ConnectionTrait>(conn: &C, floor_id: i32) -> Result<(), DbErr> {
    let available = slot::Entity::find()
        .filter(slot::Column::FloorId.eq(floor_id))
        .filter(slot::Column::Status.eq(SlotStatus::Available.as_str()))
        .count(conn)
        .await?;

    floor::Entity::update_many()
        .col_expr(floor::Column::AvailableSlots, Expr::value(available as i32))
        .filter(floor::Column::Id.eq(floor_id))
        .exec(conn)
        .await?;
    Ok(())
}
