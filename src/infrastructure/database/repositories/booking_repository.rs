//! SeaORM implementation of BookingRepository

use async_trait::async_trait;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ActiveValue::NotSet, ColumnTrait, DatabaseConnection, DatabaseTransaction,
    EntityTrait, QueryFilter, Set, TransactionTrait,
};
use tracing::{debug, warn};
use uuid::Uuid;

use super::helpers::{corrupt, db_err, move_slot};
use crate::domain::booking::{Booking, BookingClosure, BookingRepository, BookingStatus, NewBooking};
use crate::domain::inventory::SlotStatus;
use crate::domain::reservation::ReservationConfirmation;
use crate::domain::{DomainError, DomainResult, StatusMachine, Transition};
use crate::infrastructure::database::entities::{booking, reservation};

pub struct SeaOrmBookingRepository {
    db: DatabaseConnection,
}

impl SeaOrmBookingRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

// ── Conversion helpers ──────────────────────────────────────────

fn model_to_domain(m: booking::Model) -> DomainResult<Booking> {
    let reservation_id = m
        .reservation_id
        .as_deref()
        .map(Uuid::parse_str)
        .transpose()
        .map_err(|e| DomainError::Storage(format!("bookings.reservation_id: {}", e)))?;
    Ok(Booking {
        id: m.id,
        parking_area_id: m.parking_area_id,
        vehicle_id: m.vehicle_id,
        slot_id: m.slot_id,
        reservation_id,
        start_time: m.start_time,
        end_time: m.end_time,
        duration_minutes: m.duration_minutes,
        status: m.status.parse().map_err(|e| corrupt("bookings.status", e))?,
        created_at: m.created_at,
    })
}

/// Every spelling a status may have been stored under.
fn stored_spellings(status: BookingStatus) -> &'static [&'static str] {
    match status {
        BookingStatus::Confirmed => &["confirmed", "active", "aktif"],
        BookingStatus::Completed => &["completed", "selesai"],
        BookingStatus::Expired => &["expired"],
        BookingStatus::Cancelled => &["cancelled"],
    }
}

async fn insert_booking(txn: &DatabaseTransaction, b: NewBooking) -> DomainResult<Booking> {
    let saved = booking::ActiveModel {
        id: NotSet,
        parking_area_id: Set(b.parking_area_id),
        vehicle_id: Set(b.vehicle_id),
        slot_id: Set(Some(b.slot_id)),
        reservation_id: Set(b.reservation_id.map(|id| id.to_string())),
        start_time: Set(b.start_time),
        end_time: Set(b.end_time),
        duration_minutes: Set(b.duration_minutes),
        status: Set(BookingStatus::Confirmed.as_str().to_string()),
        created_at: Set(b.created_at),
    }
    .insert(txn)
    .await
    .map_err(db_err)?;
    model_to_domain(saved)
}

// ── BookingRepository impl ──────────────────────────────────────

#[async_trait]
impl BookingRepository for SeaOrmBookingRepository {
    async fn confirm_reservation(
        &self,
        confirmation: ReservationConfirmation,
        new: NewBooking,
    ) -> DomainResult<Option<Booking>> {
        let txn = self.db.begin().await.map_err(db_err)?;

        let confirmed = reservation::Entity::update_many()
            .col_expr(
                reservation::Column::Status,
                Expr::value(confirmation.reservation.to.as_str()),
            )
            .col_expr(
                reservation::Column::ConfirmedAt,
                Expr::value(Some(confirmation.confirmed_at)),
            )
            .filter(reservation::Column::ReservationId.eq(confirmation.reservation_id.to_string()))
            .filter(reservation::Column::Status.eq(confirmation.reservation.from.as_str()))
            .exec(&txn)
            .await
            .map_err(db_err)?;
        if confirmed.rows_affected == 0 {
            debug!(reservation_id = %confirmation.reservation_id, "Reservation no longer active");
            return Ok(None);
        }

        if !move_slot(&txn, confirmation.slot_id, confirmation.slot, confirmation.confirmed_at)
            .await
            .map_err(db_err)?
        {
            return Err(DomainError::Conflict(format!(
                "slot {} is no longer held by reservation {}",
                confirmation.slot_id, confirmation.reservation_id
            )));
        }

        let booking = insert_booking(&txn, new).await?;
        txn.commit().await.map_err(db_err)?;
        Ok(Some(booking))
    }

    async fn occupy_slot(
        &self,
        slot: Transition<SlotStatus>,
        new: NewBooking,
    ) -> DomainResult<Option<Booking>> {
        let txn = self.db.begin().await.map_err(db_err)?;

        if !move_slot(&txn, new.slot_id, slot, new.created_at)
            .await
            .map_err(db_err)?
        {
            debug!(slot_id = new.slot_id, "Slot taken before it could be occupied");
            return Ok(None);
        }

        let booking = insert_booking(&txn, new).await?;
        txn.commit().await.map_err(db_err)?;
        Ok(Some(booking))
    }

    async fn find_by_id(&self, id: i32) -> DomainResult<Option<Booking>> {
        booking::Entity::find_by_id(id)
            .one(&self.db)
            .await
            .map_err(db_err)?
            .map(model_to_domain)
            .transpose()
    }

    async fn find_active_for_vehicle(&self, vehicle_id: i32) -> DomainResult<Option<Booking>> {
        booking::Entity::find()
            .filter(booking::Column::VehicleId.eq(vehicle_id))
            .filter(booking::Column::Status.is_in(stored_spellings(BookingStatus::Confirmed).iter().copied()))
            .one(&self.db)
            .await
            .map_err(db_err)?
            .map(model_to_domain)
            .transpose()
    }

    async fn close(&self, closure: BookingClosure) -> DomainResult<bool> {
        let txn = self.db.begin().await.map_err(db_err)?;

        let updated = booking::Entity::update_many()
            .col_expr(booking::Column::Status, Expr::value(closure.booking.to.as_str()))
            .filter(booking::Column::Id.eq(closure.booking_id))
            .filter(booking::Column::Status.is_in(stored_spellings(closure.booking.from).iter().copied()))
            .exec(&txn)
            .await
            .map_err(db_err)?;
        if updated.rows_affected == 0 {
            return Ok(false);
        }

        if let Some((slot_id, transition)) = closure.slot {
            if !move_slot(&txn, slot_id, transition, closure.at)
                .await
                .map_err(db_err)?
            {
                warn!(booking_id = closure.booking_id, slot_id, "Closed booking's slot was not occupied");
            }
        }

        txn.commit().await.map_err(db_err)?;
        Ok(true)
    }
}
