//! SeaORM implementation of ReservationRepository

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sea_orm::sea_query::{Expr, Query};
use sea_orm::{
    ActiveModelTrait, ActiveValue::NotSet, ColumnTrait, DatabaseConnection, EntityTrait,
    QueryFilter, QueryOrder, Set, TransactionTrait,
};
use tracing::{debug, warn};
use uuid::Uuid;

use super::helpers::{corrupt, db_err, move_slot};
use crate::domain::inventory::SlotStatus;
use crate::domain::reservation::{
    Reservation, ReservationRelease, ReservationRepository, ReservationStatus,
};
use crate::domain::{DomainError, DomainResult, StatusMachine, Transition};
use crate::infrastructure::database::entities::{booking, reservation};

pub struct SeaOrmReservationRepository {
    db: DatabaseConnection,
}

impl SeaOrmReservationRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

// ── Conversion helpers ──────────────────────────────────────────

fn model_to_domain(m: reservation::Model) -> DomainResult<Reservation> {
    Ok(Reservation {
        id: m.id,
        reservation_id: Uuid::parse_str(&m.reservation_id)
            .map_err(|e| DomainError::Storage(format!("reservations.reservation_id: {}", e)))?,
        slot_id: m.slot_id,
        user_id: m.user_id,
        floor_id: m.floor_id,
        status: m.status.parse().map_err(|e| corrupt("reservations.status", e))?,
        reserved_at: m.reserved_at,
        expires_at: m.expires_at,
        confirmed_at: m.confirmed_at,
    })
}

// ── ReservationRepository impl ──────────────────────────────────

#[async_trait]
impl ReservationRepository for SeaOrmReservationRepository {
    async fn hold_slot(&self, r: Reservation) -> DomainResult<Option<Reservation>> {
        let txn = self.db.begin().await.map_err(db_err)?;

        let reserve = Transition {
            from: SlotStatus::Available,
            to: SlotStatus::Reserved,
        };
        if !move_slot(&txn, r.slot_id, reserve, r.reserved_at)
            .await
            .map_err(db_err)?
        {
            debug!(slot_id = r.slot_id, "Slot no longer available");
            return Ok(None);
        }

        let saved = reservation::ActiveModel {
            id: NotSet,
            reservation_id: Set(r.reservation_id.to_string()),
            slot_id: Set(r.slot_id),
            user_id: Set(r.user_id),
            floor_id: Set(r.floor_id),
            status: Set(r.status.as_str().to_string()),
            reserved_at: Set(r.reserved_at),
            expires_at: Set(r.expires_at),
            confirmed_at: Set(r.confirmed_at),
        }
        .insert(&txn)
        .await
        .map_err(db_err)?;

        txn.commit().await.map_err(db_err)?;
        model_to_domain(saved).map(Some)
    }

    async fn find_by_reservation_id(
        &self,
        reservation_id: Uuid,
    ) -> DomainResult<Option<Reservation>> {
        reservation::Entity::find()
            .filter(reservation::Column::ReservationId.eq(reservation_id.to_string()))
            .one(&self.db)
            .await
            .map_err(db_err)?
            .map(model_to_domain)
            .transpose()
    }

    async fn find_expired_active(&self, now: DateTime<Utc>) -> DomainResult<Vec<Reservation>> {
        let models = reservation::Entity::find()
            .filter(reservation::Column::Status.eq(ReservationStatus::Active.as_str()))
            .filter(reservation::Column::ExpiresAt.lte(now))
            .order_by_asc(reservation::Column::ExpiresAt)
            .all(&self.db)
            .await
            .map_err(db_err)?;

        let mut expired = Vec::with_capacity(models.len());
        for model in models {
            let r = model_to_domain(model)?;
            if r.is_past_expiry(now) {
                expired.push(r);
            }
        }
        Ok(expired)
    }

    async fn release(&self, release: ReservationRelease) -> DomainResult<bool> {
        let txn = self.db.begin().await.map_err(db_err)?;

        let updated = reservation::Entity::update_many()
            .col_expr(
                reservation::Column::Status,
                Expr::value(release.reservation.to.as_str()),
            )
            .filter(reservation::Column::ReservationId.eq(release.reservation_id.to_string()))
            .filter(reservation::Column::Status.eq(release.reservation.from.as_str()))
            .exec(&txn)
            .await
            .map_err(db_err)?;
        if updated.rows_affected == 0 {
            return Ok(false);
        }

        if !move_slot(&txn, release.slot_id, release.slot, release.at)
            .await
            .map_err(db_err)?
        {
            warn!(
                reservation_id = %release.reservation_id,
                slot_id = release.slot_id,
                "Released reservation's slot was not reserved"
            );
        }

        txn.commit().await.map_err(db_err)?;
        Ok(true)
    }

    async fn purge_finished(&self, before: DateTime<Utc>) -> DomainResult<u64> {
        let referenced = Query::select()
            .column(booking::Column::ReservationId)
            .from(booking::Entity)
            .and_where(booking::Column::ReservationId.is_not_null())
            .to_owned();

        let deleted = reservation::Entity::delete_many()
            .filter(reservation::Column::Status.is_in([
                ReservationStatus::Expired.as_str(),
                ReservationStatus::Cancelled.as_str(),
            ]))
            .filter(reservation::Column::ExpiresAt.lt(before))
            .filter(reservation::Column::ReservationId.not_in_subquery(referenced))
            .exec(&self.db)
            .await
            .map_err(db_err)?;
        Ok(deleted.rows_affected)
    }
}
