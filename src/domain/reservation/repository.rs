//! Reservation repository interface

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use super::model::{Reservation, ReservationRelease};
use crate::domain::DomainResult;

#[async_trait]
pub trait ReservationRepository: Send + Sync {
    /// Move the reservation's slot `available → reserved` and insert the
    /// reservation in one atomic unit. `Ok(None)` means another request got
    /// the slot first.
    async fn hold_slot(&self, reservation: Reservation) -> DomainResult<Option<Reservation>>;

    async fn find_by_reservation_id(&self, reservation_id: Uuid)
        -> DomainResult<Option<Reservation>>;

    /// Active reservations whose `expires_at <= now`.
    async fn find_expired_active(&self, now: DateTime<Utc>) -> DomainResult<Vec<Reservation>>;

    /// End a hold and hand its slot back, atomically. `false` means the
    /// reservation had already left `release.reservation.from`.
    async fn release(&self, release: ReservationRelease) -> DomainResult<bool>;

    /// Delete expired/cancelled reservations whose hold window ended before
    /// `before` and that no booking references. Returns the number removed.
    async fn purge_finished(&self, before: DateTime<Utc>) -> DomainResult<u64>;
}
