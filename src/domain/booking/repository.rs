//! Booking repository interface

use async_trait::async_trait;

use super::model::{Booking, BookingClosure, NewBooking};
use crate::domain::inventory::SlotStatus;
use crate::domain::reservation::ReservationConfirmation;
use crate::domain::transition::Transition;
use crate::domain::DomainResult;

#[async_trait]
pub trait BookingRepository: Send + Sync {
    /// Confirm the reservation, occupy its slot and insert the booking in one
    /// atomic unit. `Ok(None)` means the reservation was no longer active.
    async fn confirm_reservation(
        &self,
        confirmation: ReservationConfirmation,
        booking: NewBooking,
    ) -> DomainResult<Option<Booking>>;

    /// Move `booking.slot_id` along `slot` and insert the booking in one
    /// atomic unit. `Ok(None)` means the slot was taken first.
    async fn occupy_slot(
        &self,
        slot: Transition<SlotStatus>,
        booking: NewBooking,
    ) -> DomainResult<Option<Booking>>;

    async fn find_by_id(&self, id: i32) -> DomainResult<Option<Booking>>;

    async fn find_active_for_vehicle(&self, vehicle_id: i32) -> DomainResult<Option<Booking>>;

    /// Close a booking and free its slot. `false` means the booking had
    /// already left `closure.booking.from`.
    async fn close(&self, closure: BookingClosure) -> DomainResult<bool>;
}
