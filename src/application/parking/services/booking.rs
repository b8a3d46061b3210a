//! Booking Confirmer
//!
//! Turns a hold into a booking, or books a slot directly when the client
//! skipped the reservation step. Every path ends in one atomic storage call
//! that moves the slot to `occupied` and inserts the booking.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{debug, info};
use uuid::Uuid;

use super::allocation::choose_slot;
use crate::domain::booking::{Booking, BookingStatus, NewBooking};
use crate::domain::events::{BookingClosedEvent, BookingConfirmedEvent, Event};
use crate::domain::inventory::{ParkingArea, Slot, SlotScope, SlotStatus};
use crate::domain::reservation::HoldPolicy;
use crate::domain::vehicle::Vehicle;
use crate::domain::{DomainResult, RepositoryProvider, SharedNotificationSink, StatusMachine};
use crate::shared::errors::DomainError;
use crate::shared::time::SharedClock;

#[derive(Debug, Clone)]
pub struct CreateBookingCommand {
    pub parking_area_id: i32,
    pub vehicle_id: i32,
    pub start_time: DateTime<Utc>,
    pub duration_minutes: i64,
    pub slot_id: Option<i32>,
    pub reservation_id: Option<Uuid>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BookingSummary {
    pub booking: Booking,
    /// `None` only for legacy bookings without a slot
    pub slot: Option<Slot>,
}

/// How a booking got its slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BookingPath {
    Reservation,
    ExplicitSlot,
    AutoAssign,
}

impl BookingPath {
    fn as_str(self) -> &'static str {
        match self {
            Self::Reservation => "reservation",
            Self::ExplicitSlot => "explicit_slot",
            Self::AutoAssign => "auto_assign",
        }
    }
}

pub struct BookingService {
    repos: Arc<dyn RepositoryProvider>,
    clock: SharedClock,
    notifier: SharedNotificationSink,
    policy: HoldPolicy,
}

impl BookingService {
    pub fn new(
        repos: Arc<dyn RepositoryProvider>,
        clock: SharedClock,
        notifier: SharedNotificationSink,
        policy: HoldPolicy,
    ) -> Self {
        Self {
            repos,
            clock,
            notifier,
            policy,
        }
    }

    pub async fn create_booking(&self, cmd: CreateBookingCommand) -> DomainResult<BookingSummary> {
        let now = self.clock.now();
        // Slot is filled in once one has been chosen.
        let draft = NewBooking::new(
            cmd.parking_area_id,
            cmd.vehicle_id,
            0,
            cmd.start_time,
            cmd.duration_minutes,
            now,
        )?;

        let vehicle = self
            .repos
            .vehicles()
            .find_by_id(cmd.vehicle_id)
            .await?
            .ok_or_else(|| DomainError::not_found("Vehicle", "id", cmd.vehicle_id))?;
        let area = self
            .repos
            .inventory()
            .find_area(cmd.parking_area_id)
            .await?
            .ok_or_else(|| DomainError::not_found("ParkingArea", "id", cmd.parking_area_id))?;

        if let Some(active) = self
            .repos
            .bookings()
            .find_active_for_vehicle(vehicle.id)
            .await?
        {
            debug!(vehicle_id = vehicle.id, booking_id = active.id, "Vehicle already booked");
            return Err(DomainError::Conflict(format!(
                "vehicle {} already has active booking {}",
                vehicle.id, active.id
            )));
        }

        let (booking, slot, path) = match (cmd.reservation_id, cmd.slot_id) {
            (Some(reservation_id), slot_id) => {
                let (booking, slot) = self
                    .confirm_reservation(&area, &vehicle, reservation_id, slot_id, draft)
                    .await?;
                (booking, slot, BookingPath::Reservation)
            }
            (None, Some(slot_id)) => {
                let (booking, slot) = self.occupy_explicit(&area, &vehicle, slot_id, draft).await?;
                (booking, slot, BookingPath::ExplicitSlot)
            }
            (None, None) => {
                let (booking, slot) = self.occupy_random(&area, &vehicle, draft).await?;
                (booking, slot, BookingPath::AutoAssign)
            }
        };

        info!(
            booking_id = booking.id,
            vehicle_id = booking.vehicle_id,
            slot_id = slot.id,
            code = %slot.code,
            path = path.as_str(),
            "Booking confirmed"
        );
        metrics::counter!("parking_bookings_total", "path" => path.as_str()).increment(1);
        self.notifier.notify(Event::BookingConfirmed(BookingConfirmedEvent {
            booking_id: booking.id,
            vehicle_id: booking.vehicle_id,
            slot_id: slot.id,
            reservation_id: booking.reservation_id,
            timestamp: now,
        }));

        Ok(BookingSummary {
            booking,
            slot: Some(slot),
        })
    }

    async fn confirm_reservation(
        &self,
        area: &ParkingArea,
        vehicle: &Vehicle,
        reservation_id: Uuid,
        requested_slot: Option<i32>,
        draft: NewBooking,
    ) -> DomainResult<(Booking, Slot)> {
        let reservation = self
            .repos
            .reservations()
            .find_by_reservation_id(reservation_id)
            .await?
            .ok_or_else(|| {
                DomainError::InvalidReservation(format!("reservation {reservation_id} does not exist"))
            })?;

        let floor_in_area = self
            .repos
            .inventory()
            .find_floor(reservation.floor_id)
            .await?
            .is_some_and(|floor| floor.parking_area_id == area.id);
        if !floor_in_area {
            return Err(DomainError::InvalidReservation(format!(
                "reservation {reservation_id} is not for parking area {}",
                area.id
            )));
        }
        if requested_slot.is_some_and(|slot_id| slot_id != reservation.slot_id) {
            return Err(DomainError::InvalidReservation(format!(
                "reservation {reservation_id} holds a different slot"
            )));
        }
        if reservation.user_id != vehicle.user_id {
            debug!(%reservation_id, vehicle_id = vehicle.id, "Vehicle owner did not make the hold");
            return Err(DomainError::InvalidReservation(format!(
                "reservation {reservation_id} belongs to another user"
            )));
        }
        let held_slot = self
            .repos
            .inventory()
            .find_slot(reservation.slot_id)
            .await?
            .ok_or_else(|| DomainError::not_found("Slot", "id", reservation.slot_id))?;
        if held_slot.vehicle_type != vehicle.vehicle_type {
            return Err(DomainError::InvalidReservation(format!(
                "reservation {reservation_id} holds a {} slot",
                held_slot.vehicle_type
            )));
        }

        let now = draft.created_at;
        let plan = reservation.confirmation(now).inspect_err(|_| {
            debug!(%reservation_id, status = %reservation.status, "Reservation no longer confirmable");
        })?;
        let slot_transition = plan.slot;

        let new_booking = NewBooking {
            slot_id: reservation.slot_id,
            ..draft
        }
        .with_reservation(reservation_id);

        let Some(booking) = self
            .repos
            .bookings()
            .confirm_reservation(plan, new_booking)
            .await?
        else {
            // The sweeper or a cancel committed first.
            debug!(%reservation_id, "Reservation left active state before confirmation");
            return Err(DomainError::ReservationExpired(reservation_id.to_string()));
        };

        let slot = self.occupied_slot(reservation.slot_id, slot_transition.to, now).await?;
        Ok((booking, slot))
    }

    async fn occupy_explicit(
        &self,
        area: &ParkingArea,
        vehicle: &Vehicle,
        slot_id: i32,
        draft: NewBooking,
    ) -> DomainResult<(Booking, Slot)> {
        let slot = self
            .repos
            .inventory()
            .find_slot(slot_id)
            .await?
            .ok_or_else(|| DomainError::not_found("Slot", "id", slot_id))?;
        let floor = self
            .repos
            .inventory()
            .find_floor(slot.floor_id)
            .await?
            .filter(|floor| floor.parking_area_id == area.id)
            .ok_or_else(|| {
                DomainError::validation("id_slot", format!("slot {slot_id} is not in parking area {}", area.id))
            })?;
        if slot.vehicle_type != vehicle.vehicle_type {
            return Err(DomainError::validation(
                "id_slot",
                format!("slot {} is reserved for {}", slot.code, slot.vehicle_type),
            ));
        }
        if !area.is_open() || !floor.is_active() {
            return Err(DomainError::NoSlotsAvailable {
                scope: format!("floor {}", floor.id),
            });
        }

        if slot.status != SlotStatus::Available {
            return Err(DomainError::Conflict(format!("slot {} is {}", slot.code, slot.status)));
        }
        let transition = slot.status.transition_to(SlotStatus::Occupied)?;
        let now = draft.created_at;
        let booking = self
            .repos
            .bookings()
            .occupy_slot(transition, NewBooking { slot_id, ..draft })
            .await?
            .ok_or_else(|| DomainError::Conflict(format!("slot {} was taken", slot.code)))?;

        Ok((
            booking,
            Slot {
                status: transition.to,
                updated_at: now,
                ..slot
            },
        ))
    }

    async fn occupy_random(
        &self,
        area: &ParkingArea,
        vehicle: &Vehicle,
        draft: NewBooking,
    ) -> DomainResult<(Booking, Slot)> {
        let scope = format!("parking area {}", area.id);
        if !area.is_open() {
            return Err(DomainError::NoSlotsAvailable { scope });
        }

        for attempt in 1..=self.policy.max_allocation_attempts {
            let candidates = self
                .repos
                .inventory()
                .find_available_slots(SlotScope::Area(area.id), &vehicle.vehicle_type)
                .await?;
            let Some(slot) = choose_slot(&candidates) else {
                break;
            };

            let transition = slot.status.transition_to(SlotStatus::Occupied)?;
            let now = draft.created_at;
            let new_booking = NewBooking {
                slot_id: slot.id,
                ..draft.clone()
            };
            match self.repos.bookings().occupy_slot(transition, new_booking).await? {
                Some(booking) => {
                    return Ok((
                        booking,
                        Slot {
                            status: transition.to,
                            updated_at: now,
                            ..slot
                        },
                    ))
                }
                None => debug!(slot_id = slot.id, attempt, "Lost race for slot, re-reading candidates"),
            }
        }

        debug!(area_id = area.id, vehicle_type = %vehicle.vehicle_type, "No slot to auto-assign");
        Err(DomainError::NoSlotsAvailable { scope })
    }

    async fn occupied_slot(&self, slot_id: i32, status: SlotStatus, at: DateTime<Utc>) -> DomainResult<Slot> {
        let slot = self
            .repos
            .inventory()
            .find_slot(slot_id)
            .await?
            .ok_or_else(|| DomainError::not_found("Slot", "id", slot_id))?;
        Ok(Slot {
            status,
            updated_at: at,
            ..slot
        })
    }

    pub async fn get_booking(&self, booking_id: i32) -> DomainResult<BookingSummary> {
        let booking = self.find(booking_id).await?;
        let slot = match booking.slot_id {
            Some(slot_id) => self.repos.inventory().find_slot(slot_id).await?,
            None => None,
        };
        Ok(BookingSummary { booking, slot })
    }

    /// `confirmed → cancelled`, freeing the slot.
    pub async fn cancel_booking(&self, booking_id: i32) -> DomainResult<BookingSummary> {
        self.close(booking_id, BookingStatus::Cancelled).await
    }

    /// `confirmed → completed` (`selesai`), freeing the slot.
    pub async fn complete_booking(&self, booking_id: i32) -> DomainResult<BookingSummary> {
        self.close(booking_id, BookingStatus::Completed).await
    }

    async fn close(&self, booking_id: i32, to: BookingStatus) -> DomainResult<BookingSummary> {
        let booking = self.find(booking_id).await?;
        let now = self.clock.now();
        let closure = booking.closure(to, now)?;

        if !self.repos.bookings().close(closure.clone()).await? {
            let current = self.find(booking_id).await?.status;
            return Err(DomainError::IllegalTransition {
                entity: "booking",
                from: current.as_str(),
                to: to.as_str(),
            });
        }

        info!(booking_id, slot_id = ?booking.slot_id, status = to.as_str(), "Booking closed");
        self.notifier.notify(Event::BookingClosed(BookingClosedEvent {
            booking_id,
            slot_id: booking.slot_id,
            status: to.as_str().to_string(),
            timestamp: now,
        }));

        self.get_booking(booking_id).await
    }

    async fn find(&self, booking_id: i32) -> DomainResult<Booking> {
        self.repos
            .bookings()
            .find_by_id(booking_id)
            .await?
            .ok_or_else(|| DomainError::not_found("Booking", "id", booking_id))
    }
}

// ── Tests ──────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use chrono::Duration;

    use super::*;
    use crate::application::parking::services::allocation::ReserveSlotCommand;
    use crate::application::parking::test_support::Fixture;
    use crate::domain::ReservationStatus;
    use crate::shared::time::Clock;

    fn booking_cmd(area_id: i32, vehicle_id: i32) -> CreateBookingCommand {
        CreateBookingCommand {
            parking_area_id: area_id,
            vehicle_id,
            start_time: DateTime::parse_from_rfc3339("2025-03-01T13:00:00Z")
                .unwrap()
                .with_timezone(&Utc),
            duration_minutes: 120,
            slot_id: None,
            reservation_id: None,
        }
    }

    async fn hold(fx: &Fixture, floor_id: i32) -> Uuid {
        fx.services
            .allocation
            .reserve_random_slot(ReserveSlotCommand {
                floor_id,
                user_id: 1,
                vehicle_type: "Roda Dua".into(),
                duration_minutes: Some(5),
            })
            .await
            .unwrap()
            .reservation
            .reservation_id
    }

    #[tokio::test]
    async fn confirming_a_hold_occupies_its_slot() {
        let fx = Fixture::new();
        let area = fx.area(10).await;
        let floor = fx.floor(area.id, 1, "Roda Dua", 2).await;
        let vehicle = fx.vehicle("Roda Dua");
        let reservation_id = hold(&fx, floor.floor.id).await;

        fx.clock.advance(Duration::minutes(2));
        let summary = fx
            .services
            .booking
            .create_booking(CreateBookingCommand {
                reservation_id: Some(reservation_id),
                ..booking_cmd(area.id, vehicle)
            })
            .await
            .unwrap();

        assert_eq!(summary.booking.status, BookingStatus::Confirmed);
        assert_eq!(summary.booking.reservation_id, Some(reservation_id));
        let slot = summary.slot.unwrap();
        assert_eq!(slot.status, SlotStatus::Occupied);
        assert_eq!(fx.slot_status(slot.id).await, SlotStatus::Occupied);

        let reservation = fx.reservation(reservation_id).await;
        assert_eq!(reservation.status, ReservationStatus::Confirmed);
        assert_eq!(reservation.confirmed_at, Some(fx.clock.now()));
        assert_eq!(fx.store.bookings_for_reservation(reservation_id).await, 1);
    }

    #[tokio::test]
    async fn unknown_reservation_is_invalid() {
        let fx = Fixture::new();
        let area = fx.area(10).await;
        fx.floor(area.id, 1, "Roda Dua", 1).await;
        let vehicle = fx.vehicle("Roda Dua");

        let err = fx
            .services
            .booking
            .create_booking(CreateBookingCommand {
                reservation_id: Some(Uuid::new_v4()),
                ..booking_cmd(area.id, vehicle)
            })
            .await
            .unwrap_err();
        assert_eq!(err.code(), "INVALID_RESERVATION");
    }

    #[tokio::test]
    async fn reservation_for_another_area_or_slot_is_invalid() {
        let fx = Fixture::new();
        let area = fx.area(10).await;
        let other_area = fx.area(10).await;
        let floor = fx.floor(area.id, 1, "Roda Dua", 2).await;
        let vehicle = fx.vehicle("Roda Dua");
        let reservation_id = hold(&fx, floor.floor.id).await;

        let err = fx
            .services
            .booking
            .create_booking(CreateBookingCommand {
                reservation_id: Some(reservation_id),
                ..booking_cmd(other_area.id, vehicle)
            })
            .await
            .unwrap_err();
        assert_eq!(err.code(), "INVALID_RESERVATION");

        let held_slot = fx.reservation(reservation_id).await.slot_id;
        let other_slot = fx
            .slots(floor.floor.id)
            .await
            .into_iter()
            .find(|s| s.id != held_slot)
            .unwrap();
        let err = fx
            .services
            .booking
            .create_booking(CreateBookingCommand {
                reservation_id: Some(reservation_id),
                slot_id: Some(other_slot.id),
                ..booking_cmd(area.id, vehicle)
            })
            .await
            .unwrap_err();
        assert_eq!(err.code(), "INVALID_RESERVATION");
        assert_eq!(fx.reservation(reservation_id).await.status, ReservationStatus::Active);
    }

    #[tokio::test]
    async fn hold_cannot_be_confirmed_by_another_users_vehicle() {
        let fx = Fixture::new();
        let area = fx.area(10).await;
        let floor = fx.floor(area.id, 1, "Roda Dua", 1).await;
        let stranger = fx.store.add_vehicle(99, "D 9 XY", "Roda Dua");
        let reservation_id = hold(&fx, floor.floor.id).await;

        let err = fx
            .services
            .booking
            .create_booking(CreateBookingCommand {
                reservation_id: Some(reservation_id),
                ..booking_cmd(area.id, stranger)
            })
            .await
            .unwrap_err();
        assert_eq!(err.code(), "INVALID_RESERVATION");
        assert_eq!(fx.reservation(reservation_id).await.status, ReservationStatus::Active);
        assert_eq!(
            fx.slot_status(fx.reservation(reservation_id).await.slot_id).await,
            SlotStatus::Reserved
        );
    }

    #[tokio::test]
    async fn hold_cannot_be_confirmed_by_a_different_vehicle_type() {
        let fx = Fixture::new();
        let area = fx.area(10).await;
        let floor = fx.floor(area.id, 1, "Roda Dua", 1).await;
        let car = fx.vehicle("Roda Empat");
        let reservation_id = hold(&fx, floor.floor.id).await;

        let err = fx
            .services
            .booking
            .create_booking(CreateBookingCommand {
                reservation_id: Some(reservation_id),
                ..booking_cmd(area.id, car)
            })
            .await
            .unwrap_err();
        assert_eq!(err.code(), "INVALID_RESERVATION");
        assert_eq!(fx.reservation(reservation_id).await.status, ReservationStatus::Active);
        assert_eq!(fx.store.bookings_for_reservation(reservation_id).await, 0);
    }

    #[tokio::test]
    async fn cancelled_reservation_cannot_be_confirmed() {
        let fx = Fixture::new();
        let area = fx.area(10).await;
        let floor = fx.floor(area.id, 1, "Roda Dua", 1).await;
        let vehicle = fx.vehicle("Roda Dua");
        let reservation_id = hold(&fx, floor.floor.id).await;
        fx.services
            .allocation
            .cancel_reservation(reservation_id)
            .await
            .unwrap();

        let err = fx
            .services
            .booking
            .create_booking(CreateBookingCommand {
                reservation_id: Some(reservation_id),
                ..booking_cmd(area.id, vehicle)
            })
            .await
            .unwrap_err();
        assert_eq!(err.code(), "RESERVATION_EXPIRED");
    }

    #[tokio::test]
    async fn explicit_slot_is_occupied_directly() {
        let fx = Fixture::new();
        let area = fx.area(10).await;
        let floor = fx.floor(area.id, 1, "Roda Dua", 3).await;
        let vehicle = fx.vehicle("Roda Dua");
        let target = fx.slots(floor.floor.id).await[2].clone();

        let summary = fx
            .services
            .booking
            .create_booking(CreateBookingCommand {
                slot_id: Some(target.id),
                ..booking_cmd(area.id, vehicle)
            })
            .await
            .unwrap();
        assert_eq!(summary.booking.slot_id, Some(target.id));
        assert_eq!(summary.booking.reservation_id, None);
        assert_eq!(fx.slot_status(target.id).await, SlotStatus::Occupied);

        let second = fx.vehicle("Roda Dua");
        let err = fx
            .services
            .booking
            .create_booking(CreateBookingCommand {
                slot_id: Some(target.id),
                ..booking_cmd(area.id, second)
            })
            .await
            .unwrap_err();
        assert_eq!(err.code(), "CONFLICT");
    }

    #[tokio::test]
    async fn explicit_slot_must_match_vehicle_type() {
        let fx = Fixture::new();
        let area = fx.area(10).await;
        let floor = fx.floor(area.id, 1, "Roda Empat", 1).await;
        let vehicle = fx.vehicle("Roda Dua");
        let target = fx.slots(floor.floor.id).await[0].clone();

        let err = fx
            .services
            .booking
            .create_booking(CreateBookingCommand {
                slot_id: Some(target.id),
                ..booking_cmd(area.id, vehicle)
            })
            .await
            .unwrap_err();
        assert_eq!(err.code(), "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn auto_assign_without_candidates_fails_with_no_slots() {
        let fx = Fixture::new();
        let area = fx.area(10).await;
        fx.floor(area.id, 1, "Roda Empat", 2).await;
        let vehicle = fx.vehicle("Roda Dua");

        let err = fx
            .services
            .booking
            .create_booking(booking_cmd(area.id, vehicle))
            .await
            .unwrap_err();
        assert_eq!(err.code(), "NO_SLOTS_AVAILABLE");
    }

    #[tokio::test]
    async fn vehicle_may_hold_one_active_booking() {
        let fx = Fixture::new();
        let area = fx.area(10).await;
        fx.floor(area.id, 1, "Roda Dua", 3).await;
        let vehicle = fx.vehicle("Roda Dua");

        fx.services
            .booking
            .create_booking(booking_cmd(area.id, vehicle))
            .await
            .unwrap();
        let err = fx
            .services
            .booking
            .create_booking(booking_cmd(area.id, vehicle))
            .await
            .unwrap_err();
        assert_eq!(err.code(), "CONFLICT");
    }

    #[tokio::test]
    async fn booking_duration_is_validated_before_anything_else() {
        let fx = Fixture::new();
        let err = fx
            .services
            .booking
            .create_booking(CreateBookingCommand {
                duration_minutes: 0,
                ..booking_cmd(1, 1)
            })
            .await
            .unwrap_err();
        assert_eq!(
            err,
            DomainError::validation("durasi_booking", "must be between 1 and 1440 minutes")
        );
    }

    #[tokio::test]
    async fn cancel_and_complete_free_the_slot_once() {
        let fx = Fixture::new();
        let area = fx.area(10).await;
        fx.floor(area.id, 1, "Roda Dua", 2).await;
        let first = fx.vehicle("Roda Dua");
        let second = fx.vehicle("Roda Dua");

        let a = fx
            .services
            .booking
            .create_booking(booking_cmd(area.id, first))
            .await
            .unwrap();
        let b = fx
            .services
            .booking
            .create_booking(booking_cmd(area.id, second))
            .await
            .unwrap();

        let cancelled = fx.services.booking.cancel_booking(a.booking.id).await.unwrap();
        assert_eq!(cancelled.booking.status, BookingStatus::Cancelled);
        assert_eq!(cancelled.slot.unwrap().status, SlotStatus::Available);

        let completed = fx.services.booking.complete_booking(b.booking.id).await.unwrap();
        assert_eq!(completed.booking.status, BookingStatus::Completed);
        assert_eq!(fx.occupancy_of_area(area.id).await.available, 2);

        let err = fx
            .services
            .booking
            .cancel_booking(b.booking.id)
            .await
            .unwrap_err();
        assert_eq!(err.code(), "ILLEGAL_TRANSITION");

        // A closed booking no longer blocks the vehicle.
        fx.services
            .booking
            .create_booking(booking_cmd(area.id, first))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn unknown_booking_is_not_found() {
        let fx = Fixture::new();
        let err = fx.services.booking.cancel_booking(77).await.unwrap_err();
        assert_eq!(err.code(), "NOT_FOUND");
    }
}
