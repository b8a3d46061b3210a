//! Allocation Engine
//!
//! Picks one available slot uniformly at random and places a time-boxed hold
//! on it. The pick is optimistic: storage performs the `available → reserved`
//! move as a compare-and-swap, and a lost race simply re-reads the candidate
//! pool.

use std::sync::Arc;

use rand::seq::SliceRandom;
use tracing::{debug, info};
use uuid::Uuid;

use crate::domain::events::{Event, ReservationCreatedEvent, ReservationReleasedEvent};
use crate::domain::inventory::{Floor, Slot, SlotScope, SlotStatus, SlotType};
use crate::domain::reservation::{HoldPolicy, Reservation};
use crate::domain::{DomainResult, RepositoryProvider, SharedNotificationSink, StatusMachine};
use crate::shared::errors::DomainError;
use crate::shared::time::SharedClock;

#[derive(Debug, Clone)]
pub struct ReserveSlotCommand {
    pub floor_id: i32,
    pub user_id: i32,
    pub vehicle_type: String,
    /// `None` uses the policy default.
    pub duration_minutes: Option<i64>,
}

/// A hold together with the slot and floor it refers to.
#[derive(Debug, Clone, PartialEq)]
pub struct ReservationSummary {
    pub reservation: Reservation,
    pub slot: Slot,
    pub floor: Floor,
    pub slot_type: SlotType,
}

/// Uniform pick over the candidate pool.
pub(crate) fn choose_slot(candidates: &[Slot]) -> Option<Slot> {
    candidates.choose(&mut rand::thread_rng()).cloned()
}

pub struct AllocationService {
    repos: Arc<dyn RepositoryProvider>,
    clock: SharedClock,
    notifier: SharedNotificationSink,
    policy: HoldPolicy,
}

impl AllocationService {
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

    pub fn policy(&self) -> &HoldPolicy {
        &self.policy
    }

    pub async fn reserve_random_slot(&self, cmd: ReserveSlotCommand) -> DomainResult<ReservationSummary> {
        let hold = self.policy.resolve(cmd.duration_minutes)?;
        let vehicle_type = cmd.vehicle_type.trim();
        if vehicle_type.is_empty() {
            return Err(DomainError::validation("vehicle_type", "must not be empty"));
        }

        let floor = self
            .repos
            .inventory()
            .find_floor(cmd.floor_id)
            .await?
            .ok_or_else(|| DomainError::not_found("Floor", "id", cmd.floor_id))?;

        let scope = format!("floor {}", floor.id);
        let area_open = self
            .repos
            .inventory()
            .find_area(floor.parking_area_id)
            .await?
            .is_some_and(|area| area.is_open());
        if !area_open || !floor.is_active() || !floor.accepts(vehicle_type) {
            debug!(floor_id = floor.id, vehicle_type, "Floor not eligible for allocation");
            metrics::counter!("parking_reservations_total", "outcome" => "no_slots").increment(1);
            return Err(DomainError::NoSlotsAvailable { scope });
        }

        for attempt in 1..=self.policy.max_allocation_attempts {
            let candidates = self
                .repos
                .inventory()
                .find_available_slots(SlotScope::Floor(floor.id), vehicle_type)
                .await?;
            let Some(slot) = choose_slot(&candidates) else {
                break;
            };

            let now = self.clock.now();
            let pending = Reservation::hold(slot.id, cmd.user_id, floor.id, now, hold);
            match self.repos.reservations().hold_slot(pending).await? {
                Some(reservation) => {
                    info!(
                        reservation_id = %reservation.reservation_id,
                        slot_id = slot.id,
                        code = %slot.code,
                        floor_id = floor.id,
                        user_id = cmd.user_id,
                        expires_at = %reservation.expires_at,
                        "Slot reserved"
                    );
                    metrics::counter!("parking_reservations_total", "outcome" => "created")
                        .increment(1);
                    self.notifier
                        .notify(Event::ReservationCreated(ReservationCreatedEvent {
                            reservation_id: reservation.reservation_id,
                            user_id: reservation.user_id,
                            slot_id: reservation.slot_id,
                            floor_id: reservation.floor_id,
                            expires_at: reservation.expires_at,
                        }));

                    let slot = Slot {
                        status: SlotStatus::Reserved,
                        updated_at: now,
                        ..slot
                    };
                    return Ok(ReservationSummary {
                        slot_type: slot.slot_type(),
                        reservation,
                        slot,
                        floor,
                    });
                }
                None => {
                    debug!(slot_id = slot.id, attempt, "Lost race for slot, re-reading candidates");
                    metrics::counter!("parking_reservations_total", "outcome" => "lost_race")
                        .increment(1);
                }
            }
        }

        debug!(floor_id = floor.id, vehicle_type, "No slot could be reserved");
        metrics::counter!("parking_reservations_total", "outcome" => "no_slots").increment(1);
        Err(DomainError::NoSlotsAvailable { scope })
    }

    pub async fn get_reservation(&self, reservation_id: Uuid) -> DomainResult<ReservationSummary> {
        let reservation = self
            .repos
            .reservations()
            .find_by_reservation_id(reservation_id)
            .await?
            .ok_or_else(|| DomainError::not_found("Reservation", "reservation_id", reservation_id))?;
        self.summarize(reservation).await
    }

    /// `active → cancelled`, handing the slot back.
    pub async fn cancel_reservation(&self, reservation_id: Uuid) -> DomainResult<ReservationSummary> {
        let reservation = self
            .repos
            .reservations()
            .find_by_reservation_id(reservation_id)
            .await?
            .ok_or_else(|| DomainError::not_found("Reservation", "reservation_id", reservation_id))?;

        let now = self.clock.now();
        let release = reservation.cancellation(now)?;
        if !self.repos.reservations().release(release.clone()).await? {
            // Confirmed or swept between the read and the write.
            let current = self
                .repos
                .reservations()
                .find_by_reservation_id(reservation_id)
                .await?
                .map_or(release.reservation.from, |r| r.status);
            return Err(DomainError::IllegalTransition {
                entity: "reservation",
                from: current.as_str(),
                to: release.reservation.to.as_str(),
            });
        }

        info!(%reservation_id, slot_id = release.slot_id, "Reservation cancelled");
        metrics::counter!("parking_reservations_released_total", "reason" => "cancelled")
            .increment(1);
        self.notifier
            .notify(Event::ReservationReleased(ReservationReleasedEvent {
                reservation_id,
                slot_id: release.slot_id,
                status: release.reservation.to.as_str().to_string(),
                timestamp: now,
            }));

        let cancelled = Reservation {
            status: release.reservation.to,
            ..reservation
        };
        self.summarize(cancelled).await
    }

    async fn summarize(&self, reservation: Reservation) -> DomainResult<ReservationSummary> {
        let slot = self
            .repos
            .inventory()
            .find_slot(reservation.slot_id)
            .await?
            .ok_or_else(|| DomainError::not_found("Slot", "id", reservation.slot_id))?;
        let floor = self
            .repos
            .inventory()
            .find_floor(reservation.floor_id)
            .await?
            .ok_or_else(|| DomainError::not_found("Floor", "id", reservation.floor_id))?;
        Ok(ReservationSummary {
            slot_type: slot.slot_type(),
            reservation,
            slot,
            floor,
        })
    }
}

// ── Tests ──────────────────────────────────────────────────────
