//! Reservation domain entity
//!
//! A reservation is a short, time-boxed hold on exactly one slot. It starts
//! `active` and ends in one of three terminal states; the two that do not
//! become a booking (`expired`, `cancelled`) hand the slot back.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Duration, Utc};
use uuid::Uuid;

use crate::domain::inventory::SlotStatus;
use crate::domain::transition::{StatusMachine, Transition};
use crate::domain::DomainResult;
use crate::shared::errors::DomainError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ReservationStatus {
    /// Holding the slot, waiting for confirmation
    Active,
    /// Promoted into a booking
    Confirmed,
    /// Never confirmed; released by the sweeper
    Expired,
    /// Released by the user
    Cancelled,
}

impl StatusMachine for ReservationStatus {
    const ENTITY: &'static str = "reservation";

    fn as_str(&self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Confirmed => "confirmed",
            Self::Expired => "expired",
            Self::Cancelled => "cancelled",
        }
    }

    fn can_transition_to(self, next: Self) -> bool {
        self == Self::Active && next != Self::Active
    }
}

impl fmt::Display for ReservationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ReservationStatus {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "active" => Ok(Self::Active),
            "confirmed" => Ok(Self::Confirmed),
            "expired" => Ok(Self::Expired),
            "cancelled" => Ok(Self::Cancelled),
            other => Err(DomainError::validation(
                "status",
                format!("unknown reservation status '{other}'"),
            )),
        }
    }
}

/// Slot hold
#[derive(Debug, Clone, PartialEq)]
pub struct Reservation {
    /// Storage primary key (0 until persisted)
    pub id: i32,
    /// Public identity handed to clients
    pub reservation_id: Uuid,
    pub slot_id: i32,
    pub user_id: i32,
    /// Denormalized from the slot for floor-level lookups
    pub floor_id: i32,
    pub status: ReservationStatus,
    pub reserved_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub confirmed_at: Option<DateTime<Utc>>,
}

impl Reservation {
    /// A fresh `active` hold starting at `now`.
    pub fn hold(slot_id: i32, user_id: i32, floor_id: i32, now: DateTime<Utc>, hold: Duration) -> Self {
        Self {
            id: 0,
            reservation_id: Uuid::new_v4(),
            slot_id,
            user_id,
            floor_id,
            status: ReservationStatus::Active,
            reserved_at: now,
            expires_at: now + hold,
            confirmed_at: None,
        }
    }

    pub fn is_active(&self) -> bool {
        self.status == ReservationStatus::Active
    }

    /// The hold is over once `now` reaches `expires_at`.
    pub fn is_past_expiry(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }

    /// Plan the `active → confirmed` move together with the slot's
    /// `reserved → occupied` move.
    pub fn confirmation(&self, now: DateTime<Utc>) -> DomainResult<ReservationConfirmation> {
        if !self.is_active() || self.is_past_expiry(now) {
            return Err(DomainError::ReservationExpired(self.reservation_id.to_string()));
        }
        Ok(ReservationConfirmation {
            reservation_id: self.reservation_id,
            slot_id: self.slot_id,
            reservation: self.status.transition_to(ReservationStatus::Confirmed)?,
            slot: SlotStatus::Reserved.transition_to(SlotStatus::Occupied)?,
            confirmed_at: now,
        })
    }

    /// Plan an `active → expired` move. Only valid once the hold is over.
    pub fn expiry(&self, now: DateTime<Utc>) -> DomainResult<ReservationRelease> {
        if !self.is_past_expiry(now) {
            return Err(DomainError::Conflict(format!(
                "reservation {} is still within its hold window",
                self.reservation_id
            )));
        }
        self.release(ReservationStatus::Expired, now)
    }

    /// Plan an `active → cancelled` move.
    pub fn cancellation(&self, now: DateTime<Utc>) -> DomainResult<ReservationRelease> {
        self.release(ReservationStatus::Cancelled, now)
    }

    fn release(&self, to: ReservationStatus, now: DateTime<Utc>) -> DomainResult<ReservationRelease> {
        Ok(ReservationRelease {
            reservation_id: self.reservation_id,
            slot_id: self.slot_id,
            reservation: self.status.transition_to(to)?,
            slot: SlotStatus::Reserved.transition_to(SlotStatus::Available)?,
            at: now,
        })
    }
}

/// Everything storage needs to confirm a hold atomically.
#[derive(Debug, Clone, PartialEq)]
pub struct ReservationConfirmation {
    pub reservation_id: Uuid,
    pub slot_id: i32,
    pub reservation: Transition<ReservationStatus>,
    pub slot: Transition<SlotStatus>,
    pub confirmed_at: DateTime<Utc>,
}

/// Everything storage needs to end a hold and hand the slot back.
#[derive(Debug, Clone, PartialEq)]
pub struct ReservationRelease {
    pub reservation_id: Uuid,
    pub slot_id: i32,
    pub reservation: Transition<ReservationStatus>,
    pub slot: Transition<SlotStatus>,
    pub at: DateTime<Utc>,
}

/// Bounds on how long a hold may last.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HoldPolicy {
    pub default_minutes: i64,
    pub min_minutes: i64,
    pub max_minutes: i64,
    /// How many times allocation re-queries after losing a race.
    pub max_allocation_attempts: u32,
}

impl Default for HoldPolicy {
    fn default() -> Self {
        Self {
            default_minutes: 5,
            min_minutes: 1,
            max_minutes: 30,
            max_allocation_attempts: 5,
        }
    }
}

impl HoldPolicy {
    pub fn resolve(&self, requested_minutes: Option<i64>) -> DomainResult<Duration> {
        let minutes = requested_minutes.unwrap_or(self.default_minutes);
        if !(self.min_minutes..=self.max_minutes).contains(&minutes) {
            return Err(DomainError::validation(
                "duration_minutes",
                format!(
                    "must be between {} and {} minutes",
                    self.min_minutes, self.max_minutes
                ),
            ));
        }
        Ok(Duration::minutes(minutes))
    }
}

// ── Tests ──────────────────────────────────────────────────────
