//! Booking domain entity

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Duration, Utc};
use uuid::Uuid;

use crate::domain::inventory::SlotStatus;
use crate::domain::transition::{StatusMachine, Transition};
use crate::domain::DomainResult;
use crate::shared::errors::DomainError;

/// Longest booking window accepted, in minutes (one day).
pub const MAX_BOOKING_MINUTES: i64 = 24 * 60;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BookingStatus {
    Confirmed,
    /// `selesai` in the mobile client vocabulary
    Completed,
    Expired,
    Cancelled,
}

impl StatusMachine for BookingStatus {
    const ENTITY: &'static str = "booking";

    fn as_str(&self) -> &'static str {
        match self {
            Self::Confirmed => "confirmed",
            Self::Completed => "completed",
            Self::Expired => "expired",
            Self::Cancelled => "cancelled",
        }
    }

    fn can_transition_to(self, next: Self) -> bool {
        self == Self::Confirmed && next != Self::Confirmed
    }
}

impl fmt::Display for BookingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BookingStatus {
    type Err = DomainError;

    /// Accepts the legacy spellings used by older rows.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "confirmed" | "active" | "aktif" => Ok(Self::Confirmed),
            "completed" | "selesai" => Ok(Self::Completed),
            "expired" => Ok(Self::Expired),
            "cancelled" => Ok(Self::Cancelled),
            other => Err(DomainError::validation(
                "status",
                format!("unknown booking status '{other}'"),
            )),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Booking {
    pub id: i32,
    pub parking_area_id: i32,
    pub vehicle_id: i32,
    /// `None` only for legacy rows
    pub slot_id: Option<i32>,
    /// Set when the booking was promoted from a hold
    pub reservation_id: Option<Uuid>,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub duration_minutes: i32,
    pub status: BookingStatus,
    pub created_at: DateTime<Utc>,
}

impl Booking {
    pub fn is_active(&self) -> bool {
        self.status == BookingStatus::Confirmed
    }

    /// Plan closing this booking (`cancelled`, `completed`, `expired`) and
    /// freeing its slot, if it holds one.
    pub fn closure(&self, to: BookingStatus, now: DateTime<Utc>) -> DomainResult<BookingClosure> {
        let booking = self.status.transition_to(to)?;
        let slot = match self.slot_id {
            Some(slot_id) => Some((
                slot_id,
                SlotStatus::Occupied.transition_to(SlotStatus::Available)?,
            )),
            None => None,
        };
        Ok(BookingClosure {
            booking_id: self.id,
            booking,
            slot,
            at: now,
        })
    }
}

/// A booking about to be inserted.
#[derive(Debug, Clone, PartialEq)]
pub struct NewBooking {
    pub parking_area_id: i32,
    pub vehicle_id: i32,
    pub slot_id: i32,
    pub reservation_id: Option<Uuid>,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub duration_minutes: i32,
    pub created_at: DateTime<Utc>,
}

impl NewBooking {
    pub fn new(
        parking_area_id: i32,
        vehicle_id: i32,
        slot_id: i32,
        start_time: DateTime<Utc>,
        duration_minutes: i64,
        now: DateTime<Utc>,
    ) -> DomainResult<Self> {
        if !(1..=MAX_BOOKING_MINUTES).contains(&duration_minutes) {
            return Err(DomainError::validation(
                "durasi_booking",
                format!("must be between 1 and {MAX_BOOKING_MINUTES} minutes"),
            ));
        }
        Ok(Self {
            parking_area_id,
            vehicle_id,
            slot_id,
            reservation_id: None,
            start_time,
            end_time: start_time + Duration::minutes(duration_minutes),
            duration_minutes: duration_minutes as i32,
            created_at: now,
        })
    }

    pub fn with_reservation(mut self, reservation_id: Uuid) -> Self {
        self.reservation_id = Some(reservation_id);
        self
    }

    pub fn into_booking(self, id: i32) -> Booking {
        Booking {
            id,
            parking_area_id: self.parking_area_id,
            vehicle_id: self.vehicle_id,
            slot_id: Some(self.slot_id),
            reservation_id: self.reservation_id,
            start_time: self.start_time,
            end_time: self.end_time,
            duration_minutes: self.duration_minutes,
            status: BookingStatus::Confirmed,
            created_at: self.created_at,
        }
    }
}

/// Everything storage needs to close a booking atomically.
#[derive(Debug, Clone, PartialEq)]
pub struct BookingClosure {
    pub booking_id: i32,
    pub booking: Transition<BookingStatus>,
    pub slot: Option<(i32, Transition<SlotStatus>)>,
    pub at: DateTime<Utc>,
}

// ── Tests ──────────────────────────────────────────────────────
