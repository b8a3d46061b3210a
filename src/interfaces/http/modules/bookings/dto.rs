//! Booking DTOs

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::application::parking::{BookingSummary, CreateBookingCommand};
use crate::domain::DomainError;

/// Create a booking from a hold, an explicit slot, or by auto-assignment
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateBookingRequest {
    /// Parking area ID
    #[validate(range(min = 1, message = "must be a positive id"))]
    pub id_parkiran: i32,
    /// Vehicle ID
    #[validate(range(min = 1, message = "must be a positive id"))]
    pub id_kendaraan: i32,
    /// Start time, RFC 3339 or `YYYY-MM-DD HH:MM:SS` (UTC)
    #[validate(length(min = 1))]
    pub waktu_mulai: String,
    /// Booking length in minutes
    pub durasi_booking: i64,
    /// Slot to occupy directly (must match the reservation's slot when both are sent)
    #[validate(range(min = 1, message = "must be a positive id"))]
    pub id_slot: Option<i32>,
    /// Hold to confirm
    pub reservation_id: Option<String>,
}

fn parse_start_time(raw: &str) -> Result<DateTime<Utc>, DomainError> {
    let raw = raw.trim();
    if let Ok(t) = DateTime::parse_from_rfc3339(raw) {
        return Ok(t.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S")
        .map(|t| t.and_utc())
        .map_err(|_| {
            DomainError::validation(
                "waktu_mulai",
                "expected RFC 3339 or YYYY-MM-DD HH:MM:SS",
            )
        })
}

impl CreateBookingRequest {
    pub fn into_command(self) -> Result<CreateBookingCommand, DomainError> {
        let start_time = parse_start_time(&self.waktu_mulai)?;
        let reservation_id = self
            .reservation_id
            .as_deref()
            .map(str::trim)
            .filter(|raw| !raw.is_empty())
            .map(|raw| {
                Uuid::parse_str(raw).map_err(|_| {
                    DomainError::InvalidReservation(format!("reservation {} does not exist", raw))
                })
            })
            .transpose()?;
        Ok(CreateBookingCommand {
            parking_area_id: self.id_parkiran,
            vehicle_id: self.id_kendaraan,
            start_time,
            duration_minutes: self.durasi_booking,
            slot_id: self.id_slot,
            reservation_id,
        })
    }
}

/// Booking with the slot it holds
#[derive(Debug, Serialize, ToSchema)]
pub struct BookingDto {
    pub id_booking: i32,
    pub id_parkiran: i32,
    pub id_kendaraan: i32,
    pub id_slot: Option<i32>,
    pub slot_code: Option<String>,
    pub reservation_id: Option<String>,
    pub waktu_mulai: String,
    pub waktu_selesai: String,
    pub durasi_booking: i32,
    /// `confirmed`, `completed`, `expired` or `cancelled`
    pub status: String,
    pub created_at: String,
}

impl From<BookingSummary> for BookingDto {
    fn from(s: BookingSummary) -> Self {
        let b = s.booking;
        Self {
            id_booking: b.id,
            id_parkiran: b.parking_area_id,
            id_kendaraan: b.vehicle_id,
            id_slot: b.slot_id,
            slot_code: s.slot.map(|slot| slot.code),
            reservation_id: b.reservation_id.map(|id| id.to_string()),
            waktu_mulai: b.start_time.to_rfc3339(),
            waktu_selesai: b.end_time.to_rfc3339(),
            durasi_booking: b.duration_minutes,
            status: b.status.to_string(),
            created_at: b.created_at.to_rfc3339(),
        }
    }
}
