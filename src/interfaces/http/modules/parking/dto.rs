//! Parking inventory and reservation DTOs

use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

use crate::application::parking::{FloorSummary, ReservationSummary, SlotView, SweepReport};
use crate::domain::inventory::ParkingArea;
use crate::domain::Slot;

// ── Requests ───────────────────────────────────────────────────

/// Hold a random available slot on a floor
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct ReserveRandomSlotRequest {
    #[validate(range(min = 1, message = "must be a positive id"))]
    pub id_floor: i32,
    #[validate(range(min = 1, message = "must be a positive id"))]
    pub id_user: i32,
    /// Vehicle-type tag the slot must carry (e.g. "Roda Dua", "Roda Empat")
    #[validate(length(min = 1, max = 50))]
    pub vehicle_type: String,
    /// Hold length in minutes, 1–30. Defaults to 5.
    pub duration_minutes: Option<i64>,
}

/// Optional vehicle-type filter for the slot visualization
#[derive(Debug, Deserialize, IntoParams)]
pub struct SlotFilterQuery {
    pub vehicle_type: Option<String>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateAreaRequest {
    #[validate(range(min = 1, message = "must be a positive id"))]
    pub mall_id: i32,
    #[validate(length(min = 1, max = 100))]
    pub name: String,
    /// Maximum number of slots across all floors
    #[validate(range(min = 1, message = "must be at least 1"))]
    pub capacity: i32,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateFloorRequest {
    pub floor_number: i32,
    #[validate(length(min = 1, max = 100))]
    pub name: String,
    /// Restrict the whole floor to one vehicle type
    #[validate(length(min = 1, max = 50))]
    pub vehicle_type: Option<String>,
    /// Tag given to every generated slot
    #[validate(length(min = 1, max = 50))]
    pub slot_vehicle_type: String,
    #[validate(range(min = 1, message = "must be at least 1"))]
    pub slot_count: i32,
    /// Slot code prefix; generated from the area and floor when omitted
    #[validate(length(min = 1, max = 10))]
    pub code_prefix: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct SlotMaintenanceRequest {
    /// `true` takes an available slot out of service, `false` returns it
    pub maintenance: bool,
}

// ── Responses ──────────────────────────────────────────────────

/// Floor with live slot counts
#[derive(Debug, Serialize, ToSchema)]
pub struct FloorDto {
    pub id_floor: i32,
    pub id_parkiran: i32,
    pub floor_number: i32,
    pub floor_name: String,
    pub vehicle_type: Option<String>,
    pub status: String,
    pub total: i32,
    pub available: i32,
    pub reserved: i32,
    pub occupied: i32,
    pub maintenance: i32,
}

impl From<FloorSummary> for FloorDto {
    fn from(s: FloorSummary) -> Self {
        Self {
            id_floor: s.floor.id,
            id_parkiran: s.floor.parking_area_id,
            floor_number: s.floor.floor_number,
            floor_name: s.floor.name,
            vehicle_type: s.floor.vehicle_type,
            status: s.floor.status.as_str().to_string(),
            total: s.occupancy.total,
            available: s.occupancy.available,
            reserved: s.occupancy.reserved,
            occupied: s.occupancy.occupied,
            maintenance: s.occupancy.maintenance,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct SlotDto {
    pub id_slot: i32,
    pub id_floor: i32,
    pub code: String,
    pub vehicle_type: String,
    /// `regular` or `disable_friendly`
    pub slot_type: String,
    pub status: String,
    pub position_x: i32,
    pub position_y: i32,
}

impl From<SlotView> for SlotDto {
    fn from(v: SlotView) -> Self {
        let mut dto = Self::from(v.slot);
        dto.slot_type = v.slot_type.as_str().to_string();
        dto
    }
}

impl From<Slot> for SlotDto {
    fn from(s: Slot) -> Self {
        Self {
            id_slot: s.id,
            id_floor: s.floor_id,
            slot_type: s.slot_type().as_str().to_string(),
            code: s.code,
            vehicle_type: s.vehicle_type,
            status: s.status.to_string(),
            position_x: s.position_x,
            position_y: s.position_y,
        }
    }
}

/// A slot hold
#[derive(Debug, Serialize, ToSchema)]
pub struct ReservationDto {
    pub reservation_id: String,
    pub id_user: i32,
    pub id_slot: i32,
    pub slot_code: String,
    pub slot_type: String,
    pub id_floor: i32,
    pub floor_name: String,
    pub floor_number: i32,
    pub status: String,
    pub reserved_at: String,
    pub expires_at: String,
    pub confirmed_at: Option<String>,
}

impl From<ReservationSummary> for ReservationDto {
    fn from(s: ReservationSummary) -> Self {
        Self {
            reservation_id: s.reservation.reservation_id.to_string(),
            id_user: s.reservation.user_id,
            id_slot: s.slot.id,
            slot_code: s.slot.code,
            slot_type: s.slot_type.as_str().to_string(),
            id_floor: s.floor.id,
            floor_name: s.floor.name,
            floor_number: s.floor.floor_number,
            status: s.reservation.status.to_string(),
            reserved_at: s.reservation.reserved_at.to_rfc3339(),
            expires_at: s.reservation.expires_at.to_rfc3339(),
            confirmed_at: s.reservation.confirmed_at.map(|t| t.to_rfc3339()),
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct SweepReportDto {
    /// Holds moved to `expired` and their slots freed
    pub released: u32,
    /// Holds confirmed or cancelled while the sweep ran
    pub skipped: u32,
}

impl From<SweepReport> for SweepReportDto {
    fn from(r: SweepReport) -> Self {
        Self {
            released: r.released,
            skipped: r.skipped,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct AreaDto {
    pub id_parkiran: i32,
    pub mall_id: i32,
    pub name: String,
    pub capacity: i32,
    pub status: String,
    pub created_at: String,
}

impl From<ParkingArea> for AreaDto {
    fn from(a: ParkingArea) -> Self {
        Self {
            id_parkiran: a.id,
            mall_id: a.mall_id,
            name: a.name,
            capacity: a.capacity,
            status: a.status.as_str().to_string(),
            created_at: a.created_at.to_rfc3339(),
        }
    }
}
