//! Parking areas, floors and slots

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};

use crate::domain::transition::StatusMachine;
use crate::shared::errors::DomainError;

/// Slots per row when laying out generated slots on the display grid.
pub const LAYOUT_COLUMNS: i32 = 10;

// ── Parking area ───────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AreaStatus {
    Available,
    Closed,
}

impl AreaStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Available => "available",
            Self::Closed => "closed",
        }
    }
}

impl FromStr for AreaStatus {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "available" => Ok(Self::Available),
            "closed" => Ok(Self::Closed),
            other => Err(DomainError::validation(
                "status",
                format!("unknown parking area status '{other}'"),
            )),
        }
    }
}

/// A physical parking structure inside a mall.
#[derive(Debug, Clone, PartialEq)]
pub struct ParkingArea {
    pub id: i32,
    pub mall_id: i32,
    pub name: String,
    pub capacity: i32,
    pub status: AreaStatus,
    pub created_at: DateTime<Utc>,
}

impl ParkingArea {
    pub fn is_open(&self) -> bool {
        self.status == AreaStatus::Available
    }
}

#[derive(Debug, Clone)]
pub struct NewParkingArea {
    pub mall_id: i32,
    pub name: String,
    pub capacity: i32,
    pub status: AreaStatus,
    pub created_at: DateTime<Utc>,
}

// ── Floor ──────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FloorStatus {
    Active,
    Inactive,
    Maintenance,
}

impl FloorStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Inactive => "inactive",
            Self::Maintenance => "maintenance",
        }
    }
}

impl FromStr for FloorStatus {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "active" => Ok(Self::Active),
            "inactive" => Ok(Self::Inactive),
            "maintenance" => Ok(Self::Maintenance),
            other => Err(DomainError::validation(
                "status",
                format!("unknown floor status '{other}'"),
            )),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Floor {
    pub id: i32,
    pub parking_area_id: i32,
    /// Negative numbers are basements.
    pub floor_number: i32,
    pub name: String,
    /// `None` accepts any vehicle type.
    pub vehicle_type: Option<String>,
    pub total_slots: i32,
    /// Cached counter; reads that matter recount from the slots.
    pub available_slots: i32,
    pub status: FloorStatus,
    pub created_at: DateTime<Utc>,
}

impl Floor {
    pub fn is_active(&self) -> bool {
        self.status == FloorStatus::Active
    }

    pub fn accepts(&self, vehicle_type: &str) -> bool {
        self.vehicle_type
            .as_deref()
            .map_or(true, |restriction| restriction == vehicle_type)
    }
}

#[derive(Debug, Clone)]
pub struct NewFloor {
    pub parking_area_id: i32,
    pub floor_number: i32,
    pub name: String,
    pub vehicle_type: Option<String>,
    pub status: FloorStatus,
    pub created_at: DateTime<Utc>,
}

// ── Slot ───────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SlotStatus {
    Available,
    Reserved,
    Occupied,
    Maintenance,
}

impl SlotStatus {
    pub const ALL: [SlotStatus; 4] = [
        SlotStatus::Available,
        SlotStatus::Reserved,
        SlotStatus::Occupied,
        SlotStatus::Maintenance,
    ];
}

impl StatusMachine for SlotStatus {
    const ENTITY: &'static str = "slot";

    fn as_str(&self) -> &'static str {
        match self {
            Self::Available => "available",
            Self::Reserved => "reserved",
            Self::Occupied => "occupied",
            Self::Maintenance => "maintenance",
        }
    }

    fn can_transition_to(self, next: Self) -> bool {
        use SlotStatus::{Available, Maintenance, Occupied, Reserved};
        matches!(
            (self, next),
            (Available, Reserved)
                | (Available, Occupied)
                | (Reserved, Occupied)
                | (Reserved, Available)
                | (Occupied, Available)
                | (Maintenance, Available)
        ) || (next == Maintenance && self != Maintenance)
    }
}

impl fmt::Display for SlotStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SlotStatus {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| {
                DomainError::validation("status", format!("unknown slot status '{s}'"))
            })
    }
}

/// Display-only category derived from a slot's vehicle-type tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlotType {
    Regular,
    DisableFriendly,
}

impl SlotType {
    pub fn from_vehicle_type(tag: &str) -> Self {
        let normalized = tag.trim().to_ascii_lowercase().replace(['-', ' '], "_");
        match normalized.as_str() {
            "disable_friendly" | "disabled" | "difabel" | "disabilitas" => Self::DisableFriendly,
            _ => Self::Regular,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Regular => "regular",
            Self::DisableFriendly => "disable_friendly",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Slot {
    pub id: i32,
    pub floor_id: i32,
    /// Human-readable code, unique across the system (e.g. "A-001").
    pub code: String,
    pub vehicle_type: String,
    pub position_x: i32,
    pub position_y: i32,
    pub status: SlotStatus,
    pub updated_at: DateTime<Utc>,
}

impl Slot {
    pub fn slot_type(&self) -> SlotType {
        SlotType::from_vehicle_type(&self.vehicle_type)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewSlot {
    pub code: String,
    pub vehicle_type: String,
    pub position_x: i32,
    pub position_y: i32,
}

/// Generate `count` slots coded `<prefix>-001`, `<prefix>-002`, … laid out
/// row-major on a [`LAYOUT_COLUMNS`]-wide grid.
pub fn generate_slot_layout(prefix: &str, count: i32, vehicle_type: &str) -> Vec<NewSlot> {
    (0..count.max(0))
        .map(|i| NewSlot {
            code: format!("{}-{:03}", prefix, i + 1),
            vehicle_type: vehicle_type.to_string(),
            position_x: i % LAYOUT_COLUMNS,
            position_y: i / LAYOUT_COLUMNS,
        })
        .collect()
}

/// Which slots an allocation may draw from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlotScope {
    Floor(i32),
    /// Every active floor of the area that accepts the vehicle type.
    Area(i32),
}

/// Live slot counts for one floor.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FloorOccupancy {
    pub total: i32,
    pub available: i32,
    pub reserved: i32,
    pub occupied: i32,
    pub maintenance: i32,
}

impl FloorOccupancy {
    pub fn tally<'a>(slots: impl IntoIterator<Item = &'a Slot>) -> Self {
        slots.into_iter().fold(Self::default(), |mut acc, slot| {
            acc.total += 1;
            match slot.status {
                SlotStatus::Available => acc.available += 1,
                SlotStatus::Reserved => acc.reserved += 1,
                SlotStatus::Occupied => acc.occupied += 1,
                SlotStatus::Maintenance => acc.maintenance += 1,
            }
            acc
        })
    }
}

// ── Tests ──────────────────────────────────────────────────────
