//! Inventory Store service
//!
//! Read side of the floor/slot inventory (live occupancy counts, slot
//! visualization) plus the administrative operations that shape it.

use std::sync::Arc;

use tracing::info;

use crate::domain::inventory::{
    generate_slot_layout, AreaStatus, Floor, FloorOccupancy, FloorStatus, NewFloor,
    NewParkingArea, ParkingArea, Slot, SlotStatus, SlotType,
};
use crate::domain::{DomainResult, RepositoryProvider, StatusMachine};
use crate::shared::errors::DomainError;
use crate::shared::time::SharedClock;

/// Upper bound on slots generated for one floor in a single request.
pub const MAX_SLOTS_PER_FLOOR: i32 = 500;

/// Floor annotated with counts recomputed from its slots.
#[derive(Debug, Clone, PartialEq)]
pub struct FloorSummary {
    pub floor: Floor,
    pub occupancy: FloorOccupancy,
}

/// Slot as drawn on the floor map.
#[derive(Debug, Clone, PartialEq)]
pub struct SlotView {
    pub slot: Slot,
    pub slot_type: SlotType,
}

#[derive(Debug, Clone)]
pub struct CreateAreaCommand {
    pub mall_id: i32,
    pub name: String,
    pub capacity: i32,
}

#[derive(Debug, Clone)]
pub struct CreateFloorCommand {
    pub parking_area_id: i32,
    pub floor_number: i32,
    pub name: String,
    pub vehicle_type: Option<String>,
    /// Tag applied to every generated slot.
    pub slot_vehicle_type: String,
    pub slot_count: i32,
    pub code_prefix: Option<String>,
}

pub struct InventoryService {
    repos: Arc<dyn RepositoryProvider>,
    clock: SharedClock,
}

impl InventoryService {
    pub fn new(repos: Arc<dyn RepositoryProvider>, clock: SharedClock) -> Self {
        Self { repos, clock }
    }

    /// Active floors of an area, ascending floor number. Counts are derived
    /// from the slot rows on every call rather than the cached column.
    pub async fn list_floors(&self, area_id: i32) -> DomainResult<Vec<FloorSummary>> {
        let floors = self.repos.inventory().list_floors(area_id).await?;

        let mut summaries = Vec::with_capacity(floors.len());
        for floor in floors.into_iter().filter(Floor::is_active) {
            let slots = self.repos.inventory().list_slots(floor.id, None).await?;
            summaries.push(FloorSummary {
                occupancy: FloorOccupancy::tally(&slots),
                floor,
            });
        }
        summaries.sort_by_key(|s| s.floor.floor_number);
        Ok(summaries)
    }

    pub async fn list_slots(
        &self,
        floor_id: i32,
        vehicle_type: Option<&str>,
    ) -> DomainResult<Vec<SlotView>> {
        let filter = vehicle_type.map(str::trim).filter(|t| !t.is_empty());
        let slots = self.repos.inventory().list_slots(floor_id, filter).await?;
        Ok(slots
            .into_iter()
            .map(|slot| SlotView {
                slot_type: slot.slot_type(),
                slot,
            })
            .collect())
    }

    pub async fn create_area(&self, cmd: CreateAreaCommand) -> DomainResult<ParkingArea> {
        if cmd.capacity < 0 {
            return Err(DomainError::validation("capacity", "must not be negative"));
        }
        let name = cmd.name.trim();
        if name.is_empty() {
            return Err(DomainError::validation("name", "must not be empty"));
        }

        let area = self
            .repos
            .inventory()
            .create_area(NewParkingArea {
                mall_id: cmd.mall_id,
                name: name.to_string(),
                capacity: cmd.capacity,
                status: AreaStatus::Available,
                created_at: self.clock.now(),
            })
            .await?;
        info!(area_id = area.id, mall_id = area.mall_id, capacity = area.capacity, "Parking area created");
        Ok(area)
    }

    /// Create a floor and generate its slots. The area's capacity bounds the
    /// total number of slots across all of its floors.
    pub async fn create_floor(&self, cmd: CreateFloorCommand) -> DomainResult<FloorSummary> {
        if !(1..=MAX_SLOTS_PER_FLOOR).contains(&cmd.slot_count) {
            return Err(DomainError::validation(
                "slot_count",
                format!("must be between 1 and {MAX_SLOTS_PER_FLOOR}"),
            ));
        }
        let slot_vehicle_type = cmd.slot_vehicle_type.trim().to_string();
        if slot_vehicle_type.is_empty() {
            return Err(DomainError::validation("slot_vehicle_type", "must not be empty"));
        }
        let restriction = cmd
            .vehicle_type
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty());
        if let Some(restriction) = &restriction {
            if *restriction != slot_vehicle_type {
                return Err(DomainError::validation(
                    "slot_vehicle_type",
                    "must match the floor's vehicle type restriction",
                ));
            }
        }

        let area = self
            .repos
            .inventory()
            .find_area(cmd.parking_area_id)
            .await?
            .ok_or_else(|| DomainError::not_found("ParkingArea", "id", cmd.parking_area_id))?;

        let existing = self.repos.inventory().list_floors(area.id).await?;
        if existing.iter().any(|f| f.floor_number == cmd.floor_number) {
            return Err(DomainError::Conflict(format!(
                "floor {} already exists in parking area {}",
                cmd.floor_number, area.id
            )));
        }
        let used: i32 = existing.iter().map(|f| f.total_slots).sum();
        if used + cmd.slot_count > area.capacity {
            return Err(DomainError::validation(
                "slot_count",
                format!(
                    "parking area {} has room for {} more slots",
                    area.id,
                    (area.capacity - used).max(0)
                ),
            ));
        }

        let prefix = cmd
            .code_prefix
            .map(|p| p.trim().to_ascii_uppercase())
            .filter(|p| !p.is_empty())
            .unwrap_or_else(|| default_code_prefix(area.id, cmd.floor_number));
        let slots = generate_slot_layout(&prefix, cmd.slot_count, &slot_vehicle_type);

        let floor = self
            .repos
            .inventory()
            .create_floor(
                NewFloor {
                    parking_area_id: area.id,
                    floor_number: cmd.floor_number,
                    name: cmd.name.trim().to_string(),
                    vehicle_type: restriction,
                    status: FloorStatus::Active,
                    created_at: self.clock.now(),
                },
                slots,
            )
            .await?;

        info!(
            area_id = area.id,
            floor_id = floor.id,
            floor_number = floor.floor_number,
            slots = floor.total_slots,
            "Floor created"
        );

        let slots = self.repos.inventory().list_slots(floor.id, None).await?;
        Ok(FloorSummary {
            occupancy: FloorOccupancy::tally(&slots),
            floor,
        })
    }

    /// Delete a floor (and its slots). Refused while any slot is reserved or
    /// occupied.
    pub async fn delete_floor(&self, area_id: i32, floor_id: i32) -> DomainResult<()> {
        let floor = self
            .repos
            .inventory()
            .find_floor(floor_id)
            .await?
            .filter(|f| f.parking_area_id == area_id)
            .ok_or_else(|| DomainError::not_found("Floor", "id", floor_id))?;

        if !self.repos.inventory().delete_floor_if_idle(floor.id).await? {
            return Err(DomainError::Conflict(format!(
                "floor {floor_id} still has reserved or occupied slots"
            )));
        }
        info!(area_id, floor_id, "Floor deleted");
        Ok(())
    }

    /// Put a slot into maintenance (only from `available`, so live holds and
    /// bookings are never clobbered) or bring it back.
    pub async fn set_slot_maintenance(&self, slot_id: i32, maintenance: bool) -> DomainResult<Slot> {
        let slot = self
            .repos
            .inventory()
            .find_slot(slot_id)
            .await?
            .ok_or_else(|| DomainError::not_found("Slot", "id", slot_id))?;

        let target = if maintenance {
            SlotStatus::Maintenance
        } else {
            SlotStatus::Available
        };
        if slot.status == target {
            return Ok(slot);
        }
        if maintenance && slot.status != SlotStatus::Available {
            return Err(DomainError::Conflict(format!(
                "slot {} is {} and cannot enter maintenance",
                slot.code, slot.status
            )));
        }

        let transition = slot.status.transition_to(target)?;
        let now = self.clock.now();
        if !self
            .repos
            .inventory()
            .transition_slot(slot.id, transition, now)
            .await?
        {
            return Err(DomainError::Conflict(format!(
                "slot {} changed status concurrently",
                slot.code
            )));
        }
        info!(slot_id, code = %slot.code, status = target.as_str(), "Slot status changed");

        Ok(Slot {
            status: target,
            updated_at: now,
            ..slot
        })
    }
}

/// `A`, `B`, … for floors 0, 1, … and `B1`, `B2`, … for basements, prefixed
/// by the area so codes stay unique across areas.
fn default_code_prefix(area_id: i32, floor_number: i32) -> String {
    let floor_part = if floor_number < 0 {
        format!("B{}", -floor_number)
    } else {
        let letter = u8::try_from(floor_number % 26).unwrap_or(0);
        char::from(b'A' + letter).to_string()
    };
    format!("P{area_id}{floor_part}")
}

// ── Tests ──────────────────────────────────────────────────────
