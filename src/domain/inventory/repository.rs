//! Inventory repository interface

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use super::model::{
    Floor, NewFloor, NewParkingArea, NewSlot, ParkingArea, Slot, SlotScope, SlotStatus,
};
use crate::domain::transition::Transition;
use crate::domain::DomainResult;

#[async_trait]
pub trait InventoryRepository: Send + Sync {
    async fn create_area(&self, area: NewParkingArea) -> DomainResult<ParkingArea>;

    async fn find_area(&self, id: i32) -> DomainResult<Option<ParkingArea>>;

    /// Insert a floor together with all of its slots, atomically.
    async fn create_floor(&self, floor: NewFloor, slots: Vec<NewSlot>) -> DomainResult<Floor>;

    async fn find_floor(&self, id: i32) -> DomainResult<Option<Floor>>;

    /// All floors of an area regardless of status, ascending floor number.
    async fn list_floors(&self, area_id: i32) -> DomainResult<Vec<Floor>>;

    /// Delete a floor and its slots unless any slot is reserved or occupied.
    /// Returns `false` when the floor was busy (or already gone).
    async fn delete_floor_if_idle(&self, id: i32) -> DomainResult<bool>;

    async fn find_slot(&self, id: i32) -> DomainResult<Option<Slot>>;

    /// Slots of one floor ordered by code, optionally filtered by vehicle type.
    async fn list_slots(&self, floor_id: i32, vehicle_type: Option<&str>)
        -> DomainResult<Vec<Slot>>;

    /// Currently `available` slots in `scope` tagged with `vehicle_type`.
    async fn find_available_slots(
        &self,
        scope: SlotScope,
        vehicle_type: &str,
    ) -> DomainResult<Vec<Slot>>;

    /// Compare-and-swap a slot's status. `false` means the slot was not in
    /// `transition.from` any more.
    async fn transition_slot(
        &self,
        slot_id: i32,
        transition: Transition<SlotStatus>,
        at: DateTime<Utc>,
    ) -> DomainResult<bool>;
}
