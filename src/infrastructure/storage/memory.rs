//! In-memory storage implementation
//!
//! All parking state sits behind one async mutex, so every repository call is
//! atomic with respect to every other. Vehicles are collaborator data that is
//! only read here and live in their own map.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicI32, Ordering};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use tokio::sync::Mutex;
use tracing::warn;
use uuid::Uuid;

use crate::domain::booking::{Booking, BookingClosure, BookingRepository, NewBooking};
use crate::domain::inventory::{
    Floor, InventoryRepository, NewFloor, NewParkingArea, NewSlot, ParkingArea, Slot, SlotScope,
    SlotStatus,
};
use crate::domain::reservation::{
    Reservation, ReservationConfirmation, ReservationRelease, ReservationRepository,
    ReservationStatus,
};
use crate::domain::vehicle::{Vehicle, VehicleRepository};
use crate::domain::{DomainError, DomainResult, RepositoryProvider, Transition};

#[derive(Default)]
struct ParkingState {
    areas: BTreeMap<i32, ParkingArea>,
    floors: BTreeMap<i32, Floor>,
    slots: BTreeMap<i32, Slot>,
    reservations: BTreeMap<i32, Reservation>,
    bookings: BTreeMap<i32, Booking>,
}

impl ParkingState {
    fn reservation_mut(&mut self, reservation_id: Uuid) -> Option<&mut Reservation> {
        self.reservations
            .values_mut()
            .find(|r| r.reservation_id == reservation_id)
    }

    fn active_booking_for(&self, vehicle_id: i32) -> Option<&Booking> {
        self.bookings
            .values()
            .find(|b| b.vehicle_id == vehicle_id && b.is_active())
    }

    /// Apply a slot CAS. `false` when the slot is gone or not in `from`.
    fn move_slot(&mut self, slot_id: i32, t: Transition<SlotStatus>, at: DateTime<Utc>) -> bool {
        let Some(slot) = self.slots.get_mut(&slot_id) else {
            return false;
        };
        if slot.status != t.from {
            return false;
        }
        slot.status = t.to;
        slot.updated_at = at;
        let floor_id = slot.floor_id;
        self.refresh_available(floor_id);
        true
    }

    fn refresh_available(&mut self, floor_id: i32) {
        let available = self
            .slots
            .values()
            .filter(|s| s.floor_id == floor_id && s.status == SlotStatus::Available)
            .count() as i32;
        if let Some(floor) = self.floors.get_mut(&floor_id) {
            floor.available_slots = available;
        }
    }

    fn insert_booking(&mut self, id: i32, booking: NewBooking) -> Booking {
        let booking = booking.into_booking(id);
        self.bookings.insert(id, booking.clone());
        booking
    }
}

/// In-memory storage for development and testing
pub struct InMemoryRepositoryProvider {
    state: Mutex<ParkingState>,
    vehicles: DashMap<i32, Vehicle>,
    area_counter: AtomicI32,
    floor_counter: AtomicI32,
    slot_counter: AtomicI32,
    reservation_counter: AtomicI32,
    booking_counter: AtomicI32,
    vehicle_counter: AtomicI32,
}

impl InMemoryRepositoryProvider {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(ParkingState::default()),
            vehicles: DashMap::new(),
            area_counter: AtomicI32::new(1),
            floor_counter: AtomicI32::new(1),
            slot_counter: AtomicI32::new(1),
            reservation_counter: AtomicI32::new(1),
            booking_counter: AtomicI32::new(1),
            vehicle_counter: AtomicI32::new(1),
        }
    }

    /// Register a vehicle record; returns its id.
    pub fn add_vehicle(&self, user_id: i32, plate_number: &str, vehicle_type: &str) -> i32 {
        let id = self.vehicle_counter.fetch_add(1, Ordering::SeqCst);
        self.vehicles.insert(
            id,
            Vehicle {
                id,
                user_id,
                plate_number: plate_number.to_string(),
                vehicle_type: vehicle_type.to_string(),
            },
        );
        id
    }
}

impl Default for InMemoryRepositoryProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl RepositoryProvider for InMemoryRepositoryProvider {
    fn inventory(&self) -> &dyn InventoryRepository {
        self
    }

    fn reservations(&self) -> &dyn ReservationRepository {
        self
    }

    fn bookings(&self) -> &dyn BookingRepository {
        self
    }

    fn vehicles(&self) -> &dyn VehicleRepository {
        self
    }
}

// ── Inventory ──────────────────────────────────────────────────

#[async_trait]
impl InventoryRepository for InMemoryRepositoryProvider {
    async fn create_area(&self, area: NewParkingArea) -> DomainResult<ParkingArea> {
        let id = self.area_counter.fetch_add(1, Ordering::SeqCst);
        let area = ParkingArea {
            id,
            mall_id: area.mall_id,
            name: area.name,
            capacity: area.capacity,
            status: area.status,
            created_at: area.created_at,
        };
        self.state.lock().await.areas.insert(id, area.clone());
        Ok(area)
    }

    async fn find_area(&self, id: i32) -> DomainResult<Option<ParkingArea>> {
        Ok(self.state.lock().await.areas.get(&id).cloned())
    }

    async fn create_floor(&self, floor: NewFloor, slots: Vec<NewSlot>) -> DomainResult<Floor> {
        let mut state = self.state.lock().await;

        if !state.areas.contains_key(&floor.parking_area_id) {
            return Err(DomainError::not_found("ParkingArea", "id", floor.parking_area_id));
        }
        if state.floors.values().any(|f| {
            f.parking_area_id == floor.parking_area_id && f.floor_number == floor.floor_number
        }) {
            return Err(DomainError::Conflict(format!(
                "floor {} already exists in parking area {}",
                floor.floor_number, floor.parking_area_id
            )));
        }
        if let Some(taken) = slots
            .iter()
            .find(|new| state.slots.values().any(|s| s.code == new.code))
        {
            return Err(DomainError::Conflict(format!(
                "slot code {} is already in use",
                taken.code
            )));
        }

        let id = self.floor_counter.fetch_add(1, Ordering::SeqCst);
        let total = slots.len() as i32;
        for new in slots {
            let slot_id = self.slot_counter.fetch_add(1, Ordering::SeqCst);
            state.slots.insert(
                slot_id,
                Slot {
                    id: slot_id,
                    floor_id: id,
                    code: new.code,
                    vehicle_type: new.vehicle_type,
                    position_x: new.position_x,
                    position_y: new.position_y,
                    status: SlotStatus::Available,
                    updated_at: floor.created_at,
                },
            );
        }

        let floor = Floor {
            id,
            parking_area_id: floor.parking_area_id,
            floor_number: floor.floor_number,
            name: floor.name,
            vehicle_type: floor.vehicle_type,
            total_slots: total,
            available_slots: total,
            status: floor.status,
            created_at: floor.created_at,
        };
        state.floors.insert(id, floor.clone());
        Ok(floor)
    }

    async fn find_floor(&self, id: i32) -> DomainResult<Option<Floor>> {
        Ok(self.state.lock().await.floors.get(&id).cloned())
    }

    async fn list_floors(&self, area_id: i32) -> DomainResult<Vec<Floor>> {
        let state = self.state.lock().await;
        let mut floors: Vec<Floor> = state
            .floors
            .values()
            .filter(|f| f.parking_area_id == area_id)
            .cloned()
            .collect();
        floors.sort_by_key(|f| f.floor_number);
        Ok(floors)
    }

    async fn delete_floor_if_idle(&self, id: i32) -> DomainResult<bool> {
        let mut state = self.state.lock().await;
        if !state.floors.contains_key(&id) {
            return Ok(false);
        }
        let busy = state.slots.values().any(|s| {
            s.floor_id == id && matches!(s.status, SlotStatus::Reserved | SlotStatus::Occupied)
        });
        if busy {
            return Ok(false);
        }

        let slot_ids: Vec<i32> = state
            .slots
            .values()
            .filter(|s| s.floor_id == id)
            .map(|s| s.id)
            .collect();
        for slot_id in &slot_ids {
            state.slots.remove(slot_id);
        }
        state.reservations.retain(|_, r| !slot_ids.contains(&r.slot_id));
        for booking in state.bookings.values_mut() {
            if booking.slot_id.is_some_and(|s| slot_ids.contains(&s)) {
                booking.slot_id = None;
            }
        }
        state.floors.remove(&id);
        Ok(true)
    }

    async fn find_slot(&self, id: i32) -> DomainResult<Option<Slot>> {
        Ok(self.state.lock().await.slots.get(&id).cloned())
    }

    async fn list_slots(
        &self,
        floor_id: i32,
        vehicle_type: Option<&str>,
    ) -> DomainResult<Vec<Slot>> {
        let state = self.state.lock().await;
        let mut slots: Vec<Slot> = state
            .slots
            .values()
            .filter(|s| s.floor_id == floor_id)
            .filter(|s| vehicle_type.map_or(true, |vt| s.vehicle_type == vt))
            .cloned()
            .collect();
        slots.sort_by(|a, b| a.code.cmp(&b.code));
        Ok(slots)
    }

    async fn find_available_slots(
        &self,
        scope: SlotScope,
        vehicle_type: &str,
    ) -> DomainResult<Vec<Slot>> {
        let state = self.state.lock().await;
        let in_scope = |floor_id: i32| match scope {
            SlotScope::Floor(id) => floor_id == id,
            SlotScope::Area(area_id) => state.floors.get(&floor_id).is_some_and(|f| {
                f.parking_area_id == area_id && f.is_active() && f.accepts(vehicle_type)
            }),
        };
        Ok(state
            .slots
            .values()
            .filter(|s| {
                s.status == SlotStatus::Available
                    && s.vehicle_type == vehicle_type
                    && in_scope(s.floor_id)
            })
            .cloned()
            .collect())
    }

    async fn transition_slot(
        &self,
        slot_id: i32,
        transition: Transition<SlotStatus>,
        at: DateTime<Utc>,
    ) -> DomainResult<bool> {
        Ok(self.state.lock().await.move_slot(slot_id, transition, at))
    }
}

// ── Reservations ───────────────────────────────────────────────

#[async_trait]
impl ReservationRepository for InMemoryRepositoryProvider {
    async fn hold_slot(&self, reservation: Reservation) -> DomainResult<Option<Reservation>> {
        let mut state = self.state.lock().await;

        let already_held = state
            .reservations
            .values()
            .any(|r| r.slot_id == reservation.slot_id && r.is_active());
        if already_held {
            return Ok(None);
        }
        let reserve = Transition {
            from: SlotStatus::Available,
            to: SlotStatus::Reserved,
        };
        if !state.move_slot(reservation.slot_id, reserve, reservation.reserved_at) {
            return Ok(None);
        }

        let id = self.reservation_counter.fetch_add(1, Ordering::SeqCst);
        let reservation = Reservation { id, ..reservation };
        state.reservations.insert(id, reservation.clone());
        Ok(Some(reservation))
    }

    async fn find_by_reservation_id(
        &self,
        reservation_id: Uuid,
    ) -> DomainResult<Option<Reservation>> {
        let state = self.state.lock().await;
        Ok(state
            .reservations
            .values()
            .find(|r| r.reservation_id == reservation_id)
            .cloned())
    }

    async fn find_expired_active(&self, now: DateTime<Utc>) -> DomainResult<Vec<Reservation>> {
        let state = self.state.lock().await;
        Ok(state
            .reservations
            .values()
            .filter(|r| r.is_active() && r.is_past_expiry(now))
            .cloned()
            .collect())
    }

    async fn release(&self, release: ReservationRelease) -> DomainResult<bool> {
        let mut state = self.state.lock().await;

        let Some(reservation) = state.reservation_mut(release.reservation_id) else {
            return Ok(false);
        };
        if reservation.status != release.reservation.from {
            return Ok(false);
        }
        reservation.status = release.reservation.to;

        if !state.move_slot(release.slot_id, release.slot, release.at) {
            warn!(
                reservation_id = %release.reservation_id,
                slot_id = release.slot_id,
                "Released reservation's slot was not reserved"
            );
        }
        Ok(true)
    }

    async fn purge_finished(&self, before: DateTime<Utc>) -> DomainResult<u64> {
        let mut state = self.state.lock().await;
        let referenced: Vec<Uuid> = state
            .bookings
            .values()
            .filter_map(|b| b.reservation_id)
            .collect();

        let before_len = state.reservations.len();
        state.reservations.retain(|_, r| {
            let finished = matches!(
                r.status,
                ReservationStatus::Expired | ReservationStatus::Cancelled
            );
            !(finished && r.expires_at < before && !referenced.contains(&r.reservation_id))
        });
        Ok((before_len - state.reservations.len()) as u64)
    }
}

// ── Bookings ───────────────────────────────────────────────────

#[async_trait]
impl BookingRepository for InMemoryRepositoryProvider {
    async fn confirm_reservation(
        &self,
        confirmation: ReservationConfirmation,
        booking: NewBooking,
    ) -> DomainResult<Option<Booking>> {
        let mut state = self.state.lock().await;

        let still_active = state
            .reservations
            .values()
            .any(|r| {
                r.reservation_id == confirmation.reservation_id
                    && r.status == confirmation.reservation.from
            });
        if !still_active {
            return Ok(None);
        }
        if state.active_booking_for(booking.vehicle_id).is_some() {
            return Err(DomainError::Conflict(format!(
                "vehicle {} already has an active booking",
                booking.vehicle_id
            )));
        }
        if !state.move_slot(confirmation.slot_id, confirmation.slot, confirmation.confirmed_at) {
            return Err(DomainError::Conflict(format!(
                "slot {} is no longer held by reservation {}",
                confirmation.slot_id, confirmation.reservation_id
            )));
        }

        if let Some(reservation) = state.reservation_mut(confirmation.reservation_id) {
            reservation.status = confirmation.reservation.to;
            reservation.confirmed_at = Some(confirmation.confirmed_at);
        }
        let id = self.booking_counter.fetch_add(1, Ordering::SeqCst);
        Ok(Some(state.insert_booking(id, booking)))
    }

    async fn occupy_slot(
        &self,
        slot: Transition<SlotStatus>,
        booking: NewBooking,
    ) -> DomainResult<Option<Booking>> {
        let mut state = self.state.lock().await;

        if state.active_booking_for(booking.vehicle_id).is_some() {
            return Err(DomainError::Conflict(format!(
                "vehicle {} already has an active booking",
                booking.vehicle_id
            )));
        }
        if !state.move_slot(booking.slot_id, slot, booking.created_at) {
            return Ok(None);
        }

        let id = self.booking_counter.fetch_add(1, Ordering::SeqCst);
        Ok(Some(state.insert_booking(id, booking)))
    }

    async fn find_by_id(&self, id: i32) -> DomainResult<Option<Booking>> {
        Ok(self.state.lock().await.bookings.get(&id).cloned())
    }

    async fn find_active_for_vehicle(&self, vehicle_id: i32) -> DomainResult<Option<Booking>> {
        Ok(self.state.lock().await.active_booking_for(vehicle_id).cloned())
    }

    async fn close(&self, closure: BookingClosure) -> DomainResult<bool> {
        let mut state = self.state.lock().await;

        let Some(booking) = state.bookings.get_mut(&closure.booking_id) else {
            return Ok(false);
        };
        if booking.status != closure.booking.from {
            return Ok(false);
        }
        booking.status = closure.booking.to;

        if let Some((slot_id, transition)) = closure.slot {
            if !state.move_slot(slot_id, transition, closure.at) {
                warn!(booking_id = closure.booking_id, slot_id, "Closed booking's slot was not occupied");
            }
        }
        Ok(true)
    }
}

// ── Vehicles ───────────────────────────────────────────────────

#[async_trait]
impl VehicleRepository for InMemoryRepositoryProvider {
    async fn find_by_id(&self, id: i32) -> DomainResult<Option<Vehicle>> {
        Ok(self.vehicles.get(&id).map(|v| v.value().clone()))
    }
}

// ── Test hooks ─────────────────────────────────────────────────

#[cfg(test)]
impl InMemoryRepositoryProvider {
    pub(crate) async fn set_area_status(&self, id: i32, status: crate::domain::inventory::AreaStatus) {
        if let Some(area) = self.state.lock().await.areas.get_mut(&id) {
            area.status = status;
        }
    }

    pub(crate) async fn set_floor_status(&self, id: i32, status: crate::domain::inventory::FloorStatus) {
        if let Some(floor) = self.state.lock().await.floors.get_mut(&id) {
            floor.status = status;
        }
    }

    /// Add a slot outside the generated layout.
    pub(crate) async fn add_slot(&self, floor_id: i32, code: &str, vehicle_type: &str) -> i32 {
        let mut state = self.state.lock().await;
        let id = self.slot_counter.fetch_add(1, Ordering::SeqCst);
        state.slots.insert(
            id,
            Slot {
                id,
                floor_id,
                code: code.to_string(),
                vehicle_type: vehicle_type.to_string(),
                position_x: 0,
                position_y: 0,
                status: SlotStatus::Available,
                updated_at: Utc::now(),
            },
        );
        if let Some(floor) = state.floors.get_mut(&floor_id) {
            floor.total_slots += 1;
        }
        state.refresh_available(floor_id);
        id
    }

    /// Overwrite a slot's status without any transition check.
    pub(crate) async fn force_slot_status(&self, slot_id: i32, status: SlotStatus) {
        let mut state = self.state.lock().await;
        let Some(slot) = state.slots.get_mut(&slot_id) else {
            return;
        };
        slot.status = status;
        let floor_id = slot.floor_id;
        state.refresh_available(floor_id);
    }

    pub(crate) async fn reservation(&self, reservation_id: Uuid) -> Option<Reservation> {
        self.find_by_reservation_id(reservation_id).await.ok().flatten()
    }

    /// Number of `active` reservations per slot that has any.
    pub(crate) async fn active_reservations_per_slot(&self) -> std::collections::HashMap<i32, usize> {
        let state = self.state.lock().await;
        let mut counts = std::collections::HashMap::new();
        for r in state.reservations.values().filter(|r| r.is_active()) {
            *counts.entry(r.slot_id).or_insert(0) += 1;
        }
        counts
    }

    pub(crate) async fn bookings_for_reservation(&self, reservation_id: Uuid) -> usize {
        let state = self.state.lock().await;
        state
            .bookings
            .values()
            .filter(|b| b.reservation_id == Some(reservation_id))
            .count()
    }

    pub(crate) async fn all_bookings(&self) -> Vec<Booking> {
        self.state.lock().await.bookings.values().cloned().collect()
    }
}

// ── Tests ──────────────────────────────────────────────────────
