//! SeaORM implementation of RepositoryProvider

use sea_orm::DatabaseConnection;

use crate::domain::booking::BookingRepository;
use crate::domain::inventory::InventoryRepository;
use crate::domain::repositories::RepositoryProvider;
use crate::domain::reservation::ReservationRepository;
use crate::domain::vehicle::VehicleRepository;

use super::booking_repository::SeaOrmBookingRepository;
use super::inventory_repository::SeaOrmInventoryRepository;
use super::reservation_repository::SeaOrmReservationRepository;
use super::vehicle_repository::SeaOrmVehicleRepository;

/// Unified repository provider backed by SeaORM.
///
/// Holds one connection pool and exposes per-aggregate repository accessors.
///
/// ```ignore
/// let repos = SeaOrmRepositoryProvider::new(db.clone());
/// let floor = repos.inventory().find_floor(3).await?;
/// let booking = repos.bookings().find_active_for_vehicle(7).await?;
/// ```
pub struct SeaOrmRepositoryProvider {
    inventory: SeaOrmInventoryRepository,
    reservations: SeaOrmReservationRepository,
    bookings: SeaOrmBookingRepository,
    vehicles: SeaOrmVehicleRepository,
}

impl SeaOrmRepositoryProvider {
    pub fn new(db: DatabaseConnection) -> Self {
        Self {
            inventory: SeaOrmInventoryRepository::new(db.clone()),
            reservations: SeaOrmReservationRepository::new(db.clone()),
            bookings: SeaOrmBookingRepository::new(db.clone()),
            vehicles: SeaOrmVehicleRepository::new(db),
        }
    }
}

impl RepositoryProvider for SeaOrmRepositoryProvider {
    fn inventory(&self) -> &dyn InventoryRepository {
        &self.inventory
    }

    fn reservations(&self) -> &dyn ReservationRepository {
        &self.reservations
    }

    fn bookings(&self) -> &dyn BookingRepository {
        &self.bookings
    }

    fn vehicles(&self) -> &dyn VehicleRepository {
        &self.vehicles
    }
}

// ── Tests ──────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use chrono::{DateTime, Duration, Utc};
    use sea_orm::{ActiveModelTrait, ActiveValue::NotSet, DatabaseConnection, Set};

    use super::*;
    use crate::domain::booking::{BookingStatus, NewBooking};
    use crate::domain::inventory::{
        generate_slot_layout, AreaStatus, Floor, FloorStatus, NewFloor, NewParkingArea,
        SlotScope, SlotStatus,
    };
    use crate::domain::reservation::{Reservation, ReservationStatus};
    use crate::domain::{DomainError, StatusMachine};
    use crate::infrastructure::database::entities::{booking, vehicle};
    use crate::infrastructure::database::{init_and_migrate, DatabaseConfig};

    fn now() -> DateTime<Utc> {
        DateTime::parse_from_rfc3339("2025-03-01T10:00:00Z")
            .unwrap()
            .with_timezone(&Utc)
    }

    async fn setup() -> (DatabaseConnection, SeaOrmRepositoryProvider, Floor) {
        let db = init_and_migrate(&DatabaseConfig::sqlite_memory())
            .await
            .unwrap();
        let repos = SeaOrmRepositoryProvider::new(db.clone());

        let area = repos
            .inventory()
            .create_area(NewParkingArea {
                mall_id: 1,
                name: "Basement".into(),
                capacity: 10,
                status: AreaStatus::Available,
                created_at: now(),
            })
            .await
            .unwrap();
        let floor = repos
            .inventory()
            .create_floor(
                NewFloor {
                    parking_area_id: area.id,
                    floor_number: 1,
                    name: "Lantai 1".into(),
                    vehicle_type: None,
                    status: FloorStatus::Active,
                    created_at: now(),
                },
                generate_slot_layout("P1A", 3, "Roda Empat"),
            )
            .await
            .unwrap();
        (db, repos, floor)
    }

    async fn add_vehicle(db: &DatabaseConnection, plate: &str) -> i32 {
        vehicle::ActiveModel {
            id: NotSet,
            user_id: Set(7),
            plate_number: Set(plate.into()),
            vehicle_type: Set("Roda Empat".into()),
        }
        .insert(db)
        .await
        .unwrap()
        .id
    }

    async fn first_slot(repos: &SeaOrmRepositoryProvider, floor_id: i32) -> i32 {
        repos.inventory().list_slots(floor_id, None).await.unwrap()[0].id
    }

    async fn hold(repos: &SeaOrmRepositoryProvider, floor: &Floor, slot_id: i32) -> Option<Reservation> {
        let r = Reservation::hold(slot_id, 7, floor.id, now(), Duration::minutes(5));
        repos.reservations().hold_slot(r).await.unwrap()
    }

    #[tokio::test]
    async fn floor_is_created_with_all_slots_available() {
        let (_db, repos, floor) = setup().await;
        assert_eq!(floor.total_slots, 3);
        assert_eq!(floor.available_slots, 3);

        let slots = repos.inventory().list_slots(floor.id, None).await.unwrap();
        let codes: Vec<_> = slots.iter().map(|s| s.code.as_str()).collect();
        assert_eq!(codes, ["P1A-001", "P1A-002", "P1A-003"]);
        assert!(slots.iter().all(|s| s.status == SlotStatus::Available));
    }

    #[tokio::test]
    async fn duplicate_floor_number_is_a_conflict() {
        let (_db, repos, floor) = setup().await;
        let err = repos
            .inventory()
            .create_floor(
                NewFloor {
                    parking_area_id: floor.parking_area_id,
                    floor_number: 1,
                    name: "Again".into(),
                    vehicle_type: None,
                    status: FloorStatus::Active,
                    created_at: now(),
                },
                generate_slot_layout("P1X", 1, "Roda Empat"),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::Conflict(_)));
    }

    #[tokio::test]
    async fn hold_reserves_the_slot_and_refreshes_the_floor() {
        let (_db, repos, floor) = setup().await;
        let slot_id = first_slot(&repos, floor.id).await;

        let held = hold(&repos, &floor, slot_id).await.expect("hold granted");
        assert_eq!(held.status, ReservationStatus::Active);

        let slot = repos.inventory().find_slot(slot_id).await.unwrap().unwrap();
        assert_eq!(slot.status, SlotStatus::Reserved);
        let floor = repos.inventory().find_floor(floor.id).await.unwrap().unwrap();
        assert_eq!(floor.available_slots, 2);

        let found = repos
            .reservations()
            .find_by_reservation_id(held.reservation_id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(found.slot_id, slot_id);
    }

    #[tokio::test]
    async fn second_hold_on_the_same_slot_is_refused() {
        let (_db, repos, floor) = setup().await;
        let slot_id = first_slot(&repos, floor.id).await;

        assert!(hold(&repos, &floor, slot_id).await.is_some());
        assert!(hold(&repos, &floor, slot_id).await.is_none());
    }

    #[tokio::test]
    async fn available_slots_exclude_held_ones() {
        let (_db, repos, floor) = setup().await;
        let slot_id = first_slot(&repos, floor.id).await;
        hold(&repos, &floor, slot_id).await.unwrap();

        let by_floor = repos
            .inventory()
            .find_available_slots(SlotScope::Floor(floor.id), "Roda Empat")
            .await
            .unwrap();
        let by_area = repos
            .inventory()
            .find_available_slots(SlotScope::Area(floor.parking_area_id), "Roda Empat")
            .await
            .unwrap();
        assert_eq!(by_floor.len(), 2);
        assert_eq!(by_area.len(), 2);
        assert!(by_area.iter().all(|s| s.id != slot_id));

        let wrong_type = repos
            .inventory()
            .find_available_slots(SlotScope::Floor(floor.id), "Roda Dua")
            .await
            .unwrap();
        assert!(wrong_type.is_empty());
    }

    #[tokio::test]
    async fn confirming_a_hold_occupies_the_slot_once() {
        let (db, repos, floor) = setup().await;
        let vehicle_id = add_vehicle(&db, "B 1234 CD").await;
        let slot_id = first_slot(&repos, floor.id).await;
        let held = hold(&repos, &floor, slot_id).await.unwrap();

        let draft = NewBooking::new(floor.parking_area_id, vehicle_id, slot_id, now(), 60, now())
            .unwrap()
            .with_reservation(held.reservation_id);
        let confirmation = held.confirmation(now()).unwrap();

        let booking = repos
            .bookings()
            .confirm_reservation(confirmation.clone(), draft.clone())
            .await
            .unwrap()
            .expect("first confirm wins");
        assert_eq!(booking.status, BookingStatus::Confirmed);
        assert_eq!(booking.reservation_id, Some(held.reservation_id));

        let slot = repos.inventory().find_slot(slot_id).await.unwrap().unwrap();
        assert_eq!(slot.status, SlotStatus::Occupied);

        let again = repos
            .bookings()
            .confirm_reservation(confirmation, draft)
            .await
            .unwrap();
        assert!(again.is_none());

        let active = repos
            .bookings()
            .find_active_for_vehicle(vehicle_id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(active.id, booking.id);
    }

    #[tokio::test]
    async fn released_hold_cannot_be_confirmed() {
        let (db, repos, floor) = setup().await;
        let vehicle_id = add_vehicle(&db, "B 1 XY").await;
        let slot_id = first_slot(&repos, floor.id).await;
        let held = hold(&repos, &floor, slot_id).await.unwrap();

        let later = now() + Duration::minutes(6);
        let expired = repos.reservations().find_expired_active(later).await.unwrap();
        assert_eq!(expired.len(), 1);
        assert!(repos
            .reservations()
            .release(expired[0].expiry(later).unwrap())
            .await
            .unwrap());
        // A second sweep over the same row loses the CAS.
        assert!(!repos
            .reservations()
            .release(expired[0].expiry(later).unwrap())
            .await
            .unwrap());

        let slot = repos.inventory().find_slot(slot_id).await.unwrap().unwrap();
        assert_eq!(slot.status, SlotStatus::Available);

        let draft = NewBooking::new(floor.parking_area_id, vehicle_id, slot_id, now(), 30, now())
            .unwrap()
            .with_reservation(held.reservation_id);
        let stale = held.confirmation(now()).unwrap();
        let result = repos
            .bookings()
            .confirm_reservation(stale, draft)
            .await
            .unwrap();
        assert!(result.is_none());
        let stored = repos
            .reservations()
            .find_by_reservation_id(held.reservation_id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored.status, ReservationStatus::Expired);
    }

    #[tokio::test]
    async fn second_active_booking_for_a_vehicle_is_a_conflict() {
        let (db, repos, floor) = setup().await;
        let vehicle_id = add_vehicle(&db, "D 42 AB").await;
        let slots = repos.inventory().list_slots(floor.id, None).await.unwrap();
        let occupy = SlotStatus::Available.transition_to(SlotStatus::Occupied).unwrap();

        let first = NewBooking::new(floor.parking_area_id, vehicle_id, slots[0].id, now(), 60, now()).unwrap();
        repos.bookings().occupy_slot(occupy, first).await.unwrap().unwrap();

        let second = NewBooking::new(floor.parking_area_id, vehicle_id, slots[1].id, now(), 60, now()).unwrap();
        let err = repos.bookings().occupy_slot(occupy, second).await.unwrap_err();
        assert!(matches!(err, DomainError::Conflict(_)));

        // The failed insert rolled back the slot move.
        let slot = repos.inventory().find_slot(slots[1].id).await.unwrap().unwrap();
        assert_eq!(slot.status, SlotStatus::Available);
    }

    #[tokio::test]
    async fn legacy_active_booking_still_blocks_a_second_one() {
        let (db, repos, floor) = setup().await;
        let vehicle_id = add_vehicle(&db, "B 77 LG").await;
        booking::ActiveModel {
            id: NotSet,
            parking_area_id: Set(floor.parking_area_id),
            vehicle_id: Set(vehicle_id),
            slot_id: Set(None),
            reservation_id: Set(None),
            start_time: Set(now()),
            end_time: Set(now() + Duration::minutes(60)),
            duration_minutes: Set(60),
            status: Set("aktif".into()),
            created_at: Set(now()),
        }
        .insert(&db)
        .await
        .unwrap();

        let slot_id = first_slot(&repos, floor.id).await;
        let occupy = SlotStatus::Available.transition_to(SlotStatus::Occupied).unwrap();
        let draft = NewBooking::new(floor.parking_area_id, vehicle_id, slot_id, now(), 60, now()).unwrap();
        let err = repos.bookings().occupy_slot(occupy, draft).await.unwrap_err();
        assert!(matches!(err, DomainError::Conflict(_)));
        let active = repos.bookings().find_active_for_vehicle(vehicle_id).await.unwrap().unwrap();
        assert_eq!(active.status, BookingStatus::Confirmed);
    }

    #[tokio::test]
    async fn closing_a_booking_frees_its_slot() {
        let (db, repos, floor) = setup().await;
        let vehicle_id = add_vehicle(&db, "F 9 ZZ").await;
        let slot_id = first_slot(&repos, floor.id).await;
        let occupy = SlotStatus::Available.transition_to(SlotStatus::Occupied).unwrap();
        let draft = NewBooking::new(floor.parking_area_id, vehicle_id, slot_id, now(), 60, now()).unwrap();
        let booking = repos.bookings().occupy_slot(occupy, draft).await.unwrap().unwrap();

        let closure = booking.closure(BookingStatus::Completed, now()).unwrap();
        assert!(repos.bookings().close(closure.clone()).await.unwrap());
        assert!(!repos.bookings().close(closure).await.unwrap());

        let slot = repos.inventory().find_slot(slot_id).await.unwrap().unwrap();
        assert_eq!(slot.status, SlotStatus::Available);
        assert!(repos
            .bookings()
            .find_active_for_vehicle(vehicle_id)
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn busy_floor_is_not_deleted() {
        let (_db, repos, floor) = setup().await;
        let slot_id = first_slot(&repos, floor.id).await;
        let held = hold(&repos, &floor, slot_id).await.unwrap();

        assert!(!repos.inventory().delete_floor_if_idle(floor.id).await.unwrap());

        repos
            .reservations()
            .release(held.cancellation(now()).unwrap())
            .await
            .unwrap();
        assert!(repos.inventory().delete_floor_if_idle(floor.id).await.unwrap());
        assert!(repos.inventory().find_floor(floor.id).await.unwrap().is_none());
        assert!(repos.inventory().find_slot(slot_id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn purge_keeps_reservations_referenced_by_bookings() {
        let (db, repos, floor) = setup().await;
        let vehicle_id = add_vehicle(&db, "L 5 QQ").await;
        let slots = repos.inventory().list_slots(floor.id, None).await.unwrap();

        let confirmed = hold(&repos, &floor, slots[0].id).await.unwrap();
        let draft = NewBooking::new(floor.parking_area_id, vehicle_id, slots[0].id, now(), 60, now())
            .unwrap()
            .with_reservation(confirmed.reservation_id);
        repos
            .bookings()
            .confirm_reservation(confirmed.confirmation(now()).unwrap(), draft)
            .await
            .unwrap()
            .unwrap();

        let cancelled = hold(&repos, &floor, slots[1].id).await.unwrap();
        repos
            .reservations()
            .release(cancelled.cancellation(now()).unwrap())
            .await
            .unwrap();

        let removed = repos
            .reservations()
            .purge_finished(now() + Duration::hours(1))
            .await
            .unwrap();
        assert_eq!(removed, 1);
        assert!(repos
            .reservations()
            .find_by_reservation_id(cancelled.reservation_id)
            .await
            .unwrap()
            .is_none());
        assert!(repos
            .reservations()
            .find_by_reservation_id(confirmed.reservation_id)
            .await
            .unwrap()
            .is_some());
    }

    #[tokio::test]
    async fn unknown_vehicle_is_none() {
        let (db, repos, _floor) = setup().await;
        let id = add_vehicle(&db, "AB 1 C").await;
        assert_eq!(
            repos.vehicles().find_by_id(id).await.unwrap().unwrap().plate_number,
            "AB 1 C"
        );
        assert!(repos.vehicles().find_by_id(id + 100).await.unwrap().is_none());
    }
}
