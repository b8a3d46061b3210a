//! Database migrations module

pub use sea_orm_migration::prelude::*;

mod m20250101_000001_create_parking_areas;
mod m20250101_000002_create_floors;
mod m20250101_000003_create_slots;
mod m20250101_000004_create_vehicles;
mod m20250101_000005_create_reservations;
mod m20250101_000006_create_bookings;
mod m20250101_000007_add_allocation_guards;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20250101_000001_create_parking_areas::Migration),
            Box::new(m20250101_000002_create_floors::Migration),
            Box::new(m20250101_000003_create_slots::Migration),
            Box::new(m20250101_000004_create_vehicles::Migration),
            Box::new(m20250101_000005_create_reservations::Migration),
            Box::new(m20250101_000006_create_bookings::Migration),
            Box::new(m20250101_000007_add_allocation_guards::Migration),
        ]
    }
}
