//! Database repository implementations
//!
//! Per-aggregate SeaORM repositories + unified RepositoryProvider.

mod helpers;

pub mod booking_repository;
pub mod inventory_repository;
pub mod repository_provider;
pub mod reservation_repository;
pub mod vehicle_repository;

pub use repository_provider::SeaOrmRepositoryProvider;
