//! Repository traits for the domain layer
//!
//! Contains:
//! - `RepositoryProvider`: unified access to all per-aggregate repositories
//! - `DomainResult`: standard result type for domain operations

use super::booking::BookingRepository;
use super::inventory::InventoryRepository;
use super::reservation::ReservationRepository;
use super::vehicle::VehicleRepository;
use crate::shared::errors::DomainError;

/// Result type for domain operations
pub type DomainResult<T> = Result<T, DomainError>;

/// Provides access to all domain repositories.
///
/// ```ignore
/// async fn handle(repos: &dyn RepositoryProvider) {
///     let floor = repos.inventory().find_floor(3).await?;
///     let hold = repos.reservations().find_by_reservation_id(id).await?;
/// }
/// ```
pub trait RepositoryProvider: Send + Sync {
    fn inventory(&self) -> &dyn InventoryRepository;
    fn reservations(&self) -> &dyn ReservationRepository;
    fn bookings(&self) -> &dyn BookingRepository;
    fn vehicles(&self) -> &dyn VehicleRepository;
}
