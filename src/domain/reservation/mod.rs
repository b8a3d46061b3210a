//! Reservation aggregate
//!
//! Contains the Reservation entity, hold policy, and repository interface.

pub mod model;
pub mod repository;

pub use model::{
    HoldPolicy, Reservation, ReservationConfirmation, ReservationRelease, ReservationStatus,
};
pub use repository::ReservationRepository;
