//! Domain layer: entities, explicit state machines and the ports the
//! application layer talks to.

pub mod booking;
pub mod events;
pub mod inventory;
pub mod repositories;
pub mod reservation;
pub mod transition;
pub mod vehicle;

pub use booking::{Booking, BookingStatus, NewBooking};
pub use events::{Event, NotificationSink, SharedNotificationSink};
pub use inventory::{Floor, FloorOccupancy, ParkingArea, Slot, SlotScope, SlotStatus, SlotType};
pub use repositories::{DomainResult, RepositoryProvider};
pub use reservation::{HoldPolicy, Reservation, ReservationStatus};
pub use transition::{StatusMachine, Transition};
pub use vehicle::Vehicle;

pub use crate::shared::errors::DomainError;
