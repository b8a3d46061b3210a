//! Database entities module

pub mod booking;
pub mod floor;
pub mod parking_area;
pub mod reservation;
pub mod slot;
pub mod vehicle;

pub use booking::Entity as Booking;
pub use floor::Entity as Floor;
pub use parking_area::Entity as ParkingArea;
pub use reservation::Entity as Reservation;
pub use slot::Entity as Slot;
pub use vehicle::Entity as Vehicle;
