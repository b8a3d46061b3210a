//! Booking aggregate

pub mod model;
pub mod repository;

pub use model::{Booking, BookingClosure, BookingStatus, NewBooking, MAX_BOOKING_MINUTES};
pub use repository::BookingRepository;
