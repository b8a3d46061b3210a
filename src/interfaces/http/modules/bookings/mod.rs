//! Booking endpoints (`/api/v1/booking`)

pub mod dto;
pub mod handlers;

pub use dto::*;
pub use handlers::*;
