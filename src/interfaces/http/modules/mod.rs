pub mod bookings;
pub mod health;
pub mod metrics;
pub mod parking;
pub mod request_id;
