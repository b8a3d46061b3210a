//! Parking inventory, slot holds and floor administration

pub mod dto;
pub mod handlers;

pub use dto::*;
pub use handlers::*;
