//! # Mall Parking Slot Allocation
//!
//! Slot reservation and allocation engine for mall parking: live floor and
//! slot availability, time-boxed random holds, bookings and automatic
//! release of expired holds.
//!
//! ## Architecture
//!
//! - **domain**: entities, explicit status machines and repository ports
//! - **application**: inventory, allocation, booking and expiry services
//! - **infrastructure**: SeaORM persistence and the in-memory store
//! - **interfaces**: REST API with Swagger documentation
//! - **shared**: errors, clock, retry and shutdown plumbing

pub mod application;
pub mod config;
pub mod domain;
pub mod infrastructure;
pub mod interfaces;
pub mod server;
pub mod shared;

pub use config::{default_config_path, AppConfig, ConfigError};

pub use infrastructure::database::{init_database, DatabaseConfig, SeaOrmRepositoryProvider};
pub use infrastructure::storage::InMemoryRepositoryProvider;

pub use interfaces::http::create_api_router;

pub use application::{create_event_bus, EventBus, ParkingServices, SharedEventBus};
