//! Application layer: use cases over the domain ports.

pub mod events;
pub mod parking;

pub use events::{create_event_bus, EventBus, EventSubscriber, SharedEventBus};
pub use parking::{
    AllocationService, BookingService, ExpirySweeper, InventoryService, ParkingServices,
    SweeperConfig,
};
