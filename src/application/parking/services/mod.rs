pub mod allocation;
pub mod booking;
pub mod inventory;
pub mod reservation_expiry;

pub use allocation::{AllocationService, ReservationSummary, ReserveSlotCommand};
pub use booking::{BookingService, BookingSummary, CreateBookingCommand};
pub use inventory::{
    CreateAreaCommand, CreateFloorCommand, FloorSummary, InventoryService, SlotView,
    MAX_SLOTS_PER_FLOOR,
};
pub use reservation_expiry::{ExpirySweeper, SweepReport, SweeperConfig};
