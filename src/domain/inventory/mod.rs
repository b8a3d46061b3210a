//! Inventory aggregate: parking areas, floors and slots.

pub mod model;
pub mod repository;

pub use model::{
    generate_slot_layout, AreaStatus, Floor, FloorOccupancy, FloorStatus, NewFloor,
    NewParkingArea, NewSlot, ParkingArea, Slot, SlotScope, SlotStatus, SlotType,
};
pub use repository::InventoryRepository;
