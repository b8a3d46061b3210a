//! Parking use cases: inventory, allocation, booking and expiry.

pub mod services;

use std::sync::Arc;

pub use services::*;

use crate::domain::{HoldPolicy, RepositoryProvider, SharedNotificationSink};
use crate::shared::time::SharedClock;

/// All parking services wired over one repository provider and clock.
#[derive(Clone)]
pub struct ParkingServices {
    pub inventory: Arc<InventoryService>,
    pub allocation: Arc<AllocationService>,
    pub booking: Arc<BookingService>,
    pub sweeper: Arc<ExpirySweeper>,
}

impl ParkingServices {
    pub fn new(
        repos: Arc<dyn RepositoryProvider>,
        clock: SharedClock,
        notifier: SharedNotificationSink,
        policy: HoldPolicy,
    ) -> Self {
        Self {
            inventory: Arc::new(InventoryService::new(repos.clone(), clock.clone())),
            allocation: Arc::new(AllocationService::new(
                repos.clone(),
                clock.clone(),
                notifier.clone(),
                policy,
            )),
            booking: Arc::new(BookingService::new(
                repos.clone(),
                clock.clone(),
                notifier.clone(),
                policy,
            )),
            sweeper: Arc::new(ExpirySweeper::new(repos, clock, notifier)),
        }
    }
}


// ── Tests ──────────────────────────────────────────────────────
//
// End-to-end behaviour of the reservation lifecycle across services.
