//! Domain events and the outbound notification port.

pub mod types;

use std::sync::Arc;

pub use types::*;

/// Fire-and-forget delivery of state-change notifications. Implementations
/// must not block and must not fail the caller.
pub trait NotificationSink: Send + Sync {
    fn notify(&self, event: Event);
}

pub type SharedNotificationSink = Arc<dyn NotificationSink>;

