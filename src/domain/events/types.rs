//! Notification events
//!
//! Emitted on reservation and booking state changes.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum Event {
    ReservationCreated(ReservationCreatedEvent),
    ReservationReleased(ReservationReleasedEvent),
    BookingConfirmed(BookingConfirmedEvent),
    BookingClosed(BookingClosedEvent),
}

impl Event {
    pub fn event_type(&self) -> &'static str {
        match self {
            Event::ReservationCreated(_) => "reservation_created",
            Event::ReservationReleased(_) => "reservation_released",
            Event::BookingConfirmed(_) => "booking_confirmed",
            Event::BookingClosed(_) => "booking_closed",
        }
    }

    pub fn slot_id(&self) -> Option<i32> {
        match self {
            Event::ReservationCreated(e) => Some(e.slot_id),
            Event::ReservationReleased(e) => Some(e.slot_id),
            Event::BookingConfirmed(e) => Some(e.slot_id),
            Event::BookingClosed(e) => e.slot_id,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReservationCreatedEvent {
    pub reservation_id: Uuid,
    pub user_id: i32,
    pub slot_id: i32,
    pub floor_id: i32,
    pub expires_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReservationReleasedEvent {
    pub reservation_id: Uuid,
    pub slot_id: i32,
    /// `expired` or `cancelled`
    pub status: String,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BookingConfirmedEvent {
    pub booking_id: i32,
    pub vehicle_id: i32,
    pub slot_id: i32,
    pub reservation_id: Option<Uuid>,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BookingClosedEvent {
    pub booking_id: i32,
    pub slot_id: Option<i32>,
    /// `cancelled`, `completed` or `expired`
    pub status: String,
    pub timestamp: DateTime<Utc>,
}

/// Message envelope with ID and timestamp
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventMessage {
    pub id: String,
    pub timestamp: DateTime<Utc>,
    #[serde(flatten)]
    pub event: Event,
}

impl EventMessage {
    pub fn new(event: Event) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            timestamp: Utc::now(),
            event,
        }
    }
}
