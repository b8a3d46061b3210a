use thiserror::Error;

/// Business and infrastructure failures surfaced by the parking core.
///
/// Everything except [`DomainError::Storage`] is an expected outcome that the
/// request boundary turns into a structured response.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DomainError {
    #[error("Not found: {entity} with {field}={value}")]
    NotFound {
        entity: &'static str,
        field: &'static str,
        value: String,
    },

    #[error("Validation: {field}: {message}")]
    Validation {
        field: &'static str,
        message: String,
    },

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("No available slots on {scope}")]
    NoSlotsAvailable { scope: String },

    #[error("Invalid reservation: {0}")]
    InvalidReservation(String),

    #[error("Reservation {0} has expired or is no longer active")]
    ReservationExpired(String),

    #[error("Illegal {entity} transition: {from} -> {to}")]
    IllegalTransition {
        entity: &'static str,
        from: &'static str,
        to: &'static str,
    },

    #[error("Storage error: {0}")]
    Storage(String),
}

impl DomainError {
    pub fn not_found(entity: &'static str, field: &'static str, value: impl ToString) -> Self {
        Self::NotFound {
            entity,
            field,
            value: value.to_string(),
        }
    }

    pub fn validation(field: &'static str, message: impl Into<String>) -> Self {
        Self::Validation {
            field,
            message: message.into(),
        }
    }

    /// Stable machine-readable code reported to clients.
    pub fn code(&self) -> &'static str {
        match self {
            Self::NotFound { .. } => "NOT_FOUND",
            Self::Validation { .. } => "VALIDATION_ERROR",
            Self::Conflict(_) => "CONFLICT",
            Self::NoSlotsAvailable { .. } => "NO_SLOTS_AVAILABLE",
            Self::InvalidReservation(_) => "INVALID_RESERVATION",
            Self::ReservationExpired(_) => "RESERVATION_EXPIRED",
            Self::IllegalTransition { .. } => "ILLEGAL_TRANSITION",
            Self::Storage(_) => "INTERNAL_ERROR",
        }
    }

    /// Whether the operation may succeed if retried (storage hiccups only).
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Storage(_))
    }
}
