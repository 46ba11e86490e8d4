pub mod booking;
pub mod model;
pub mod seal;
pub mod store;
pub mod ticket;

use std::fmt;

/// Why a booking attempt lost to concurrent activity on the same seat.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConflictReason {
    SeatAlreadyBooked,
    SeatLockBusy,
    SeatVersionChanged,
}

impl fmt::Display for ConflictReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let msg = match self {
            ConflictReason::SeatAlreadyBooked => "seat is already booked",
            ConflictReason::SeatLockBusy => "seat is being booked by another request",
            ConflictReason::SeatVersionChanged => "seat changed while the booking was in progress",
        };
        write!(f, "{}", msg)
    }
}

/// Closed error set for every core booking operation. Conflict at any stage
/// means the whole transaction rolls back; the orchestrator never retries a
/// Conflict on its own.
#[derive(Debug, thiserror::Error)]
pub enum BookingError {
    #[error("validation failed: {0}")]
    Validation(String),
    #[error("{0} not found")]
    NotFound(String),
    #[error("conflict: {0}")]
    Conflict(ConflictReason),
    #[error("reference generation exhausted after {attempts} attempts")]
    ReferenceExhausted { attempts: u32 },
    #[error("internal error: {0}")]
    Internal(String),
}

impl BookingError {
    pub fn internal<E: fmt::Display>(err: E) -> Self {
        BookingError::Internal(err.to_string())
    }
}

impl From<seal::SealError> for BookingError {
    fn from(err: seal::SealError) -> Self {
        BookingError::Internal(err.to_string())
    }
}

pub type BookingResult<T> = Result<T, BookingError>;
