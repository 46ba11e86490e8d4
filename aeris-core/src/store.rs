use async_trait::async_trait;
use uuid::Uuid;

use crate::booking::{BookingRecord, NewBooking};
use crate::model::{Flight, FlightSummary, SeatClass, SeatMap};
use crate::{BookingError, BookingResult};

/// A seat row snapshot taken under an exclusive row lock. The `version` it
/// carries is what `mark_booked` later re-checks.
#[derive(Debug, Clone)]
pub struct LockedSeat {
    pub id: Uuid,
    pub flight_id: Uuid,
    pub row: i32,
    pub col: String,
    pub class: SeatClass,
    pub version: i32,
}

impl LockedSeat {
    pub fn label(&self) -> String {
        format!("{}{}", self.row, self.col)
    }
}

/// Persistence port for the booking engine. Implementations provide explicit
/// transactions, a non-blocking row-lock primitive and conditional updates;
/// correctness never depends on in-process synchronization.
#[async_trait]
pub trait BookingStore: Send + Sync {
    /// Open a transaction. Everything between `begin` and `commit` is
    /// invisible to other transactions; dropping the handle without
    /// committing must discard all staged work.
    async fn begin(&self) -> BookingResult<Box<dyn BookingTx>>;

    async fn list_flights(&self) -> BookingResult<Vec<FlightSummary>>;

    /// Read-only seat map, grouped first -> business -> economy, rows
    /// ascending, columns ascending, regardless of storage order.
    async fn seat_map(&self, flight_id: Uuid) -> BookingResult<SeatMap>;

    /// Resolve a seat by position. Used by the API layer, which accepts
    /// row/column addressing; the booking transaction itself locks by id.
    async fn find_seat(&self, flight_id: Uuid, row: i32, col: &str) -> BookingResult<Option<Uuid>>;

    /// Look up a sealed booking by reference, joined with the seat and
    /// flight facts verification reconstructs metadata from.
    async fn find_booking(&self, reference: &str) -> BookingResult<Option<BookingRecord>>;

    /// Cheap liveness probe for health reporting.
    async fn ping(&self) -> BookingResult<()>;
}

/// One open booking transaction.
#[async_trait]
pub trait BookingTx: Send {
    /// Acquire an exclusive, non-blocking lock on the seat row. Fails fast
    /// instead of queueing: `Conflict(SeatLockBusy)` if another transaction
    /// holds the lock, `Conflict(SeatAlreadyBooked)` if the seat is taken,
    /// `NotFound` if the seat does not exist.
    async fn lock_seat(&mut self, seat_id: Uuid) -> BookingResult<LockedSeat>;

    async fn find_flight(&mut self, flight_id: Uuid) -> BookingResult<Flight>;

    async fn reference_exists(&mut self, code: &str) -> BookingResult<bool>;

    async fn insert_booking(&mut self, booking: &NewBooking) -> BookingResult<()>;

    /// Conditional flip to booked: succeeds only while the row is unbooked
    /// and its version still equals `expected_version`; bumps the version.
    /// Zero rows affected is `Conflict(SeatVersionChanged)` - the second,
    /// lock-independent line of defense against double booking.
    async fn mark_booked(&mut self, seat_id: Uuid, expected_version: i32) -> BookingResult<()>;

    async fn commit(self: Box<Self>) -> BookingResult<()>;

    async fn rollback(self: Box<Self>) -> BookingResult<()>;
}

pub fn not_found(what: impl Into<String>) -> BookingError {
    BookingError::NotFound(what.into())
}
