//! In-process booking store with the same transactional contract as the
//! Postgres store: fail-fast seat locks, version-checked conditional updates,
//! and staged writes that become visible only on commit.
//!
//! Backs the demo mode (`database.url = "memory"`) and lets the orchestrator
//! be exercised without a database server, which is what makes the locking
//! protocol testable independent of the engine's isolation semantics.

use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard};
use uuid::Uuid;

use aeris_core::booking::{BookingRecord, NewBooking};
use aeris_core::model::{
    Flight, FlightSummary, Seat, SeatCell, SeatClass, SeatMap, SeatRow, SeatStatistics,
};
use aeris_core::store::{not_found, BookingStore, BookingTx, LockedSeat};
use aeris_core::{BookingError, BookingResult, ConflictReason};

#[derive(Default)]
struct MemoryState {
    flights: HashMap<Uuid, Flight>,
    seats: HashMap<Uuid, Seat>,
    bookings: Vec<NewBooking>,
    references: HashSet<String>,
    /// Seats currently locked by an open transaction.
    locked_seats: HashSet<Uuid>,
}

#[derive(Clone, Default)]
pub struct MemoryStore {
    state: Arc<Mutex<MemoryState>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, MemoryState> {
        // A poisoned mutex only means another thread panicked mid-update of
        // plain maps; the data itself stays usable.
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn insert_flight(&self, flight: Flight) {
        self.lock().flights.insert(flight.id, flight);
    }

    /// Create the full seat grid for a flight: `total_rows` rows, columns
    /// lettered from A, classes from the row band.
    pub fn provision_flight(&self, flight: Flight) {
        let mut state = self.lock();
        for row in 1..=flight.total_rows {
            for col_idx in 0..flight.seats_per_row {
                let col = char::from(b'A' + col_idx as u8).to_string();
                let seat = Seat {
                    id: Uuid::new_v4(),
                    flight_id: flight.id,
                    row,
                    col,
                    class: SeatClass::for_row(row),
                    booked: false,
                    version: 0,
                };
                state.seats.insert(seat.id, seat);
            }
        }
        state.flights.insert(flight.id, flight);
    }

    /// Flip a seat to booked outside any transaction. Demo seeding only.
    pub fn prebook_seat(&self, flight_id: Uuid, row: i32, col: &str) -> bool {
        let mut state = self.lock();
        for seat in state.seats.values_mut() {
            if seat.flight_id == flight_id && seat.row == row && seat.col == col && !seat.booked {
                seat.booked = true;
                seat.version += 1;
                return true;
            }
        }
        false
    }

    /// Current seat snapshot, for assertions on version/booked state.
    pub fn seat(&self, seat_id: Uuid) -> Option<Seat> {
        self.lock().seats.get(&seat_id).cloned()
    }
}

#[async_trait]
impl BookingStore for MemoryStore {
    async fn begin(&self) -> BookingResult<Box<dyn BookingTx>> {
        Ok(Box::new(MemoryTx {
            state: Arc::clone(&self.state),
            held_locks: Vec::new(),
            staged_bookings: Vec::new(),
            staged_marks: Vec::new(),
            finished: false,
        }))
    }

    async fn list_flights(&self) -> BookingResult<Vec<FlightSummary>> {
        let state = self.lock();
        let mut summaries: Vec<FlightSummary> = state
            .flights
            .values()
            .map(|flight| {
                let mut total = 0i64;
                let mut available = 0i64;
                for seat in state.seats.values() {
                    if seat.flight_id == flight.id {
                        total += 1;
                        if !seat.booked {
                            available += 1;
                        }
                    }
                }
                FlightSummary {
                    flight: flight.clone(),
                    total_seats: total,
                    available_seats: available,
                }
            })
            .collect();
        summaries.sort_by_key(|s| s.flight.departure_time);
        Ok(summaries)
    }

    async fn seat_map(&self, flight_id: Uuid) -> BookingResult<SeatMap> {
        let state = self.lock();
        let flight = state
            .flights
            .get(&flight_id)
            .cloned()
            .ok_or_else(|| not_found(format!("flight {}", flight_id)))?;

        let mut seats: Vec<&Seat> = state
            .seats
            .values()
            .filter(|s| s.flight_id == flight_id)
            .collect();
        seats.sort_by(|a, b| {
            (a.class.rank(), a.row, &a.col).cmp(&(b.class.rank(), b.row, &b.col))
        });

        let mut rows: Vec<SeatRow> = Vec::new();
        let mut booked = 0i64;
        for seat in &seats {
            if seat.booked {
                booked += 1;
            }
            let cell = SeatCell {
                id: seat.id,
                col: seat.col.clone(),
                label: seat.label(),
                booked: seat.booked,
            };
            match rows.last_mut() {
                Some(last) if last.row == seat.row && last.class == seat.class => {
                    last.seats.push(cell)
                }
                _ => rows.push(SeatRow {
                    row: seat.row,
                    class: seat.class,
                    seats: vec![cell],
                }),
            }
        }

        let total = seats.len() as i64;
        Ok(SeatMap {
            flight,
            rows,
            statistics: SeatStatistics {
                total_seats: total,
                booked_seats: booked,
                available_seats: total - booked,
            },
        })
    }

    async fn find_seat(&self, flight_id: Uuid, row: i32, col: &str) -> BookingResult<Option<Uuid>> {
        let state = self.lock();
        Ok(state
            .seats
            .values()
            .find(|s| s.flight_id == flight_id && s.row == row && s.col == col)
            .map(|s| s.id))
    }

    async fn find_booking(&self, reference: &str) -> BookingResult<Option<BookingRecord>> {
        let state = self.lock();
        let Some(booking) = state.bookings.iter().find(|b| b.reference == reference) else {
            return Ok(None);
        };
        let seat = state
            .seats
            .get(&booking.seat_id)
            .ok_or_else(|| BookingError::Internal("booking references missing seat".to_string()))?;
        let flight = state.flights.get(&booking.flight_id).ok_or_else(|| {
            BookingError::Internal("booking references missing flight".to_string())
        })?;

        Ok(Some(BookingRecord {
            id: booking.id,
            reference: booking.reference.clone(),
            passenger_name: booking.passenger_name.clone(),
            account_id: booking.account_id,
            payload: booking.payload.clone(),
            signature: booking.signature.clone(),
            reference_algorithm: booking.reference_algorithm.clone(),
            reference_simulated: booking.reference_simulated,
            created_at: booking.created_at,
            seat_id: seat.id,
            seat_row: seat.row,
            seat_col: seat.col.clone(),
            seat_class: seat.class,
            flight_id: flight.id,
            flight_number: flight.flight_number.clone(),
            origin: flight.origin.clone(),
            destination: flight.destination.clone(),
            departure_time: flight.departure_time,
        }))
    }

    async fn ping(&self) -> BookingResult<()> {
        Ok(())
    }
}

struct MemoryTx {
    state: Arc<Mutex<MemoryState>>,
    held_locks: Vec<Uuid>,
    staged_bookings: Vec<NewBooking>,
    staged_marks: Vec<(Uuid, i32)>,
    finished: bool,
}

impl MemoryTx {
    fn lock(&self) -> MutexGuard<'_, MemoryState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn release_locks(state: &mut MemoryState, held: &[Uuid]) {
        for seat_id in held {
            state.locked_seats.remove(seat_id);
        }
    }
}

impl Drop for MemoryTx {
    fn drop(&mut self) {
        // Dropping an open transaction behaves like rollback.
        if !self.finished {
            let held = std::mem::take(&mut self.held_locks);
            let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());
            Self::release_locks(&mut state, &held);
        }
    }
}

#[async_trait]
impl BookingTx for MemoryTx {
    async fn lock_seat(&mut self, seat_id: Uuid) -> BookingResult<LockedSeat> {
        let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        let seat = state
            .seats
            .get(&seat_id)
            .ok_or_else(|| not_found(format!("seat {}", seat_id)))?
            .clone();

        if seat.booked {
            return Err(BookingError::Conflict(ConflictReason::SeatAlreadyBooked));
        }
        if state.locked_seats.contains(&seat_id) && !self.held_locks.contains(&seat_id) {
            return Err(BookingError::Conflict(ConflictReason::SeatLockBusy));
        }

        state.locked_seats.insert(seat_id);
        self.held_locks.push(seat_id);

        Ok(LockedSeat {
            id: seat.id,
            flight_id: seat.flight_id,
            row: seat.row,
            col: seat.col,
            class: seat.class,
            version: seat.version,
        })
    }

    async fn find_flight(&mut self, flight_id: Uuid) -> BookingResult<Flight> {
        self.lock()
            .flights
            .get(&flight_id)
            .cloned()
            .ok_or_else(|| not_found(format!("flight {}", flight_id)))
    }

    async fn reference_exists(&mut self, code: &str) -> BookingResult<bool> {
        if self.staged_bookings.iter().any(|b| b.reference == code) {
            return Ok(true);
        }
        Ok(self.lock().references.contains(code))
    }

    async fn insert_booking(&mut self, booking: &NewBooking) -> BookingResult<()> {
        let state = self.lock();
        let duplicate_reference = state.references.contains(&booking.reference)
            || self
                .staged_bookings
                .iter()
                .any(|b| b.reference == booking.reference);
        let duplicate_seat = state.bookings.iter().any(|b| b.seat_id == booking.seat_id)
            || self
                .staged_bookings
                .iter()
                .any(|b| b.seat_id == booking.seat_id);
        drop(state);

        // Mirrors the unique constraints on the relational store.
        if duplicate_reference {
            return Err(BookingError::Internal(format!(
                "unique constraint violated: reference {}",
                booking.reference
            )));
        }
        if duplicate_seat {
            return Err(BookingError::Internal(
                "unique constraint violated: one booking per seat".to_string(),
            ));
        }

        self.staged_bookings.push(booking.clone());
        Ok(())
    }

    async fn mark_booked(&mut self, seat_id: Uuid, expected_version: i32) -> BookingResult<()> {
        let state = self.lock();
        let seat = state
            .seats
            .get(&seat_id)
            .ok_or_else(|| not_found(format!("seat {}", seat_id)))?;

        if seat.booked || seat.version != expected_version {
            return Err(BookingError::Conflict(ConflictReason::SeatVersionChanged));
        }
        drop(state);

        self.staged_marks.push((seat_id, expected_version));
        Ok(())
    }

    async fn commit(mut self: Box<Self>) -> BookingResult<()> {
        let held = std::mem::take(&mut self.held_locks);
        let staged_bookings = std::mem::take(&mut self.staged_bookings);
        let staged_marks = std::mem::take(&mut self.staged_marks);
        self.finished = true;

        let mut state = self.lock();

        // Re-validate the conditional updates at the commit point; a failure
        // leaves no trace of the transaction.
        for (seat_id, expected_version) in &staged_marks {
            match state.seats.get(seat_id) {
                Some(seat) if !seat.booked && seat.version == *expected_version => {}
                _ => {
                    Self::release_locks(&mut state, &held);
                    return Err(BookingError::Conflict(ConflictReason::SeatVersionChanged));
                }
            }
        }

        for booking in staged_bookings {
            state.references.insert(booking.reference.clone());
            state.bookings.push(booking);
        }
        for (seat_id, _) in staged_marks {
            if let Some(seat) = state.seats.get_mut(&seat_id) {
                seat.booked = true;
                seat.version += 1;
            }
        }

        Self::release_locks(&mut state, &held);
        Ok(())
    }

    async fn rollback(mut self: Box<Self>) -> BookingResult<()> {
        let held = std::mem::take(&mut self.held_locks);
        self.finished = true;
        let mut state = self.lock();
        Self::release_locks(&mut state, &held);
        Ok(())
    }
}
