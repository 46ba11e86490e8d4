//! Postgres-backed booking store.
//!
//! The seat lock is `SELECT ... FOR UPDATE NOWAIT`: contended rows fail fast
//! (SQLSTATE 55P03) instead of queueing, so a user-facing booking request
//! never waits behind another transaction. `mark_booked` is a conditional
//! update on (booked, version) - an independent guard that holds even if the
//! locking layer were misconfigured.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{PgPool, Postgres, Row, Transaction};
use uuid::Uuid;

use aeris_core::booking::{BookingRecord, NewBooking};
use aeris_core::model::{
    Flight, FlightStatus, FlightSummary, SeatCell, SeatClass, SeatMap, SeatRow, SeatStatistics,
};
use aeris_core::seal::{EncryptSeal, SignatureSeal};
use aeris_core::store::{not_found, BookingStore, BookingTx, LockedSeat};
use aeris_core::{BookingError, BookingResult, ConflictReason};

/// SQLSTATE raised by `FOR UPDATE NOWAIT` when another transaction holds the
/// row lock.
const LOCK_NOT_AVAILABLE: &str = "55P03";

const FLIGHT_COLUMNS: &str = "id, flight_number, origin, destination, departure_time, \
     arrival_time, price_amount, price_currency, aircraft_type, total_rows, seats_per_row, status";

pub struct PgBookingStore {
    pool: PgPool,
}

impl PgBookingStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(sqlx::FromRow)]
struct FlightDbRow {
    id: Uuid,
    flight_number: String,
    origin: String,
    destination: String,
    departure_time: DateTime<Utc>,
    arrival_time: DateTime<Utc>,
    price_amount: i32,
    price_currency: String,
    aircraft_type: String,
    total_rows: i32,
    seats_per_row: i32,
    status: String,
}

impl FlightDbRow {
    fn into_flight(self) -> BookingResult<Flight> {
        let status = FlightStatus::parse(&self.status)
            .ok_or_else(|| BookingError::Internal(format!("unknown flight status '{}'", self.status)))?;
        Ok(Flight {
            id: self.id,
            flight_number: self.flight_number,
            origin: self.origin,
            destination: self.destination,
            departure_time: self.departure_time,
            arrival_time: self.arrival_time,
            price_amount: self.price_amount,
            price_currency: self.price_currency,
            aircraft_type: self.aircraft_type,
            total_rows: self.total_rows,
            seats_per_row: self.seats_per_row,
            status,
        })
    }
}

fn parse_class(raw: &str) -> BookingResult<SeatClass> {
    SeatClass::parse(raw)
        .ok_or_else(|| BookingError::Internal(format!("unknown seat class '{}'", raw)))
}

#[async_trait]
impl BookingStore for PgBookingStore {
    async fn begin(&self) -> BookingResult<Box<dyn BookingTx>> {
        let tx = self.pool.begin().await.map_err(BookingError::internal)?;
        Ok(Box::new(PgBookingTx { tx }))
    }

    async fn list_flights(&self) -> BookingResult<Vec<FlightSummary>> {
        let rows = sqlx::query(
            "SELECT f.id, f.flight_number, f.origin, f.destination, f.departure_time, \
                    f.arrival_time, f.price_amount, f.price_currency, f.aircraft_type, \
                    f.total_rows, f.seats_per_row, f.status, \
                    COUNT(s.id) AS total_seats, \
                    COUNT(s.id) FILTER (WHERE NOT s.booked) AS available_seats \
             FROM flights f \
             LEFT JOIN seats s ON s.flight_id = f.id \
             GROUP BY f.id \
             ORDER BY f.departure_time",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(BookingError::internal)?;

        let mut summaries = Vec::with_capacity(rows.len());
        for row in rows {
            let flight = flight_from_row(&row)?;
            summaries.push(FlightSummary {
                flight,
                total_seats: row.try_get("total_seats").map_err(BookingError::internal)?,
                available_seats: row
                    .try_get("available_seats")
                    .map_err(BookingError::internal)?,
            });
        }
        Ok(summaries)
    }

    async fn seat_map(&self, flight_id: Uuid) -> BookingResult<SeatMap> {
        let flight = sqlx::query_as::<Postgres, FlightDbRow>(&format!(
            "SELECT {FLIGHT_COLUMNS} FROM flights WHERE id = $1"
        ))
        .bind(flight_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(BookingError::internal)?
        .ok_or_else(|| not_found(format!("flight {}", flight_id)))?
        .into_flight()?;

        // Grouped display order is enforced here, not by insertion order.
        let rows = sqlx::query(
            "SELECT id, row_num, col_num, class, booked FROM seats \
             WHERE flight_id = $1 \
             ORDER BY CASE class WHEN 'first' THEN 0 WHEN 'business' THEN 1 ELSE 2 END, \
                      row_num ASC, col_num ASC",
        )
        .bind(flight_id)
        .fetch_all(&self.pool)
        .await
        .map_err(BookingError::internal)?;

        let mut seat_rows: Vec<SeatRow> = Vec::new();
        let mut total = 0i64;
        let mut booked_count = 0i64;

        for row in rows {
            let row_num: i32 = row.try_get("row_num").map_err(BookingError::internal)?;
            let col: String = row.try_get("col_num").map_err(BookingError::internal)?;
            let class = parse_class(row.try_get::<&str, _>("class").map_err(BookingError::internal)?)?;
            let booked: bool = row.try_get("booked").map_err(BookingError::internal)?;
            let id: Uuid = row.try_get("id").map_err(BookingError::internal)?;

            total += 1;
            if booked {
                booked_count += 1;
            }

            let cell = SeatCell {
                id,
                label: format!("{}{}", row_num, col),
                col,
                booked,
            };

            match seat_rows.last_mut() {
                Some(last) if last.row == row_num && last.class == class => last.seats.push(cell),
                _ => seat_rows.push(SeatRow {
                    row: row_num,
                    class,
                    seats: vec![cell],
                }),
            }
        }

        Ok(SeatMap {
            flight,
            rows: seat_rows,
            statistics: SeatStatistics {
                total_seats: total,
                booked_seats: booked_count,
                available_seats: total - booked_count,
            },
        })
    }

    async fn find_seat(&self, flight_id: Uuid, row: i32, col: &str) -> BookingResult<Option<Uuid>> {
        let found = sqlx::query(
            "SELECT id FROM seats WHERE flight_id = $1 AND row_num = $2 AND col_num = $3",
        )
        .bind(flight_id)
        .bind(row)
        .bind(col)
        .fetch_optional(&self.pool)
        .await
        .map_err(BookingError::internal)?;

        match found {
            Some(row) => Ok(Some(row.try_get("id").map_err(BookingError::internal)?)),
            None => Ok(None),
        }
    }

    async fn find_booking(&self, reference: &str) -> BookingResult<Option<BookingRecord>> {
        let row = sqlx::query(
            "SELECT b.id, b.reference, b.passenger_name, b.account_id, \
                    b.ciphertext, b.key_capsule, b.nonce, b.encrypt_algorithm, b.encrypt_simulated, \
                    b.signature, b.verification_key, b.content_hash, b.sign_algorithm, b.sign_simulated, \
                    b.reference_algorithm, b.reference_simulated, b.created_at, \
                    s.id AS seat_id, s.row_num, s.col_num, s.class, \
                    f.id AS flight_id, f.flight_number, f.origin, f.destination, f.departure_time \
             FROM bookings b \
             JOIN seats s ON b.seat_id = s.id \
             JOIN flights f ON b.flight_id = f.id \
             WHERE b.reference = $1",
        )
        .bind(reference)
        .fetch_optional(&self.pool)
        .await
        .map_err(BookingError::internal)?;

        let Some(row) = row else {
            return Ok(None);
        };

        let get_str = |name: &str| -> BookingResult<String> {
            row.try_get::<String, _>(name).map_err(BookingError::internal)
        };
        let get_bool = |name: &str| -> BookingResult<bool> {
            row.try_get::<bool, _>(name).map_err(BookingError::internal)
        };

        let record = BookingRecord {
            id: row.try_get("id").map_err(BookingError::internal)?,
            reference: get_str("reference")?,
            passenger_name: get_str("passenger_name")?,
            account_id: row.try_get("account_id").map_err(BookingError::internal)?,
            payload: EncryptSeal {
                ciphertext: get_str("ciphertext")?,
                key_capsule: get_str("key_capsule")?,
                nonce: get_str("nonce")?,
                algorithm: get_str("encrypt_algorithm")?,
                simulated: get_bool("encrypt_simulated")?,
            },
            signature: SignatureSeal {
                signature: get_str("signature")?,
                verification_key: get_str("verification_key")?,
                content_hash: get_str("content_hash")?,
                algorithm: get_str("sign_algorithm")?,
                simulated: get_bool("sign_simulated")?,
            },
            reference_algorithm: get_str("reference_algorithm")?,
            reference_simulated: get_bool("reference_simulated")?,
            created_at: row.try_get("created_at").map_err(BookingError::internal)?,
            seat_id: row.try_get("seat_id").map_err(BookingError::internal)?,
            seat_row: row.try_get("row_num").map_err(BookingError::internal)?,
            seat_col: get_str("col_num")?,
            seat_class: parse_class(&get_str("class")?)?,
            flight_id: row.try_get("flight_id").map_err(BookingError::internal)?,
            flight_number: get_str("flight_number")?,
            origin: get_str("origin")?,
            destination: get_str("destination")?,
            departure_time: row.try_get("departure_time").map_err(BookingError::internal)?,
        };
        Ok(Some(record))
    }

    async fn ping(&self) -> BookingResult<()> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map_err(BookingError::internal)?;
        Ok(())
    }
}

pub struct PgBookingTx {
    tx: Transaction<'static, Postgres>,
}

#[async_trait]
impl BookingTx for PgBookingTx {
    async fn lock_seat(&mut self, seat_id: Uuid) -> BookingResult<LockedSeat> {
        let locked = sqlx::query(
            "SELECT id, flight_id, row_num, col_num, class, booked, version \
             FROM seats WHERE id = $1 FOR UPDATE NOWAIT",
        )
        .bind(seat_id)
        .fetch_optional(&mut *self.tx)
        .await;

        let row = match locked {
            Ok(Some(row)) => row,
            Ok(None) => return Err(not_found(format!("seat {}", seat_id))),
            Err(sqlx::Error::Database(db)) if db.code().as_deref() == Some(LOCK_NOT_AVAILABLE) => {
                return Err(BookingError::Conflict(ConflictReason::SeatLockBusy));
            }
            Err(err) => return Err(BookingError::internal(err)),
        };

        let booked: bool = row.try_get("booked").map_err(BookingError::internal)?;
        if booked {
            return Err(BookingError::Conflict(ConflictReason::SeatAlreadyBooked));
        }

        Ok(LockedSeat {
            id: row.try_get("id").map_err(BookingError::internal)?,
            flight_id: row.try_get("flight_id").map_err(BookingError::internal)?,
            row: row.try_get("row_num").map_err(BookingError::internal)?,
            col: row.try_get("col_num").map_err(BookingError::internal)?,
            class: parse_class(row.try_get::<&str, _>("class").map_err(BookingError::internal)?)?,
            version: row.try_get("version").map_err(BookingError::internal)?,
        })
    }

    async fn find_flight(&mut self, flight_id: Uuid) -> BookingResult<Flight> {
        sqlx::query_as::<Postgres, FlightDbRow>(&format!(
            "SELECT {FLIGHT_COLUMNS} FROM flights WHERE id = $1"
        ))
        .bind(flight_id)
        .fetch_optional(&mut *self.tx)
        .await
        .map_err(BookingError::internal)?
        .ok_or_else(|| not_found(format!("flight {}", flight_id)))?
        .into_flight()
    }

    async fn reference_exists(&mut self, code: &str) -> BookingResult<bool> {
        let row = sqlx::query("SELECT 1 AS present FROM bookings WHERE reference = $1")
            .bind(code)
            .fetch_optional(&mut *self.tx)
            .await
            .map_err(BookingError::internal)?;
        Ok(row.is_some())
    }

    async fn insert_booking(&mut self, booking: &NewBooking) -> BookingResult<()> {
        sqlx::query(
            "INSERT INTO bookings (id, seat_id, flight_id, reference, passenger_name, account_id, \
                 ciphertext, key_capsule, nonce, encrypt_algorithm, encrypt_simulated, \
                 signature, verification_key, content_hash, sign_algorithm, sign_simulated, \
                 reference_algorithm, reference_simulated, created_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17, $18, $19)",
        )
        .bind(booking.id)
        .bind(booking.seat_id)
        .bind(booking.flight_id)
        .bind(&booking.reference)
        .bind(&booking.passenger_name)
        .bind(booking.account_id)
        .bind(&booking.payload.ciphertext)
        .bind(&booking.payload.key_capsule)
        .bind(&booking.payload.nonce)
        .bind(&booking.payload.algorithm)
        .bind(booking.payload.simulated)
        .bind(&booking.signature.signature)
        .bind(&booking.signature.verification_key)
        .bind(&booking.signature.content_hash)
        .bind(&booking.signature.algorithm)
        .bind(booking.signature.simulated)
        .bind(&booking.reference_algorithm)
        .bind(booking.reference_simulated)
        .bind(booking.created_at)
        .execute(&mut *self.tx)
        .await
        .map_err(BookingError::internal)?;
        Ok(())
    }

    async fn mark_booked(&mut self, seat_id: Uuid, expected_version: i32) -> BookingResult<()> {
        let result = sqlx::query(
            "UPDATE seats SET booked = TRUE, version = version + 1, updated_at = now() \
             WHERE id = $1 AND booked = FALSE AND version = $2",
        )
        .bind(seat_id)
        .bind(expected_version)
        .execute(&mut *self.tx)
        .await
        .map_err(BookingError::internal)?;

        // Zero rows means the seat moved underneath us despite the lock
        // (or the lock was never taken). Hard conflict, never ignored.
        if result.rows_affected() == 0 {
            return Err(BookingError::Conflict(ConflictReason::SeatVersionChanged));
        }
        Ok(())
    }

    async fn commit(self: Box<Self>) -> BookingResult<()> {
        self.tx.commit().await.map_err(BookingError::internal)
    }

    async fn rollback(self: Box<Self>) -> BookingResult<()> {
        self.tx.rollback().await.map_err(BookingError::internal)
    }
}

fn flight_from_row(row: &sqlx::postgres::PgRow) -> BookingResult<Flight> {
    let status_raw: String = row.try_get("status").map_err(BookingError::internal)?;
    let status = FlightStatus::parse(&status_raw)
        .ok_or_else(|| BookingError::Internal(format!("unknown flight status '{}'", status_raw)))?;
    Ok(Flight {
        id: row.try_get("id").map_err(BookingError::internal)?,
        flight_number: row.try_get("flight_number").map_err(BookingError::internal)?,
        origin: row.try_get("origin").map_err(BookingError::internal)?,
        destination: row.try_get("destination").map_err(BookingError::internal)?,
        departure_time: row.try_get("departure_time").map_err(BookingError::internal)?,
        arrival_time: row.try_get("arrival_time").map_err(BookingError::internal)?,
        price_amount: row.try_get("price_amount").map_err(BookingError::internal)?,
        price_currency: row.try_get("price_currency").map_err(BookingError::internal)?,
        aircraft_type: row.try_get("aircraft_type").map_err(BookingError::internal)?,
        total_rows: row.try_get("total_rows").map_err(BookingError::internal)?,
        seats_per_row: row.try_get("seats_per_row").map_err(BookingError::internal)?,
        status,
    })
}
