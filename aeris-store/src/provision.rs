//! Demo catalog provisioning: five flights, a full seat grid per flight,
//! and a couple of pre-booked seats so the seat map is not uniform.

use chrono::{DateTime, Duration, TimeZone, Utc};
use sqlx::PgPool;
use tracing::info;
use uuid::Uuid;

use aeris_core::model::{Flight, FlightStatus, SeatClass};

use crate::memory::MemoryStore;

fn flight(
    number: &str,
    origin: &str,
    destination: &str,
    departure: DateTime<Utc>,
    duration_minutes: i64,
    price_amount: i32,
    aircraft_type: &str,
) -> Flight {
    Flight {
        id: Uuid::new_v4(),
        flight_number: number.to_string(),
        origin: origin.to_string(),
        destination: destination.to_string(),
        departure_time: departure,
        arrival_time: departure + Duration::minutes(duration_minutes),
        price_amount,
        price_currency: "USD".to_string(),
        aircraft_type: aircraft_type.to_string(),
        total_rows: 10,
        seats_per_row: 6,
        status: FlightStatus::Scheduled,
    }
}

fn at(y: i32, m: u32, d: u32, h: u32, min: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(y, m, d, h, min, 0)
        .single()
        .unwrap_or_else(Utc::now)
}

pub fn demo_flights() -> Vec<Flight> {
    vec![
        flight("QA-101", "New York (JFK)", "London (LHR)", at(2026, 9, 15, 8, 0), 720, 89999, "Q-100"),
        flight("QA-202", "Tokyo (NRT)", "Singapore (SIN)", at(2026, 9, 16, 14, 30), 390, 65000, "Q-200"),
        flight("QA-303", "Dubai (DXB)", "Sydney (SYD)", at(2026, 9, 17, 22, 0), 1230, 125000, "Q-300"),
        flight("QA-404", "Los Angeles (LAX)", "Paris (CDG)", at(2026, 9, 18, 10, 0), 1230, 110000, "Q-100"),
        flight("QA-505", "Frankfurt (FRA)", "Hong Kong (HKG)", at(2026, 9, 19, 13, 0), 1080, 95000, "Q-200"),
    ]
}

/// Seats pre-booked on the first demo flight, so conflict paths are
/// reachable out of the box.
const PREBOOKED: [(i32, &str); 2] = [(1, "A"), (1, "B")];

/// Seed the relational store if the catalog is empty. Idempotent.
pub async fn seed_demo(pool: &PgPool) -> Result<(), sqlx::Error> {
    let existing: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM flights")
        .fetch_one(pool)
        .await?;
    if existing > 0 {
        info!("Catalog already provisioned ({} flights); skipping demo seed", existing);
        return Ok(());
    }

    info!("Seeding demo catalog...");
    let flights = demo_flights();

    for f in &flights {
        sqlx::query(
            "INSERT INTO flights (id, flight_number, origin, destination, departure_time, \
                 arrival_time, price_amount, price_currency, aircraft_type, total_rows, \
                 seats_per_row, status) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)",
        )
        .bind(f.id)
        .bind(&f.flight_number)
        .bind(&f.origin)
        .bind(&f.destination)
        .bind(f.departure_time)
        .bind(f.arrival_time)
        .bind(f.price_amount)
        .bind(&f.price_currency)
        .bind(&f.aircraft_type)
        .bind(f.total_rows)
        .bind(f.seats_per_row)
        .bind(f.status.as_str())
        .execute(pool)
        .await?;

        for row in 1..=f.total_rows {
            for col_idx in 0..f.seats_per_row {
                let col = char::from(b'A' + col_idx as u8).to_string();
                sqlx::query(
                    "INSERT INTO seats (id, flight_id, row_num, col_num, class) \
                     VALUES ($1, $2, $3, $4, $5)",
                )
                .bind(Uuid::new_v4())
                .bind(f.id)
                .bind(row)
                .bind(&col)
                .bind(SeatClass::for_row(row).as_str())
                .execute(pool)
                .await?;
            }
        }
    }

    for (row, col) in PREBOOKED {
        sqlx::query(
            "UPDATE seats SET booked = TRUE, version = version + 1 \
             WHERE flight_id = $1 AND row_num = $2 AND col_num = $3",
        )
        .bind(flights[0].id)
        .bind(row)
        .bind(col)
        .execute(pool)
        .await?;
    }

    info!("Demo catalog seeded: {} flights", flights.len());
    Ok(())
}

/// Seed the in-process store. Used by demo mode without a database.
pub fn seed_demo_memory(store: &MemoryStore) {
    let flights = demo_flights();
    let first = flights[0].id;
    for f in flights {
        store.provision_flight(f);
    }
    for (row, col) in PREBOOKED {
        store.prebook_seat(first, row, col);
    }
    info!("Demo catalog seeded into memory store");
}
