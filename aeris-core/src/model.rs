use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Flight {
    pub id: Uuid,
    pub flight_number: String,
    pub origin: String,
    pub destination: String,
    pub departure_time: DateTime<Utc>,
    pub arrival_time: DateTime<Utc>,
    pub price_amount: i32,
    pub price_currency: String,
    pub aircraft_type: String,
    pub total_rows: i32,
    pub seats_per_row: i32,
    pub status: FlightStatus,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum FlightStatus {
    Scheduled,
    Boarding,
    Departed,
    Arrived,
    Cancelled,
}

impl FlightStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            FlightStatus::Scheduled => "scheduled",
            FlightStatus::Boarding => "boarding",
            FlightStatus::Departed => "departed",
            FlightStatus::Arrived => "arrived",
            FlightStatus::Cancelled => "cancelled",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "scheduled" => Some(FlightStatus::Scheduled),
            "boarding" => Some(FlightStatus::Boarding),
            "departed" => Some(FlightStatus::Departed),
            "arrived" => Some(FlightStatus::Arrived),
            "cancelled" => Some(FlightStatus::Cancelled),
            _ => None,
        }
    }
}

/// Cabin class, derived from the row band at provisioning time:
/// rows 1-2 first, 3-4 business, everything after economy.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum SeatClass {
    First,
    Business,
    Economy,
}

impl SeatClass {
    pub fn for_row(row: i32) -> Self {
        if row <= 2 {
            SeatClass::First
        } else if row <= 4 {
            SeatClass::Business
        } else {
            SeatClass::Economy
        }
    }

    /// Display ordering: first cabin leads the seat map.
    pub fn rank(&self) -> u8 {
        match self {
            SeatClass::First => 0,
            SeatClass::Business => 1,
            SeatClass::Economy => 2,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SeatClass::First => "first",
            SeatClass::Business => "business",
            SeatClass::Economy => "economy",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "first" => Some(SeatClass::First),
            "business" => Some(SeatClass::Business),
            "economy" => Some(SeatClass::Economy),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Seat {
    pub id: Uuid,
    pub flight_id: Uuid,
    pub row: i32,
    pub col: String,
    pub class: SeatClass,
    pub booked: bool,
    /// Monotonic counter bumped on every booked-state change; the optimistic
    /// layer beneath the row lock.
    pub version: i32,
}

impl Seat {
    pub fn label(&self) -> String {
        format!("{}{}", self.row, self.col)
    }
}

/// Flight plus availability counts for listing surfaces.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FlightSummary {
    #[serde(flatten)]
    pub flight: Flight,
    pub total_seats: i64,
    pub available_seats: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SeatMap {
    pub flight: Flight,
    pub rows: Vec<SeatRow>,
    pub statistics: SeatStatistics,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SeatRow {
    pub row: i32,
    pub class: SeatClass,
    pub seats: Vec<SeatCell>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SeatCell {
    pub id: Uuid,
    pub col: String,
    pub label: String,
    pub booked: bool,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct SeatStatistics {
    pub total_seats: i64,
    pub booked_seats: i64,
    pub available_seats: i64,
}
