use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::booking::BookingRecord;
use crate::model::SeatClass;

/// The account token written into canonical bytes when a booking has no owner.
pub const ANONYMOUS_ACCOUNT: &str = "anonymous";

/// The facts a ticket attests to, in the exact shape that gets signed.
///
/// Verification rebuilds this struct from stored booking/seat/flight rows and
/// re-serializes it; the bytes must match what was signed at creation time.
/// Field order is the serialization order, so fields must not be reordered,
/// and timestamps are carried as strings at fixed precision so a database
/// round-trip cannot change the bytes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TicketMetadata {
    pub reference: String,
    pub flight_number: String,
    pub origin: String,
    pub destination: String,
    pub departure_time: String,
    pub seat: String,
    pub seat_class: String,
    pub passenger_name: String,
    pub account: String,
    pub issued_at: String,
}

/// RFC 3339 at whole-second precision, UTC `Z` suffix.
pub fn canonical_timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Secs, true)
}

fn canonical_account(account_id: Option<Uuid>) -> String {
    match account_id {
        Some(id) => id.to_string(),
        None => ANONYMOUS_ACCOUNT.to_string(),
    }
}

impl TicketMetadata {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        reference: &str,
        flight_number: &str,
        origin: &str,
        destination: &str,
        departure_time: DateTime<Utc>,
        seat_label: &str,
        seat_class: SeatClass,
        passenger_name: &str,
        account_id: Option<Uuid>,
        issued_at: DateTime<Utc>,
    ) -> Self {
        TicketMetadata {
            reference: reference.to_string(),
            flight_number: flight_number.to_string(),
            origin: origin.to_string(),
            destination: destination.to_string(),
            departure_time: canonical_timestamp(departure_time),
            seat: seat_label.to_string(),
            seat_class: seat_class.as_str().to_string(),
            passenger_name: passenger_name.to_string(),
            account: canonical_account(account_id),
            issued_at: canonical_timestamp(issued_at),
        }
    }

    /// Rebuild the metadata that was signed for a stored booking.
    pub fn from_record(record: &BookingRecord) -> Self {
        TicketMetadata::new(
            &record.reference,
            &record.flight_number,
            &record.origin,
            &record.destination,
            record.departure_time,
            &format!("{}{}", record.seat_row, record.seat_col),
            record.seat_class,
            &record.passenger_name,
            record.account_id,
            record.created_at,
        )
    }

    /// The deterministic byte serialization that gets signed and re-verified.
    pub fn canonical_bytes(&self) -> Result<Vec<u8>, serde_json::Error> {
        serde_json::to_vec(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn sample() -> TicketMetadata {
        TicketMetadata::new(
            "K7Q2M9X4TZ1B",
            "QA-101",
            "New York (JFK)",
            "London (LHR)",
            Utc.with_ymd_and_hms(2026, 3, 15, 8, 0, 0).unwrap(),
            "5A",
            SeatClass::Economy,
            "Jane Doe",
            None,
            Utc.with_ymd_and_hms(2026, 1, 2, 12, 30, 45).unwrap(),
        )
    }

    #[test]
    fn canonical_bytes_are_stable() {
        // Guards against serialization drift between booking time and verify
        // time. If this assertion changes, previously signed tickets stop
        // verifying.
        let bytes = sample().canonical_bytes().unwrap();
        let expected = concat!(
            "{\"reference\":\"K7Q2M9X4TZ1B\",",
            "\"flight_number\":\"QA-101\",",
            "\"origin\":\"New York (JFK)\",",
            "\"destination\":\"London (LHR)\",",
            "\"departure_time\":\"2026-03-15T08:00:00Z\",",
            "\"seat\":\"5A\",",
            "\"seat_class\":\"economy\",",
            "\"passenger_name\":\"Jane Doe\",",
            "\"account\":\"anonymous\",",
            "\"issued_at\":\"2026-01-02T12:30:45Z\"}",
        );
        assert_eq!(String::from_utf8(bytes).unwrap(), expected);
    }

    #[test]
    fn rebuilding_from_same_facts_gives_same_bytes() {
        let a = sample().canonical_bytes().unwrap();
        let b = sample().canonical_bytes().unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn timestamps_truncate_subsecond_precision() {
        let with_nanos = Utc.timestamp_opt(1_767_441_045, 987_654_321).unwrap();
        let ts = canonical_timestamp(with_nanos);
        assert!(ts.ends_with('Z'));
        assert!(!ts.contains('.'));
    }

    #[test]
    fn account_token_falls_back_to_anonymous() {
        let owner = Uuid::new_v4();
        assert_eq!(canonical_account(Some(owner)), owner.to_string());
        assert_eq!(canonical_account(None), "anonymous");
    }
}
