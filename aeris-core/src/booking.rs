use aeris_shared::pii::{self, Masked};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::model::SeatClass;
use crate::seal::{EncryptSeal, SignatureSeal};

/// How much of a sealed artifact display surfaces may show.
pub const PREVIEW_LEN: usize = 80;

#[derive(Debug, Clone, Deserialize)]
pub struct BookingRequest {
    pub flight_id: Uuid,
    pub seat_id: Uuid,
    pub passenger_name: String,
    /// Passenger-sensitive payload (passport string). Masked so it cannot
    /// leak through Debug formatting in logs.
    pub sensitive_payload: Masked<String>,
    pub account_id: Option<Uuid>,
}

/// Everything the store persists for a booking, assembled inside the
/// transaction after sealing succeeded.
#[derive(Debug, Clone)]
pub struct NewBooking {
    pub id: Uuid,
    pub seat_id: Uuid,
    pub flight_id: Uuid,
    pub reference: String,
    pub passenger_name: String,
    pub account_id: Option<Uuid>,
    pub payload: EncryptSeal,
    pub signature: SignatureSeal,
    pub reference_algorithm: String,
    pub reference_simulated: bool,
    pub created_at: DateTime<Utc>,
}

/// A stored booking joined with the seat and flight facts verification needs
/// to reconstruct the signed metadata.
#[derive(Debug, Clone)]
pub struct BookingRecord {
    pub id: Uuid,
    pub reference: String,
    pub passenger_name: String,
    pub account_id: Option<Uuid>,
    pub payload: EncryptSeal,
    pub signature: SignatureSeal,
    pub reference_algorithm: String,
    pub reference_simulated: bool,
    pub created_at: DateTime<Utc>,
    pub seat_id: Uuid,
    pub seat_row: i32,
    pub seat_col: String,
    pub seat_class: SeatClass,
    pub flight_id: Uuid,
    pub flight_number: String,
    pub origin: String,
    pub destination: String,
    pub departure_time: DateTime<Utc>,
}

/// The caller-facing result of a committed booking. Sealed material appears
/// only in truncated preview form.
#[derive(Debug, Clone, Serialize)]
pub struct SealedBooking {
    pub booking_id: Uuid,
    pub reference: String,
    pub passenger_name: String,
    pub flight: SealedFlightFacts,
    pub seat: SealedSeatFacts,
    pub security: SealSummary,
}

#[derive(Debug, Clone, Serialize)]
pub struct SealedFlightFacts {
    pub flight_number: String,
    pub origin: String,
    pub destination: String,
    pub departure_time: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SealedSeatFacts {
    pub id: Uuid,
    pub label: String,
    pub class: SeatClass,
}

#[derive(Debug, Clone, Serialize)]
pub struct SealSummary {
    pub simulated: bool,
    pub reference_algorithm: String,
    pub encryption_algorithm: String,
    pub capsule_preview: String,
    pub signature_algorithm: String,
    pub signature_preview: String,
    pub content_hash: String,
}

impl SealSummary {
    pub fn from_seals(
        reference_algorithm: &str,
        reference_simulated: bool,
        payload: &EncryptSeal,
        signature: &SignatureSeal,
    ) -> Self {
        SealSummary {
            simulated: reference_simulated || payload.simulated || signature.simulated,
            reference_algorithm: reference_algorithm.to_string(),
            encryption_algorithm: payload.algorithm.clone(),
            capsule_preview: pii::preview(&payload.key_capsule, PREVIEW_LEN),
            signature_algorithm: signature.algorithm.clone(),
            signature_preview: pii::preview(&signature.signature, PREVIEW_LEN),
            content_hash: signature.content_hash.clone(),
        }
    }
}
