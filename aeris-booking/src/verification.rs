//! On-demand signature verification for stored bookings.
//!
//! The canonical metadata is reconstructed from the stored booking, seat and
//! flight rows - never from a stored copy - so the check also catches drift
//! between booking-time and verify-time serialization. An invalid signature
//! is a normal outcome: it is what tampering looks like.

use std::sync::Arc;

use serde::Serialize;
use sha2::{Digest, Sha256};
use tracing::info;

use aeris_core::seal::{CryptoSealer, SealerBackend};
use aeris_core::store::BookingStore;
use aeris_core::ticket::TicketMetadata;
use aeris_core::{BookingError, BookingResult};

#[derive(Debug, Clone, Serialize)]
pub struct VerificationReport {
    pub valid: bool,
    pub ticket: TicketMetadata,
    pub algorithm: String,
    pub backend: SealerBackend,
    pub simulated: bool,
}

pub struct VerificationService {
    store: Arc<dyn BookingStore>,
    sealer: Arc<dyn CryptoSealer>,
}

impl VerificationService {
    pub fn new(store: Arc<dyn BookingStore>, sealer: Arc<dyn CryptoSealer>) -> Self {
        Self { store, sealer }
    }

    /// Read-only and repeatable; verification never mutates the booking.
    pub async fn verify(&self, reference: &str) -> BookingResult<VerificationReport> {
        let record = self
            .store
            .find_booking(reference)
            .await?
            .ok_or_else(|| BookingError::NotFound(format!("booking {}", reference)))?;

        let ticket = TicketMetadata::from_record(&record);
        let canonical = ticket.canonical_bytes().map_err(BookingError::internal)?;

        // Cheap integrity precheck against the stored content hash before
        // the signature math.
        let hash_matches = hex::encode(Sha256::digest(&canonical)) == record.signature.content_hash;

        let valid = if hash_matches {
            self.sealer
                .verify(
                    &canonical,
                    &record.signature.signature,
                    &record.signature.verification_key,
                )
                .await?
                .valid
        } else {
            false
        };

        info!(reference, valid, "ticket verification");

        let backend = if record.signature.simulated {
            SealerBackend::Simulated
        } else {
            SealerBackend::Keyed
        };

        Ok(VerificationReport {
            valid,
            ticket,
            algorithm: record.signature.algorithm.clone(),
            backend,
            simulated: record.signature.simulated,
        })
    }
}
