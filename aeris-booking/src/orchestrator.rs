//! The booking transaction orchestrator.
//!
//! One call, one transaction: lock the seat, seal (reference + encryption +
//! signature), persist, flip the seat, commit. Any failure after `begin`
//! rolls the whole thing back, so a sealed-but-unbacked booking can never
//! become visible. The sealing calls happen while the row lock is held -
//! after it, so no crypto work is spent on a doomed booking, and before the
//! conditional update, so the sealed record and the seat flip land together.

use std::sync::Arc;

use chrono::Utc;
use tracing::{info, warn};
use uuid::Uuid;

use aeris_core::booking::{
    BookingRequest, NewBooking, SealSummary, SealedBooking, SealedFlightFacts, SealedSeatFacts,
};
use aeris_core::seal::CryptoSealer;
use aeris_core::store::{BookingStore, BookingTx};
use aeris_core::ticket::TicketMetadata;
use aeris_core::{BookingError, BookingResult};

use crate::validate;

/// Bounded retry for reference collisions. Exhausting this is fatal.
pub const REFERENCE_ATTEMPTS: u32 = 5;

pub struct BookingOrchestrator {
    store: Arc<dyn BookingStore>,
    sealer: Arc<dyn CryptoSealer>,
    reference_length: usize,
}

impl BookingOrchestrator {
    pub fn new(store: Arc<dyn BookingStore>, sealer: Arc<dyn CryptoSealer>) -> Self {
        Self {
            store,
            sealer,
            reference_length: 12,
        }
    }

    pub fn with_reference_length(mut self, reference_length: usize) -> Self {
        self.reference_length = reference_length;
        self
    }

    pub async fn create_booking(&self, request: BookingRequest) -> BookingResult<SealedBooking> {
        // 1. Shape checks before touching the database.
        validate::validate_request(&request)?;

        // 2. Everything from here on is one atomic unit.
        let mut tx = self.store.begin().await?;

        match self.seal_and_persist(tx.as_mut(), &request).await {
            Ok(sealed) => {
                tx.commit().await?;
                info!(
                    reference = %sealed.reference,
                    seat = %sealed.seat.label,
                    flight = %sealed.flight.flight_number,
                    "booking committed"
                );
                Ok(sealed)
            }
            Err(err) => {
                if let Err(rb_err) = tx.rollback().await {
                    warn!("rollback after failed booking also failed: {}", rb_err);
                }
                Err(err)
            }
        }
    }

    async fn seal_and_persist(
        &self,
        tx: &mut dyn BookingTx,
        request: &BookingRequest,
    ) -> BookingResult<SealedBooking> {
        // 3. Exclusive, fail-fast seat lock. Before any crypto work: sealing
        //    is the expensive part and must not be wasted on a doomed booking.
        let seat = tx.lock_seat(request.seat_id).await?;
        if seat.flight_id != request.flight_id {
            return Err(BookingError::Validation(
                "seat does not belong to the requested flight".to_string(),
            ));
        }

        // 4. Owning flight. Unreachable if the seat exists, but treated as a
        //    real error path, not an assertion.
        let flight = tx.find_flight(seat.flight_id).await?;

        // 5. Unique reference, bounded collision retry.
        let mut reference = None;
        for attempt in 1..=REFERENCE_ATTEMPTS {
            let candidate = self.sealer.generate_reference(self.reference_length).await?;
            if !tx.reference_exists(&candidate.code).await? {
                reference = Some(candidate);
                break;
            }
            tracing::debug!(attempt, "booking reference collision, regenerating");
        }
        let reference = reference.ok_or(BookingError::ReferenceExhausted {
            attempts: REFERENCE_ATTEMPTS,
        })?;

        // 6. Encrypt the sensitive payload.
        let payload = self
            .sealer
            .encrypt(request.sensitive_payload.0.as_bytes())
            .await?;

        // 7. Canonical ticket metadata - the exact bytes that get signed and
        //    re-verified later.
        let booking_id = Uuid::new_v4();
        let created_at = Utc::now();
        let ticket = TicketMetadata::new(
            &reference.code,
            &flight.flight_number,
            &flight.origin,
            &flight.destination,
            flight.departure_time,
            &seat.label(),
            seat.class,
            request.passenger_name.trim(),
            request.account_id,
            created_at,
        );
        let canonical = ticket.canonical_bytes().map_err(BookingError::internal)?;

        // 8. Detached signature over the canonical bytes.
        let signature = self.sealer.sign(&canonical).await?;

        // 9. Persist the sealed record.
        let booking = NewBooking {
            id: booking_id,
            seat_id: seat.id,
            flight_id: flight.id,
            reference: reference.code.clone(),
            passenger_name: request.passenger_name.trim().to_string(),
            account_id: request.account_id,
            payload,
            signature,
            reference_algorithm: reference.algorithm.clone(),
            reference_simulated: reference.simulated,
            created_at,
        };
        tx.insert_booking(&booking).await?;

        // 10. Conditional seat flip against the version observed under the
        //     lock. A conflict here discards the sealed record with the rest
        //     of the transaction.
        tx.mark_booked(seat.id, seat.version).await?;

        Ok(SealedBooking {
            booking_id,
            reference: booking.reference.clone(),
            passenger_name: booking.passenger_name.clone(),
            flight: SealedFlightFacts {
                flight_number: flight.flight_number,
                origin: flight.origin,
                destination: flight.destination,
                departure_time: flight.departure_time,
            },
            seat: SealedSeatFacts {
                id: seat.id,
                label: seat.label(),
                class: seat.class,
            },
            security: SealSummary::from_seals(
                &booking.reference_algorithm,
                booking.reference_simulated,
                &booking.payload,
                &booking.signature,
            ),
        })
    }
}
