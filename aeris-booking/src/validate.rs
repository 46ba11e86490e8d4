use aeris_core::booking::BookingRequest;
use aeris_core::{BookingError, BookingResult};

pub const MAX_PASSENGER_NAME_LEN: usize = 120;
pub const MAX_SENSITIVE_PAYLOAD_LEN: usize = 4096;

/// Shape checks that run before any database or crypto work. A request that
/// fails here never starts a transaction.
pub fn validate_request(request: &BookingRequest) -> BookingResult<()> {
    let name = request.passenger_name.trim();
    if name.is_empty() {
        return Err(BookingError::Validation(
            "passenger name must not be empty".to_string(),
        ));
    }
    if name.len() > MAX_PASSENGER_NAME_LEN {
        return Err(BookingError::Validation(format!(
            "passenger name exceeds {} characters",
            MAX_PASSENGER_NAME_LEN
        )));
    }

    let payload = &request.sensitive_payload.0;
    if payload.trim().is_empty() {
        return Err(BookingError::Validation(
            "sensitive payload must not be empty".to_string(),
        ));
    }
    if payload.len() > MAX_SENSITIVE_PAYLOAD_LEN {
        return Err(BookingError::Validation(format!(
            "sensitive payload exceeds {} bytes",
            MAX_SENSITIVE_PAYLOAD_LEN
        )));
    }

    Ok(())
}
