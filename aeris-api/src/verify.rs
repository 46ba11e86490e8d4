use axum::{
    extract::{Json, State},
    routing::post,
    Router,
};
use serde::Deserialize;

use aeris_booking::VerificationReport;

use crate::error::AppError;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
struct VerifyBody {
    reference: String,
}

pub fn routes() -> Router<AppState> {
    Router::new().route("/api/verify", post(verify_ticket))
}

/// The reference format is enforced here, before the core sees it.
fn is_valid_reference(reference: &str) -> bool {
    (6..=16).contains(&reference.len())
        && reference
            .chars()
            .all(|c| c.is_ascii_uppercase() || c.is_ascii_digit())
}

async fn verify_ticket(
    State(state): State<AppState>,
    Json(body): Json<VerifyBody>,
) -> Result<Json<VerificationReport>, AppError> {
    let reference = body.reference.trim().to_uppercase();
    if !is_valid_reference(&reference) {
        return Err(AppError::Validation(
            "reference must be 6-16 uppercase alphanumeric characters".to_string(),
        ));
    }

    let report = state.verifier.verify(&reference).await?;
    Ok(Json(report))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reference_format_bounds() {
        assert!(is_valid_reference("ABC123"));
        assert!(is_valid_reference("K7Q2M9X4TZ1B"));
        assert!(is_valid_reference("ABCDEFGH12345678"));

        assert!(!is_valid_reference("ABC12")); // too short
        assert!(!is_valid_reference("ABCDEFGH123456789")); // too long
        assert!(!is_valid_reference("abc123")); // lowercase
        assert!(!is_valid_reference("ABC-123")); // separator
        assert!(!is_valid_reference(""));
    }
}
