use axum::{
    extract::{Json, State},
    http::StatusCode,
    routing::post,
    Router,
};
use serde::Deserialize;
use tracing::info;
use uuid::Uuid;

use aeris_core::booking::{BookingRequest, SealedBooking};
use aeris_shared::Masked;

use crate::error::AppError;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
struct CreateBookingBody {
    flight_id: Uuid,
    /// Either a direct seat id, or row + col addressing.
    seat_id: Option<Uuid>,
    row: Option<i32>,
    col: Option<String>,
    passenger_name: String,
    passport: Masked<String>,
    account_id: Option<Uuid>,
}

pub fn routes() -> Router<AppState> {
    Router::new().route("/api/bookings", post(create_booking))
}

async fn create_booking(
    State(state): State<AppState>,
    Json(body): Json<CreateBookingBody>,
) -> Result<(StatusCode, Json<SealedBooking>), AppError> {
    let seat_id = resolve_seat(&state, &body).await?;

    let sealed = state
        .orchestrator
        .create_booking(BookingRequest {
            flight_id: body.flight_id,
            seat_id,
            passenger_name: body.passenger_name,
            sensitive_payload: body.passport,
            account_id: body.account_id,
        })
        .await?;

    info!(reference = %sealed.reference, "booking created");
    Ok((StatusCode::CREATED, Json(sealed)))
}

async fn resolve_seat(state: &AppState, body: &CreateBookingBody) -> Result<Uuid, AppError> {
    if let Some(seat_id) = body.seat_id {
        return Ok(seat_id);
    }

    let (row, col) = match (body.row, body.col.as_deref()) {
        (Some(row), Some(col)) if !col.trim().is_empty() => (row, col.trim().to_uppercase()),
        _ => {
            return Err(AppError::Validation(
                "either seat_id or row and col are required".to_string(),
            ))
        }
    };

    state
        .store
        .find_seat(body.flight_id, row, &col)
        .await?
        .ok_or_else(|| {
            AppError::NotFound(format!(
                "seat {}{} on flight {} not found",
                row, col, body.flight_id
            ))
        })
}
