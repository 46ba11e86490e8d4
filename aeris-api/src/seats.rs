use axum::{
    extract::{Path, State},
    routing::get,
    Json, Router,
};
use uuid::Uuid;

use aeris_core::model::SeatMap;

use crate::error::AppError;
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new().route("/api/flights/{flight_id}/seats", get(seat_map))
}

async fn seat_map(
    State(state): State<AppState>,
    Path(flight_id): Path<Uuid>,
) -> Result<Json<SeatMap>, AppError> {
    let map = state.store.seat_map(flight_id).await?;
    Ok(Json(map))
}
