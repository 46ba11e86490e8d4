use axum::{extract::State, routing::get, Json, Router};
use serde::Serialize;

use aeris_core::model::FlightSummary;

use crate::error::AppError;
use crate::state::AppState;

#[derive(Debug, Serialize)]
struct FlightsResponse {
    count: usize,
    flights: Vec<FlightSummary>,
}

pub fn routes() -> Router<AppState> {
    Router::new().route("/api/flights", get(list_flights))
}

async fn list_flights(State(state): State<AppState>) -> Result<Json<FlightsResponse>, AppError> {
    let flights = state.store.list_flights().await?;
    Ok(Json(FlightsResponse {
        count: flights.len(),
        flights,
    }))
}
