use axum::{extract::State, routing::get, Json, Router};
use chrono::Utc;
use serde_json::{json, Value};

use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new().route("/api/health", get(health_check))
}

async fn health_check(State(state): State<AppState>) -> Json<Value> {
    let database = match state.store.ping().await {
        Ok(()) => "connected".to_string(),
        Err(err) => format!("error: {}", err),
    };

    Json(json!({
        "status": "ok",
        "service": "aeris-api",
        "database": database,
        "crypto_backend": state.backend.as_str(),
        "timestamp": Utc::now().to_rfc3339(),
    }))
}
