use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use chrono::{Duration, Utc};
use http_body_util::BodyExt;
use serde_json::{json, Value};
use tower::ServiceExt;
use uuid::Uuid;

use aeris_api::{app, AppState};
use aeris_booking::{BookingOrchestrator, VerificationService};
use aeris_core::model::{Flight, FlightStatus};
use aeris_core::seal::CryptoSealer;
use aeris_core::store::BookingStore;
use aeris_seal::SimulatedSealer;
use aeris_store::MemoryStore;

fn test_state() -> (AppState, Uuid) {
    let store = MemoryStore::new();
    let flight = Flight {
        id: Uuid::new_v4(),
        flight_number: "QA-101".to_string(),
        origin: "New York (JFK)".to_string(),
        destination: "London (LHR)".to_string(),
        departure_time: Utc::now() + Duration::days(30),
        arrival_time: Utc::now() + Duration::days(30) + Duration::hours(7),
        price_amount: 89999,
        price_currency: "USD".to_string(),
        aircraft_type: "Q-100".to_string(),
        total_rows: 10,
        seats_per_row: 6,
        status: FlightStatus::Scheduled,
    };
    let flight_id = flight.id;
    store.provision_flight(flight);
    store.prebook_seat(flight_id, 1, "A");

    let store_arc: Arc<dyn BookingStore> = Arc::new(store);
    let sealer: Arc<dyn CryptoSealer> = Arc::new(SimulatedSealer::new());
    let backend = sealer.backend();

    let state = AppState {
        store: store_arc.clone(),
        orchestrator: Arc::new(BookingOrchestrator::new(store_arc.clone(), sealer.clone())),
        verifier: Arc::new(VerificationService::new(store_arc, sealer)),
        backend,
    };
    (state, flight_id)
}

fn post_json(uri: &str, body: &Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

async fn response_json(response: axum::response::Response) -> Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn full_booking_and_verification_flow() {
    let (state, flight_id) = test_state();
    let router = app(state);

    // Flights listing shows the provisioned catalog.
    let response = router.clone().oneshot(get("/api/flights")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = response_json(response).await;
    assert_eq!(body["count"], 1);
    assert_eq!(body["flights"][0]["flight_number"], "QA-101");
    assert_eq!(body["flights"][0]["total_seats"], 60);
    assert_eq!(body["flights"][0]["available_seats"], 59);

    // Seat map is grouped and ordered; 1A came pre-booked.
    let response = router
        .clone()
        .oneshot(get(&format!("/api/flights/{}/seats", flight_id)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = response_json(response).await;
    assert_eq!(body["rows"][0]["row"], 1);
    assert_eq!(body["rows"][0]["class"], "first");
    assert_eq!(body["rows"][0]["seats"][0]["label"], "1A");
    assert_eq!(body["rows"][0]["seats"][0]["booked"], true);
    assert_eq!(body["statistics"]["booked_seats"], 1);

    // Book 5A by row/col addressing.
    let response = router
        .clone()
        .oneshot(post_json(
            "/api/bookings",
            &json!({
                "flight_id": flight_id,
                "row": 5,
                "col": "a",
                "passenger_name": "Jane Doe",
                "passport": "P12345678",
            }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    let body = response_json(response).await;
    let reference = body["reference"].as_str().unwrap().to_string();
    assert!(reference.len() >= 6 && reference.len() <= 16);
    assert!(reference
        .chars()
        .all(|c| c.is_ascii_uppercase() || c.is_ascii_digit()));
    assert_eq!(body["seat"]["label"], "5A");
    assert_eq!(body["security"]["simulated"], true);
    // Only previews of sealed material leave the API.
    let capsule_preview = body["security"]["capsule_preview"].as_str().unwrap();
    assert!(capsule_preview.ends_with("..."));

    // Booking the same seat again conflicts.
    let response = router
        .clone()
        .oneshot(post_json(
            "/api/bookings",
            &json!({
                "flight_id": flight_id,
                "row": 5,
                "col": "A",
                "passenger_name": "John Roe",
                "passport": "P87654321",
            }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CONFLICT);

    // Verification succeeds and reconstructs the ticket.
    let response = router
        .clone()
        .oneshot(post_json("/api/verify", &json!({ "reference": reference })))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = response_json(response).await;
    assert_eq!(body["valid"], true);
    assert_eq!(body["ticket"]["seat"], "5A");
    assert_eq!(body["ticket"]["passenger_name"], "Jane Doe");
}

#[tokio::test]
async fn booking_by_seat_id() {
    let (state, flight_id) = test_state();
    let store = state.store.clone();
    let router = app(state);

    let seat_id = store.find_seat(flight_id, 7, "C").await.unwrap().unwrap();
    let response = router
        .oneshot(post_json(
            "/api/bookings",
            &json!({
                "flight_id": flight_id,
                "seat_id": seat_id,
                "passenger_name": "Jane Doe",
                "passport": "P12345678",
            }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    let body = response_json(response).await;
    assert_eq!(body["seat"]["label"], "7C");
}

#[tokio::test]
async fn request_shape_errors() {
    let (state, flight_id) = test_state();
    let router = app(state);

    // No seat addressing at all.
    let response = router
        .clone()
        .oneshot(post_json(
            "/api/bookings",
            &json!({
                "flight_id": flight_id,
                "passenger_name": "Jane Doe",
                "passport": "P12345678",
            }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    // Blank passenger name is caught before any transaction starts.
    let response = router
        .clone()
        .oneshot(post_json(
            "/api/bookings",
            &json!({
                "flight_id": flight_id,
                "row": 6,
                "col": "B",
                "passenger_name": "  ",
                "passport": "P12345678",
            }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    // Unknown seat position.
    let response = router
        .clone()
        .oneshot(post_json(
            "/api/bookings",
            &json!({
                "flight_id": flight_id,
                "row": 99,
                "col": "Z",
                "passenger_name": "Jane Doe",
                "passport": "P12345678",
            }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    // Malformed reference never reaches the verifier.
    let response = router
        .clone()
        .oneshot(post_json("/api/verify", &json!({ "reference": "nope!" })))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    // Well-formed but unknown reference is a 404.
    let response = router
        .clone()
        .oneshot(post_json("/api/verify", &json!({ "reference": "ZZZZZZ999999" })))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    // Unknown flight for the seat map.
    let response = router
        .clone()
        .oneshot(get(&format!("/api/flights/{}/seats", Uuid::new_v4())))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn health_reports_store_and_backend() {
    let (state, _) = test_state();
    let router = app(state);

    let response = router.oneshot(get("/api/health")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = response_json(response).await;
    assert_eq!(body["status"], "ok");
    assert_eq!(body["database"], "connected");
    assert_eq!(body["crypto_backend"], "simulated");
}
