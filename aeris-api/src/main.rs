use std::net::SocketAddr;
use std::sync::Arc;

use aeris_api::{app, AppState};
use aeris_booking::{BookingOrchestrator, VerificationService};
use aeris_core::store::BookingStore;
use aeris_store::{DbClient, MemoryStore, PgBookingStore};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "aeris_api=debug,tower_http=debug,axum::rejection=trace".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = aeris_store::app_config::Config::load().expect("Failed to load config");
    tracing::info!("Starting Aeris API on port {}", config.server.port);

    let sealer = aeris_seal::sealer_from_config(
        &config.crypto.backend,
        config.crypto.master_key.as_deref(),
        config.crypto.signing_key.as_deref(),
    )
    .expect("Failed to build crypto sealer");
    let backend = sealer.backend();

    let store: Arc<dyn BookingStore> = if config.database.url == "memory" {
        tracing::info!("Using in-process memory store");
        let store = MemoryStore::new();
        if config.demo.seed {
            aeris_store::provision::seed_demo_memory(&store);
        }
        Arc::new(store)
    } else {
        let db = DbClient::new(&config.database.url, config.database.max_connections)
            .await
            .expect("Failed to connect to database");
        db.migrate().await.expect("Failed to run migrations");
        if config.demo.seed {
            aeris_store::provision::seed_demo(&db.pool)
                .await
                .expect("Failed to seed demo catalog");
        }
        Arc::new(PgBookingStore::new(db.pool.clone()))
    };

    let orchestrator = Arc::new(
        BookingOrchestrator::new(store.clone(), sealer.clone())
            .with_reference_length(config.crypto.reference_length),
    );
    let verifier = Arc::new(VerificationService::new(store.clone(), sealer));

    let app_state = AppState {
        store,
        orchestrator,
        verifier,
        backend,
    };

    let app = app(app_state);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.server.port));
    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await.unwrap();
    axum::serve(listener, app).await.unwrap();
}
