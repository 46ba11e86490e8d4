use std::sync::Arc;

use aeris_booking::{BookingOrchestrator, VerificationService};
use aeris_core::seal::SealerBackend;
use aeris_core::store::BookingStore;

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn BookingStore>,
    pub orchestrator: Arc<BookingOrchestrator>,
    pub verifier: Arc<VerificationService>,
    pub backend: SealerBackend,
}
