use std::sync::Arc;

use axum::{
    routing::{get, post},
    Router,
};

use shared_store::AppContext;

use crate::handlers;

/// Signup is open; the history read carries its own patient-token check in
/// the handler, so no middleware layer here.
pub fn patient_routes(state: Arc<AppContext>) -> Router {
    Router::new()
        .route("/", post(handlers::create_patient))
        .route("/me/appointments", get(handlers::my_appointments))
        .with_state(state)
}
