use std::sync::Arc;

use axum::{routing::get, Router};

use appointment_cell::router::{appointment_routes, prescription_routes};
use auth_cell::router::auth_routes;
use doctor_cell::router::doctor_routes;
use patient_cell::router::patient_routes;
use shared_store::AppContext;

pub fn create_router(state: Arc<AppContext>) -> Router {
    Router::new()
        .route("/", get(|| async { "Clinic API is running!" }))
        .nest("/auth", auth_routes(state.clone()))
        .nest("/doctors", doctor_routes(state.clone()))
        .nest("/patients", patient_routes(state.clone()))
        .nest("/appointments", appointment_routes(state.clone()))
        .nest("/prescriptions", prescription_routes(state))
}
