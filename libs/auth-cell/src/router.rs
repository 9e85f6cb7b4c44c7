use std::sync::Arc;

use axum::{routing::post, Router};

use shared_store::AppContext;

use crate::handlers;

pub fn auth_routes(state: Arc<AppContext>) -> Router {
    Router::new()
        .route("/admin/login", post(handlers::admin_login))
        .route("/doctor/login", post(handlers::doctor_login))
        .route("/patient/login", post(handlers::patient_login))
        .with_state(state)
}
