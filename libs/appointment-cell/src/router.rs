use std::sync::Arc;

use axum::{
    middleware,
    routing::{delete, get, patch, post, put},
    Router,
};

use auth_cell::services::gate::auth_middleware;
use shared_store::AppContext;

use crate::handlers;

/// Every appointment operation requires a bearer token; handlers enforce the
/// specific role on top.
pub fn appointment_routes(state: Arc<AppContext>) -> Router {
    let protected = Router::new()
        .route("/", post(handlers::book_appointment))
        .route("/", put(handlers::update_appointment))
        .route("/", get(handlers::list_appointments))
        .route("/{id}", delete(handlers::cancel_appointment))
        .route("/{id}/status", patch(handlers::change_status))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ));

    Router::new().merge(protected).with_state(state)
}

pub fn prescription_routes(state: Arc<AppContext>) -> Router {
    let protected = Router::new()
        .route("/", post(handlers::save_prescription))
        .route("/{appointment_id}", get(handlers::get_prescription))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ));

    Router::new().merge(protected).with_state(state)
}
