use std::sync::Arc;

use axum::{
    middleware,
    routing::{delete, get, post},
    Router,
};

use auth_cell::services::gate::auth_middleware;
use shared_store::AppContext;

use crate::handlers;

/// Directory reads are public; availability and the admin mutations sit
/// behind the bearer-token gate. The gate is layered per method router so
/// GET and POST can share the root path.
pub fn doctor_routes(state: Arc<AppContext>) -> Router {
    let auth = middleware::from_fn_with_state(state.clone(), auth_middleware);

    Router::new()
        .route("/filter", get(handlers::filter_doctors))
        .route(
            "/",
            get(handlers::list_doctors).merge(
                post(handlers::create_doctor)
                    .put(handlers::update_doctor)
                    .layer(auth.clone()),
            ),
        )
        .route("/{id}", delete(handlers::delete_doctor).layer(auth.clone()))
        .route(
            "/{id}/availability",
            get(handlers::doctor_availability).layer(auth),
        )
        .with_state(state)
}
