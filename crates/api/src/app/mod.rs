//! HTTP API application wiring (Axum router + service wiring).
//!
//! - `services.rs`: stores, authenticator, renderer, sessions
//! - `routes/`: HTTP routes + handlers, and the route access table
//! - `dto.rs`: request/response bodies
//! - `errors.rs`: consistent error responses

use std::sync::Arc;

use axum::{Extension, Router};
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;

use crate::middleware;

pub mod dto;
pub mod errors;
pub mod routes;
pub mod services;

use services::AppServices;

/// Build the full HTTP router (public entrypoint used by `main.rs` and tests).
pub fn build_app(services: Arc<AppServices>) -> Router {
    let access = Arc::new(routes::access_table());
    for (route, class) in access.entries() {
        tracing::debug!(route, access = ?class, "route access");
    }

    let gate = middleware::GateState {
        access,
        services: services.clone(),
    };

    // route_layer: the gate must see the matched route, and unknown paths
    // should stay plain 404s.
    routes::router()
        .route_layer(axum::middleware::from_fn_with_state(
            gate,
            middleware::permission_gate,
        ))
        .layer(Extension(services))
        .layer(ServiceBuilder::new().layer(TraceLayer::new_for_http()))
}
