//! HTTP API application wiring (Axum router + service wiring).
//!
//! - `services.rs`: collaborator wiring and entity lookups
//! - `views.rs`: representation selection and builders
//! - `routes/`: HTTP routes + handlers (one file per resource)
//! - `errors.rs`: consistent error responses

use std::sync::Arc;

use axum::{Extension, Router};
use tower::ServiceBuilder;
use tower_http::request_id::{PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::trace::{DefaultOnResponse, TraceLayer};
use tower_http::LatencyUnit;
use tracing::Level;

use crate::middleware::{self, MakeRequestUuid, REQUEST_ID_HEADER};

pub mod errors;
pub mod routes;
pub mod services;
pub mod views;

/// Build the full HTTP router around already wired services.
///
/// Every response, 404 and 405 fallbacks included, carries `x-request-id`:
/// the caller's value when present, a fresh UUIDv7 otherwise.
pub fn build_app(services: Arc<services::AppServices>) -> Router {
    routes::router().fallback(errors::not_found).layer(
        ServiceBuilder::new()
            .layer(SetRequestIdLayer::new(REQUEST_ID_HEADER, MakeRequestUuid))
            .layer(
                TraceLayer::new_for_http()
                    .make_span_with(middleware::request_span)
                    .on_response(
                        DefaultOnResponse::new()
                            .level(Level::INFO)
                            .latency_unit(LatencyUnit::Millis),
                    ),
            )
            .layer(PropagateRequestIdLayer::new(REQUEST_ID_HEADER))
            .layer(Extension(services)),
    )
}
