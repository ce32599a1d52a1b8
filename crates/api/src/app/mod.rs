//! HTTP API application wiring (Axum router + shared layers).
//!
//! - `routes/`: endpoint tables and handlers (one file per controller)
//! - `extract.rs`: JSON extractor that fails with the error envelope
//! - `dto.rs`: small request/response shapes shared by controllers
//! - `errors.rs`: consistent error responses

use std::sync::Arc;

use axum::http::HeaderValue;
use axum::{Extension, Router};
use tower::ServiceBuilder;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::context::AppContext;
use crate::middleware;

pub mod dto;
pub mod errors;
pub mod extract;
pub mod routes;

/// Build the full HTTP router (public entrypoint used by `main.rs` and tests).
pub fn build_app(app: Arc<AppContext>) -> Router {
    let cors = cors_layer(&app.config.cors_allowed_origins);

    routes::router()
        .route_layer(axum::middleware::from_fn_with_state(
            app.clone(),
            middleware::request_pipeline,
        ))
        .layer(Extension(app))
        .layer(ServiceBuilder::new().layer(TraceLayer::new_for_http()).layer(cors))
}

/// Allow-listed origins with any method and header.
fn cors_layer(origins: &[String]) -> CorsLayer {
    let origins: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(err) => {
                tracing::warn!(origin = %origin, error = %err, "ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods(Any)
        .allow_headers(Any)
}
