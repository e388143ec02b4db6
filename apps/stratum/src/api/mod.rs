//! # Stratum HTTP API Module
//!
//! The HTTP REST surface over the bridge facade, built on axum.
//!
//! ## Endpoints
//!
//! - `GET /health` - Health check
//! - `GET /status` - Boot phase, sync and hydration status
//! - `GET /boot` - Boot report
//! - `POST /flush` - Flush pending changes to the durable tier
//! - `POST /hydrate` - Rebuild the graph projection
//! - `POST /query` - Run a graph query script
//! - `GET|PUT /notes`, `GET|DELETE /notes/{id}`
//! - `GET|PUT /folders`, `DELETE /folders/{id}`
//! - `GET|PUT /entities`, `DELETE /entities/{id}`
//! - `GET|PUT /relationships`, `DELETE /relationships/{id}`
//!
//! ## Configuration (Environment Variables)
//!
//! - `STRATUM_CORS_ORIGINS`: Comma-separated list of allowed origins, or "*" for all (default: localhost only)

mod handlers;
mod types;

pub use types::{
    DeleteResponse, ErrorResponse, FlushResponse, HealthResponse, QueryRequest, QueryResponse,
    StatusResponse, WriteResponse,
};

use crate::app::App;
use crate::bridge::Bridge;
use axum::{
    Router,
    extract::DefaultBodyLimit,
    http::{HeaderValue, Method, header},
    routing::{get, post},
};
use std::sync::Arc;
use stratum_core::StratumError;
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

/// Maximum request body size (2 MiB).
const MAX_BODY_SIZE: usize = 2 * 1024 * 1024;

// =============================================================================
// SERVER STATE
// =============================================================================

/// Shared server state.
#[derive(Clone)]
pub struct AppState {
    pub bridge: Arc<Bridge>,
}

impl AppState {
    #[must_use]
    pub fn new(bridge: Arc<Bridge>) -> Self {
        Self { bridge }
    }
}

// =============================================================================
// CORS CONFIGURATION
// =============================================================================

/// Build the CORS layer from `STRATUM_CORS_ORIGINS`.
///
/// - `*` allows every origin (development only)
/// - unset or unparsable falls back to localhost only
/// - otherwise a comma-separated list of origins
fn build_cors_layer() -> CorsLayer {
    let origins_env = std::env::var("STRATUM_CORS_ORIGINS").ok();

    match origins_env.as_deref() {
        Some("*") => {
            tracing::warn!("CORS: Allowing ALL origins (STRATUM_CORS_ORIGINS=*)");
            CorsLayer::permissive()
        }
        Some(origins) => {
            let allowed: Vec<HeaderValue> = origins
                .split(',')
                .filter_map(|s| {
                    let trimmed = s.trim();
                    match trimmed.parse::<HeaderValue>() {
                        Ok(hv) => Some(hv),
                        Err(e) => {
                            tracing::warn!("CORS: Invalid origin '{}': {}", trimmed, e);
                            None
                        }
                    }
                })
                .collect();

            if allowed.is_empty() {
                tracing::warn!("CORS: No valid origins in STRATUM_CORS_ORIGINS, using localhost");
                build_localhost_cors()
            } else {
                with_methods(CorsLayer::new().allow_origin(allowed))
            }
        }
        None => build_localhost_cors(),
    }
}

fn build_localhost_cors() -> CorsLayer {
    let origins: Vec<HeaderValue> = [
        "http://localhost:3000",
        "http://localhost:8080",
        "http://127.0.0.1:3000",
        "http://127.0.0.1:8080",
    ]
    .iter()
    .filter_map(|o| o.parse::<HeaderValue>().ok())
    .collect();

    with_methods(CorsLayer::new().allow_origin(origins))
}

fn with_methods(layer: CorsLayer) -> CorsLayer {
    layer
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::CONTENT_TYPE])
}

// =============================================================================
// ROUTER CREATION
// =============================================================================

/// Create the axum router with every endpoint and the middleware stack.
///
/// Layers (outer to inner): tracing, CORS, body limit.
pub fn create_router(state: AppState) -> Router {
    let middleware = ServiceBuilder::new()
        .layer(TraceLayer::new_for_http())
        .layer(build_cors_layer())
        .layer(DefaultBodyLimit::max(MAX_BODY_SIZE));

    Router::new()
        .route("/health", get(handlers::health_handler))
        .route("/status", get(handlers::status_handler))
        .route("/boot", get(handlers::boot_handler))
        .route("/flush", post(handlers::flush_handler))
        .route("/hydrate", post(handlers::hydrate_handler))
        .route("/query", post(handlers::query_handler))
        .route(
            "/notes",
            get(handlers::list_notes_handler).put(handlers::put_note_handler),
        )
        .route(
            "/notes/{id}",
            get(handlers::get_note_handler).delete(handlers::delete_note_handler),
        )
        .route(
            "/folders",
            get(handlers::list_folders_handler).put(handlers::put_folder_handler),
        )
        .route(
            "/folders/{id}",
            axum::routing::delete(handlers::delete_folder_handler),
        )
        .route(
            "/entities",
            get(handlers::list_entities_handler).put(handlers::put_entity_handler),
        )
        .route(
            "/entities/{id}",
            axum::routing::delete(handlers::delete_entity_handler),
        )
        .route(
            "/relationships",
            get(handlers::list_relationships_handler).put(handlers::put_relationship_handler),
        )
        .route(
            "/relationships/{id}",
            axum::routing::delete(handlers::delete_relationship_handler),
        )
        .layer(middleware)
        .with_state(state)
}

// =============================================================================
// SERVER STARTUP
// =============================================================================

/// Serve the API for a started app until ctrl-c, then flush.
pub async fn run_server(addr: &str, app: &App) -> Result<(), StratumError> {
    let router = create_router(AppState::new(app.bridge().clone()));

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|e| StratumError::IoError(format!("Bind failed: {}", e)))?;

    tracing::info!("Stratum HTTP server listening on {}", addr);

    let served = axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| StratumError::IoError(format!("Server error: {}", e)));

    app.shutdown().await;
    served
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!("Cannot listen for ctrl-c: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
