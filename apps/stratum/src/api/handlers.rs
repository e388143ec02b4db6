//! # API Endpoint Handlers
//!
//! Thin adapters from HTTP onto the bridge facade. Source-of-truth failures
//! map to 500; everything else degrades inside the bridge.

use super::{
    AppState,
    types::{
        DeleteResponse, ErrorResponse, FlushResponse, HealthResponse, HydrateResponse,
        QueryRequest, QueryResponse, StatusResponse, WriteResponse,
    },
};
use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use stratum_core::{Entity, Folder, Note, RecordCounts, Relationship, StratumError};

// =============================================================================
// HELPERS
// =============================================================================

fn internal_error(context: &str, e: &StratumError) -> Response {
    tracing::error!("{}: {}", context, e);
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(ErrorResponse::new(format!("{}: {}", context, e))),
    )
        .into_response()
}

fn list_response<T: Serialize>(context: &str, result: Result<Vec<T>, StratumError>) -> Response {
    match result {
        Ok(items) => (StatusCode::OK, Json(items)).into_response(),
        Err(e) => internal_error(context, &e),
    }
}

fn write_response(id: String, result: Result<(), StratumError>) -> Response {
    match result {
        Ok(()) => (StatusCode::OK, Json(WriteResponse::success(id))).into_response(),
        Err(e) => {
            tracing::error!(id = %id, "Write failed: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(WriteResponse::error(id, format!("Write failed: {}", e))),
            )
                .into_response()
        }
    }
}

fn delete_response(id: String, result: Result<bool, StratumError>) -> Response {
    match result {
        Ok(true) => (StatusCode::OK, Json(DeleteResponse { deleted: true, id })).into_response(),
        Ok(false) => (
            StatusCode::NOT_FOUND,
            Json(DeleteResponse { deleted: false, id }),
        )
            .into_response(),
        Err(e) => internal_error("Delete failed", &e),
    }
}

// =============================================================================
// HEALTH / STATUS / BOOT
// =============================================================================

/// Health check endpoint.
pub async fn health_handler() -> impl IntoResponse {
    Json(HealthResponse::default())
}

/// Boot phase, sync and hydration status.
pub async fn status_handler(State(state): State<AppState>) -> impl IntoResponse {
    let bridge = &state.bridge;
    let orchestrator = bridge.orchestrator();

    let counts = match bridge.counts() {
        Ok(counts) => counts,
        Err(e) => {
            tracing::warn!("Cannot count records: {}", e);
            RecordCounts::default()
        }
    };

    let response = StatusResponse {
        bridge: bridge.status(),
        phase: orchestrator.current(),
        ready: orchestrator.is_ready(),
        counts,
        sync: bridge.get_sync_status(),
        timings: orchestrator.timings(),
    };

    (StatusCode::OK, Json(response))
}

/// The boot report, once boot has completed.
pub async fn boot_handler(State(state): State<AppState>) -> Response {
    match state.bridge.boot_report() {
        Some(report) => (StatusCode::OK, Json(report)).into_response(),
        None => (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(ErrorResponse::new("Boot has not completed")),
        )
            .into_response(),
    }
}

// =============================================================================
// SYNC / QUERY
// =============================================================================

/// Flush pending changes to the durable tier.
pub async fn flush_handler(State(state): State<AppState>) -> impl IntoResponse {
    let outcome = state.bridge.flush_queue().await;
    let response = FlushResponse {
        outcome,
        pending: state.bridge.has_pending_sync(),
    };
    (StatusCode::OK, Json(response))
}

/// Rebuild the graph projection, including out of a failed state.
pub async fn hydrate_handler(State(state): State<AppState>) -> impl IntoResponse {
    let outcome = state.bridge.rehydrate().await;
    let hydrator = state.bridge.hydrator();
    let response = HydrateResponse {
        outcome,
        status: hydrator.status(),
        version: hydrator.version(),
    };
    (StatusCode::OK, Json(response))
}

/// Run a graph query script.
pub async fn query_handler(
    State(state): State<AppState>,
    Json(request): Json<QueryRequest>,
) -> impl IntoResponse {
    let rows = if request.hydrate {
        state
            .bridge
            .query_graph_async(&request.script, &request.params)
            .await
    } else {
        state.bridge.query_graph(&request.script, &request.params)
    };
    (StatusCode::OK, Json(QueryResponse::new(rows)))
}

// =============================================================================
// NOTES
// =============================================================================

pub async fn list_notes_handler(State(state): State<AppState>) -> Response {
    list_response("Cannot list notes", state.bridge.get_all_notes())
}

pub async fn get_note_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Response {
    match state.bridge.get_note(&id) {
        Ok(Some(note)) => (StatusCode::OK, Json(note)).into_response(),
        Ok(None) => (
            StatusCode::NOT_FOUND,
            Json(ErrorResponse::new(format!("note not found: {}", id))),
        )
            .into_response(),
        Err(e) => internal_error("Cannot read note", &e),
    }
}

pub async fn put_note_handler(
    State(state): State<AppState>,
    Json(note): Json<Note>,
) -> Response {
    let id = note.id.clone();
    write_response(id, state.bridge.sync_note(note))
}

pub async fn delete_note_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Response {
    let result = state.bridge.delete_note(&id);
    delete_response(id, result)
}

// =============================================================================
// FOLDERS
// =============================================================================

pub async fn list_folders_handler(State(state): State<AppState>) -> impl IntoResponse {
    Json(state.bridge.get_all_folders())
}

pub async fn put_folder_handler(
    State(state): State<AppState>,
    Json(folder): Json<Folder>,
) -> Response {
    let id = folder.id.clone();
    write_response(id, state.bridge.sync_folder(folder))
}

pub async fn delete_folder_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Response {
    let result = state.bridge.delete_folder(&id);
    delete_response(id, result)
}

// =============================================================================
// ENTITIES
// =============================================================================

pub async fn list_entities_handler(State(state): State<AppState>) -> Response {
    list_response("Cannot list entities", state.bridge.get_all_entities())
}

pub async fn put_entity_handler(
    State(state): State<AppState>,
    Json(entity): Json<Entity>,
) -> Response {
    let id = entity.id.clone();
    write_response(id, state.bridge.sync_entity(entity))
}

pub async fn delete_entity_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Response {
    let result = state.bridge.delete_entity(&id);
    delete_response(id, result)
}

// =============================================================================
// RELATIONSHIPS
// =============================================================================

pub async fn list_relationships_handler(State(state): State<AppState>) -> Response {
    list_response(
        "Cannot list relationships",
        state.bridge.get_all_relationships(),
    )
}

pub async fn put_relationship_handler(
    State(state): State<AppState>,
    Json(relationship): Json<Relationship>,
) -> Response {
    let id = relationship.id.clone();
    write_response(id, state.bridge.sync_relationship(relationship))
}

pub async fn delete_relationship_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Response {
    let result = state.bridge.delete_relationship(&id);
    delete_response(id, result)
}
