//! Integration tests for the Stratum HTTP API.
//!
//! Uses axum-test to drive the router without binding a socket.

#![allow(clippy::unwrap_used, clippy::panic)]

use axum_test::TestServer;
use serde_json::{Value, json};
use std::sync::Arc;
use stratum::api::{
    AppState, DeleteResponse, HealthResponse, QueryResponse, StatusResponse, WriteResponse,
    create_router,
};
use stratum::{App, BootPhase, BootReport, Capabilities, ContextHub, StratumConfig};
use stratum_core::{
    DurableStore, Entity, Folder, GraphIndex, MemoryDurableStore, MemoryStore, Note,
    Relationship,
};

// =============================================================================
// HELPER FUNCTIONS
// =============================================================================

fn memory_app(disk: &MemoryDurableStore) -> App {
    let capabilities = Capabilities {
        store: Arc::new(MemoryStore::new()),
        durable: Arc::new(disk.clone()),
        engine: Arc::new(GraphIndex::new()),
        boot_cache: None,
    };
    let config = StratumConfig {
        writer_id: "api-test".to_string(),
        ..StratumConfig::default()
    };
    App::with_capabilities(&config, capabilities, Arc::new(ContextHub::default()))
}

/// A started app on in-memory tiers and a test server over it.
async fn create_test_server() -> (TestServer, App, MemoryDurableStore) {
    let disk = MemoryDurableStore::new();
    let app = memory_app(&disk);
    app.start().await.unwrap();
    app.wait_background().await;

    let router = create_router(AppState::new(app.bridge().clone()));
    (TestServer::new(router).unwrap(), app, disk)
}

/// A test server whose bridge has not been started.
fn create_unbooted_server() -> TestServer {
    let app = memory_app(&MemoryDurableStore::new());
    TestServer::new(create_router(AppState::new(app.bridge().clone()))).unwrap()
}

// =============================================================================
// HEALTH / STATUS / BOOT
// =============================================================================

#[tokio::test]
async fn test_health_endpoint() {
    let (server, _app, _disk) = create_test_server().await;

    let response = server.get("/health").await;

    response.assert_status_ok();
    let health: HealthResponse = response.json();
    assert_eq!(health.status, "ok");
    assert_eq!(health.version, env!("CARGO_PKG_VERSION"));
}

#[tokio::test]
async fn test_status_after_boot() {
    let (server, _app, _disk) = create_test_server().await;

    let response = server.get("/status").await;

    response.assert_status_ok();
    let status: StatusResponse = response.json();
    assert!(status.ready);
    assert_eq!(status.phase, BootPhase::Background);
    assert_eq!(status.counts.total(), 0);
    assert_eq!(status.timings.len(), 6);
}

#[tokio::test]
async fn test_boot_report() {
    let (server, _app, _disk) = create_test_server().await;

    let response = server.get("/boot").await;

    response.assert_status_ok();
    let report: BootReport = response.json();
    assert_eq!(report.notes, 0);
}

#[tokio::test]
async fn test_boot_unavailable_before_init() {
    let server = create_unbooted_server();

    let response = server.get("/boot").await;

    response.assert_status(axum::http::StatusCode::SERVICE_UNAVAILABLE);
}

// =============================================================================
// NOTES
// =============================================================================

#[tokio::test]
async fn test_note_lifecycle() {
    let (server, _app, _disk) = create_test_server().await;

    let response = server
        .put("/notes")
        .json(&Note::new("n1", "Hello", "world"))
        .await;
    response.assert_status_ok();
    let write: WriteResponse = response.json();
    assert!(write.success);
    assert_eq!(write.id, "n1");

    let note: Note = server.get("/notes/n1").await.json();
    assert_eq!(note.title, "Hello");

    let notes: Vec<Note> = server.get("/notes").await.json();
    assert_eq!(notes.len(), 1);

    let deleted: DeleteResponse = server.delete("/notes/n1").await.json();
    assert!(deleted.deleted);

    server
        .get("/notes/n1")
        .await
        .assert_status(axum::http::StatusCode::NOT_FOUND);
    server
        .delete("/notes/n1")
        .await
        .assert_status(axum::http::StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_malformed_note_rejected() {
    let (server, _app, _disk) = create_test_server().await;

    let response = server.put("/notes").json(&json!({ "title": "no id" })).await;

    assert!(response.status_code().is_client_error());
}

// =============================================================================
// FOLDERS / ENTITIES / RELATIONSHIPS
// =============================================================================

#[tokio::test]
async fn test_folders_listed_from_graph() {
    let (server, _app, _disk) = create_test_server().await;

    server
        .put("/folders")
        .json(&Folder::new("f1", "Inbox", None))
        .await
        .assert_status_ok();

    let folders: Vec<Folder> = server.get("/folders").await.json();
    assert_eq!(folders.len(), 1);
    assert_eq!(folders[0].name, "Inbox");

    server.delete("/folders/f1").await.assert_status_ok();
    let folders: Vec<Folder> = server.get("/folders").await.json();
    assert!(folders.is_empty());
}

#[tokio::test]
async fn test_graph_query_with_hydration() {
    let (server, _app, _disk) = create_test_server().await;

    for entity in [
        Entity::new("a", "A", "concept"),
        Entity::new("b", "B", "concept"),
    ] {
        server.put("/entities").json(&entity).await.assert_status_ok();
    }
    server
        .put("/relationships")
        .json(&Relationship::new("r1", "a", "b", "links"))
        .await
        .assert_status_ok();

    let response = server
        .post("/query")
        .json(&json!({
            "script": "traverse",
            "params": { "id": "a", "depth": 2 },
            "hydrate": true
        }))
        .await;

    response.assert_status_ok();
    let result: QueryResponse = response.json();
    assert_eq!(result.count, 2);

    let entities: Vec<Entity> = server.get("/entities").await.json();
    assert_eq!(entities.len(), 2);
    let relationships: Vec<Relationship> = server.get("/relationships").await.json();
    assert_eq!(relationships.len(), 1);
}

#[tokio::test]
async fn test_unknown_script_returns_no_rows() {
    let (server, _app, _disk) = create_test_server().await;

    let response = server
        .post("/query")
        .json(&json!({ "script": "drop_everything" }))
        .await;

    response.assert_status_ok();
    let result: QueryResponse = response.json();
    assert_eq!(result.count, 0);
}

#[tokio::test]
async fn test_delete_entity() {
    let (server, _app, _disk) = create_test_server().await;

    server
        .put("/entities")
        .json(&Entity::new("a", "A", "concept"))
        .await
        .assert_status_ok();

    let deleted: DeleteResponse = server.delete("/entities/a").await.json();
    assert!(deleted.deleted);
    server
        .delete("/relationships/missing")
        .await
        .assert_status(axum::http::StatusCode::NOT_FOUND);
}

// =============================================================================
// FLUSH
// =============================================================================

#[tokio::test]
async fn test_flush_writes_blob() {
    let (server, _app, disk) = create_test_server().await;

    server
        .put("/notes")
        .json(&Note::new("n1", "t", ""))
        .await
        .assert_status_ok();

    let response = server.post("/flush").await;

    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["outcome"], "flushed");
    assert_eq!(body["pending"], false);
    assert!(disk.exists("stratum.db").unwrap());
    assert!(disk.exists("stratum.db.meta.json").unwrap());
}

#[tokio::test]
async fn test_hydrate_rebuilds_projection() {
    let (server, app, _disk) = create_test_server().await;

    server
        .put("/entities")
        .json(&Entity::new("ada", "Ada", "person"))
        .await
        .assert_status_ok();
    let before = app.bridge().hydrator().version();

    let response = server.post("/hydrate").await;

    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["outcome"], "completed");
    assert_eq!(body["upserted"], 1);
    assert_eq!(body["status"], "ready");
    assert_eq!(body["version"], before + 1);
}

#[tokio::test]
async fn test_flush_when_clean() {
    let (server, _app, _disk) = create_test_server().await;

    let body: Value = server.post("/flush").await.json();

    assert_eq!(body["outcome"], "clean");
}
