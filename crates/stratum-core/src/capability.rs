//! # Capability Traits
//!
//! The four storage tiers the coordinator orchestrates, each behind a trait
//! so the coordinator never depends on a concrete engine:
//!
//! | Trait          | Role                                   | Reference impl      |
//! |----------------|----------------------------------------|---------------------|
//! | `RecordStore`  | in-memory source of truth              | `MemoryStore`       |
//! | `DurableStore` | slow, durable whole-database blobs     | `FsDurableStore`    |
//! | `GraphEngine`  | derived, read-optimized graph index    | `GraphIndex`        |
//! | `BootCache`    | fast best-effort cold-start cache      | `RedbBootCache`     |
//!
//! All methods are synchronous. Implementations serialize their own internal
//! writes, so every trait is `Send + Sync` and shared through `Arc`.

use crate::{Record, RecordCounts, RecordKind, Snapshot, StratumError};
use serde::{Deserialize, Serialize};

/// Named parameters for a graph engine script.
pub type Params = serde_json::Map<String, serde_json::Value>;

/// One result row from a graph engine query.
pub type Row = serde_json::Map<String, serde_json::Value>;

// =============================================================================
// SOURCE OF TRUTH
// =============================================================================

/// The authoritative store for every record during a process lifetime.
pub trait RecordStore: Send + Sync {
    /// Make sure the store can serve reads and writes.
    fn ensure_ready(&self) -> Result<(), StratumError>;

    /// Insert or replace a record.
    fn upsert(&self, record: Record) -> Result<(), StratumError>;

    /// Fetch a record by kind and id.
    fn get(&self, kind: RecordKind, id: &str) -> Result<Option<Record>, StratumError>;

    /// Delete a record. Returns whether it existed.
    fn delete(&self, kind: RecordKind, id: &str) -> Result<bool, StratumError>;

    /// All records of one kind, in id order.
    fn list(&self, kind: RecordKind) -> Result<Vec<Record>, StratumError>;

    /// Export the full contents as an opaque blob.
    fn export_database(&self) -> Result<Vec<u8>, StratumError>;

    /// Replace the full contents with a previously exported blob.
    fn import_database(&self, bytes: &[u8]) -> Result<(), StratumError>;

    /// Number of notes.
    fn count_notes(&self) -> Result<usize, StratumError>;

    /// Per-kind record counts.
    fn counts(&self) -> Result<RecordCounts, StratumError>;
}

// =============================================================================
// DURABLE STORE
// =============================================================================

/// Persistent file-like storage that survives restarts.
///
/// Paths are relative, `/`-separated names scoped to the store.
pub trait DurableStore: Send + Sync {
    /// Whether a file exists at `path`.
    fn exists(&self, path: &str) -> Result<bool, StratumError>;

    /// Read the full contents at `path`, or `None` if absent.
    fn read(&self, path: &str) -> Result<Option<Vec<u8>>, StratumError>;

    /// Replace the contents at `path`.
    fn write(&self, path: &str, bytes: &[u8]) -> Result<(), StratumError>;
}

// =============================================================================
// GRAPH ENGINE
// =============================================================================

/// Result of a graph engine query.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QueryResult {
    pub ok: bool,
    #[serde(default)]
    pub rows: Vec<Row>,
    #[serde(default)]
    pub message: Option<String>,
}

impl QueryResult {
    /// A successful result carrying rows.
    #[must_use]
    pub fn rows(rows: Vec<Row>) -> Self {
        Self {
            ok: true,
            rows,
            message: None,
        }
    }

    /// A failed result carrying a message.
    #[must_use]
    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            ok: false,
            rows: Vec::new(),
            message: Some(message.into()),
        }
    }
}

/// Result of a graph engine mutation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MutationResult {
    pub ok: bool,
    #[serde(default)]
    pub message: Option<String>,
}

impl MutationResult {
    /// A successful mutation.
    #[must_use]
    pub fn ok() -> Self {
        Self {
            ok: true,
            message: None,
        }
    }

    /// A failed mutation carrying a message.
    #[must_use]
    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            ok: false,
            message: Some(message.into()),
        }
    }
}

/// A derived, read-optimized store answering traversal queries.
///
/// Engines report failure through `ok = false` rather than `Err`: graph data
/// is derived and advisory, so callers degrade instead of propagating.
pub trait GraphEngine: Send + Sync {
    /// Whether the engine has finished loading and accepts scripts.
    fn is_ready(&self) -> bool;

    /// Run a read-only script.
    fn run_query(&self, script: &str, params: &Params) -> QueryResult;

    /// Run a write script.
    fn run_mutation(&self, script: &str, params: &Params) -> MutationResult;
}

// =============================================================================
// BOOT CACHE
// =============================================================================

/// A fast, best-effort persistent cache used only to shorten cold starts.
///
/// Never authoritative once boot completes.
pub trait BootCache: Send + Sync {
    /// Cache a record.
    fn put(&self, record: &Record) -> Result<(), StratumError>;

    /// Drop a cached record.
    fn delete(&self, kind: RecordKind, id: &str) -> Result<(), StratumError>;

    /// Everything previously cached, or `None` if the cache is empty.
    fn preload(&self) -> Result<Option<Snapshot>, StratumError>;
}
