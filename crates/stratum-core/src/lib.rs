//! # stratum-core
//!
//! The storage capabilities behind the Stratum sync coordinator.
//!
//! This crate defines the four tiers a local-first application keeps its
//! data in, as traits, together with a small reference implementation of
//! each:
//!
//! - `RecordStore` (`MemoryStore`): in-memory source of truth
//! - `DurableStore` (`FsDurableStore`, `MemoryDurableStore`): slow durable blobs
//! - `BootCache` (`RedbBootCache`): fast best-effort cold-start cache
//! - `GraphEngine` (`GraphIndex`): derived, read-optimized graph projection
//!
//! ## Architectural Constraints
//!
//! - NO async, NO network dependencies (pure Rust)
//! - Deterministic ordering everywhere (`BTreeMap`, no `HashMap`)
//! - Opaque to the coordinator: it only ever sees the traits

// =============================================================================
// MODULES
// =============================================================================

pub mod capability;
pub mod formats;
pub mod graph;
pub mod primitives;
pub mod storage;
pub mod store;
pub mod types;

// =============================================================================
// RE-EXPORTS: Core Types
// =============================================================================

pub use types::{
    Entity, Folder, Note, Record, RecordCounts, RecordKind, Relationship, Snapshot, StratumError,
    now_millis,
};

// =============================================================================
// RE-EXPORTS: Capabilities
// =============================================================================

pub use capability::{
    BootCache, DurableStore, GraphEngine, MutationResult, Params, QueryResult, RecordStore, Row,
};
pub use graph::{GraphIndex, Mutation, Query};
pub use storage::{FsDurableStore, MemoryDurableStore, RedbBootCache, WriteRecord};
pub use store::MemoryStore;

// =============================================================================
// RE-EXPORTS: Formats
// =============================================================================

pub use formats::{BlobHeader, SyncMetadata, snapshot_from_bytes, snapshot_to_bytes};
