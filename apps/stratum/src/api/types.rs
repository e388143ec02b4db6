//! # API Request/Response Types
//!
//! JSON structures for the HTTP API. Records travel in their own serde shape.

use crate::boot::{BootPhase, PhaseTiming};
use crate::bridge::{BridgeStatus, SyncStatusReport};
use crate::hydrator::{HydrationOutcome, HydrationStatus};
use crate::sync::SyncOutcome;
use serde::{Deserialize, Serialize};
use stratum_core::{Params, RecordCounts, Row};

// =============================================================================
// HEALTH RESPONSE
// =============================================================================

/// Health check response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

impl Default for HealthResponse {
    fn default() -> Self {
        Self {
            status: "ok".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}

// =============================================================================
// STATUS RESPONSE
// =============================================================================

/// Coordinator status response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusResponse {
    pub bridge: BridgeStatus,
    pub phase: BootPhase,
    pub ready: bool,
    pub counts: RecordCounts,
    pub sync: SyncStatusReport,
    pub timings: Vec<PhaseTiming>,
}

// =============================================================================
// FLUSH RESPONSE
// =============================================================================

/// Result of a forced durable flush.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FlushResponse {
    #[serde(flatten)]
    pub outcome: SyncOutcome,
    pub pending: bool,
}

/// Result of a forced graph rebuild.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HydrateResponse {
    #[serde(flatten)]
    pub outcome: HydrationOutcome,
    pub status: HydrationStatus,
    pub version: u64,
}

// =============================================================================
// QUERY REQUEST/RESPONSE
// =============================================================================

/// Graph query request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryRequest {
    pub script: String,
    #[serde(default)]
    pub params: Params,
    /// Bring the projection up to date before querying.
    #[serde(default)]
    pub hydrate: bool,
}

/// Graph query response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryResponse {
    pub rows: Vec<Row>,
    pub count: usize,
}

impl QueryResponse {
    #[must_use]
    pub fn new(rows: Vec<Row>) -> Self {
        Self {
            count: rows.len(),
            rows,
        }
    }
}

// =============================================================================
// WRITE RESPONSES
// =============================================================================

/// Acknowledgement of a record write.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WriteResponse {
    pub success: bool,
    pub id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[serde(default)]
    pub error: Option<String>,
}

impl WriteResponse {
    #[must_use]
    pub fn success(id: impl Into<String>) -> Self {
        Self {
            success: true,
            id: id.into(),
            error: None,
        }
    }

    #[must_use]
    pub fn error(id: impl Into<String>, msg: impl Into<String>) -> Self {
        Self {
            success: false,
            id: id.into(),
            error: Some(msg.into()),
        }
    }
}

/// Result of a record deletion.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeleteResponse {
    pub deleted: bool,
    pub id: String,
}

/// Error body for failed reads.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

impl ErrorResponse {
    #[must_use]
    pub fn new(msg: impl Into<String>) -> Self {
        Self { error: msg.into() }
    }
}
