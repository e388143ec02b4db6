//! # Primitives
//!
//! Fixed constants shared by the capability layer and the coordinator.
//!
//! Runtime-tunable values (debounce, max-wait, wait bounds) live in the app
//! configuration; the values here are their defaults and the hard limits that
//! configuration cannot exceed.

/// Magic bytes for the database blob header.
///
/// - Blob = Magic Bytes ("STRT") + Version (u8) + postcard payload.
pub const MAGIC_BYTES: &[u8; 4] = b"STRT";

/// Current database blob format version.
///
/// Increment this when making breaking changes to the blob format.
pub const FORMAT_VERSION: u8 = 1;

/// Length of the blob header (magic + version).
pub const HEADER_LEN: usize = 5;

/// Default durable path of the database blob.
pub const DEFAULT_BLOB_PATH: &str = "stratum.db";

/// Suffix appended to the blob path to form the sync metadata sidecar path.
pub const METADATA_SUFFIX: &str = ".meta.json";

/// Default debounce interval for durable flushes (milliseconds).
pub const DEFAULT_DEBOUNCE_MS: u64 = 2_000;

/// Default max-wait bound for durable flushes (milliseconds).
pub const DEFAULT_MAX_WAIT_MS: u64 = 10_000;

/// Default upper bound for a boot-phase wait (seconds).
pub const DEFAULT_PHASE_WAIT_SECS: u64 = 30;

/// Default upper bound for waiting on an in-flight hydration (milliseconds).
pub const DEFAULT_HYDRATION_WAIT_MS: u64 = 10_000;

/// Default bound for the best-effort flush at shutdown (milliseconds).
pub const DEFAULT_SHUTDOWN_FLUSH_MS: u64 = 5_000;

/// Default number of attempts for a boot-cache warm write.
pub const DEFAULT_WARM_ATTEMPTS: u32 = 3;

/// Maximum traversal depth for graph queries.
///
/// - All queries must be computationally bounded.
/// - This prevents runaway traversals in large graphs.
pub const MAX_TRAVERSAL_DEPTH: usize = 100;

// =============================================================================
// INPUT VALIDATION LIMITS
// =============================================================================

/// Maximum allowed database blob size (bytes).
///
/// Validated before decoding so a corrupted or hostile blob cannot force a
/// huge allocation.
pub const MAX_BLOB_SIZE: usize = 512 * 1024 * 1024;

/// Maximum length of a durable path.
pub const MAX_PATH_LENGTH: usize = 255;

/// Build the sidecar metadata path for a blob path.
#[must_use]
pub fn metadata_path(blob_path: &str) -> String {
    format!("{}{}", blob_path, METADATA_SUFFIX)
}
