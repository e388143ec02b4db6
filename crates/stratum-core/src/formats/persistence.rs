//! # Database Blob Format
//!
//! Binary serialization of a whole-database `Snapshot`.
//!
//! Format: Header (5 bytes) + postcard-serialized snapshot.
//! - 4 bytes: Magic ("STRT")
//! - 1 byte: Version
//!
//! The blob is opaque to the coordinator: it is produced by
//! `RecordStore::export_database` and handed back to `import_database`.
//!
//! ## Validation
//!
//! Size and header are validated BEFORE the payload is decoded, so a
//! truncated or hostile blob fails fast without large allocations.

use crate::{Snapshot, StratumError, primitives};

// =============================================================================
// BLOB HEADER
// =============================================================================

/// The header precedes every database blob.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlobHeader {
    pub magic: [u8; 4],
    pub version: u8,
}

impl BlobHeader {
    /// Create a new header with the current format version.
    #[must_use]
    pub fn new() -> Self {
        Self {
            magic: *primitives::MAGIC_BYTES,
            version: primitives::FORMAT_VERSION,
        }
    }

    /// Validate the header.
    pub fn validate(&self) -> Result<(), StratumError> {
        if &self.magic != primitives::MAGIC_BYTES {
            return Err(StratumError::DeserializationError(
                "Invalid magic bytes".to_string(),
            ));
        }
        if self.version != primitives::FORMAT_VERSION {
            return Err(StratumError::DeserializationError(format!(
                "Unsupported version: {} (expected {})",
                self.version,
                primitives::FORMAT_VERSION
            )));
        }
        Ok(())
    }

    /// Write header to bytes.
    pub fn to_bytes(&self) -> [u8; primitives::HEADER_LEN] {
        let mut bytes = [0u8; primitives::HEADER_LEN];
        bytes[0..4].copy_from_slice(&self.magic);
        bytes[4] = self.version;
        bytes
    }

    /// Read header from bytes.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, StratumError> {
        if bytes.len() < primitives::HEADER_LEN {
            return Err(StratumError::DeserializationError(
                "Header too short".to_string(),
            ));
        }
        let mut magic = [0u8; 4];
        magic.copy_from_slice(&bytes[0..4]);
        Ok(Self {
            magic,
            version: bytes[4],
        })
    }
}

impl Default for BlobHeader {
    fn default() -> Self {
        Self::new()
    }
}

// =============================================================================
// SERIALIZATION FUNCTIONS
// =============================================================================

/// Serialize a snapshot to a blob (header + payload).
///
/// This is a pure transformation - no I/O.
pub fn snapshot_to_bytes(snapshot: &Snapshot) -> Result<Vec<u8>, StratumError> {
    let header = BlobHeader::new();
    let payload = postcard::to_stdvec(snapshot)
        .map_err(|e| StratumError::SerializationError(e.to_string()))?;

    let mut result = Vec::with_capacity(primitives::HEADER_LEN + payload.len());
    result.extend_from_slice(&header.to_bytes());
    result.extend_from_slice(&payload);

    Ok(result)
}

/// Deserialize a snapshot from a blob.
///
/// Validates, in order:
/// 1. Minimum size (header must be present)
/// 2. Maximum size
/// 3. Header magic bytes and version
pub fn snapshot_from_bytes(bytes: &[u8]) -> Result<Snapshot, StratumError> {
    if bytes.len() < primitives::HEADER_LEN {
        return Err(StratumError::DeserializationError(format!(
            "Data too short: minimum {} bytes required",
            primitives::HEADER_LEN
        )));
    }

    if bytes.len() > primitives::MAX_BLOB_SIZE {
        return Err(StratumError::DeserializationError(format!(
            "Data size {} bytes exceeds maximum allowed {} bytes",
            bytes.len(),
            primitives::MAX_BLOB_SIZE
        )));
    }

    let header = BlobHeader::from_bytes(bytes)?;
    header.validate()?;

    let payload = &bytes[primitives::HEADER_LEN..];
    postcard::from_bytes(payload).map_err(|e| {
        StratumError::DeserializationError(format!("Failed to decode database blob: {}", e))
    })
}

// =============================================================================
// TESTS
// =============================================================================
