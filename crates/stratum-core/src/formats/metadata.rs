//! # Sync Metadata Sidecar
//!
//! A small JSON record written next to the database blob after every
//! successful flush: `{"size": int, "timestamp": int, "writerId": string}`.
//!
//! It lets a reader check that the blob it sees was written completely by a
//! known writer without decoding the blob itself.

use crate::StratumError;
use serde::{Deserialize, Serialize};

/// Metadata describing the last flushed database blob.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncMetadata {
    /// Blob size in bytes.
    pub size: u64,
    /// Flush time in milliseconds since the Unix epoch.
    pub timestamp: u64,
    /// Identity of the execution context that wrote the blob.
    pub writer_id: String,
}

impl SyncMetadata {
    /// Describe a blob written now by `writer_id`.
    #[must_use]
    pub fn describe(blob: &[u8], writer_id: &str, timestamp: u64) -> Self {
        Self {
            size: blob.len() as u64,
            timestamp,
            writer_id: writer_id.to_string(),
        }
    }

    /// Encode as JSON bytes.
    pub fn to_bytes(&self) -> Result<Vec<u8>, StratumError> {
        serde_json::to_vec(self).map_err(|e| StratumError::SerializationError(e.to_string()))
    }

    /// Decode from JSON bytes.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, StratumError> {
        serde_json::from_slice(bytes).map_err(|e| StratumError::DeserializationError(e.to_string()))
    }

    /// Whether this metadata matches the given blob's size.
    #[must_use]
    pub fn matches(&self, blob: &[u8]) -> bool {
        self.size == blob.len() as u64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn json_shape_uses_camel_case_writer_id() {
        let meta = SyncMetadata::describe(b"abcd", "ctx-1", 42);
        let json: serde_json::Value =
            serde_json::from_slice(&meta.to_bytes().expect("encode")).expect("json");

        assert_eq!(json["size"], 4);
        assert_eq!(json["timestamp"], 42);
        assert_eq!(json["writerId"], "ctx-1");
    }

    #[test]
    fn matches_checks_size() {
        let meta = SyncMetadata::describe(b"abcd", "ctx-1", 1);
        assert!(meta.matches(b"wxyz"));
        assert!(!meta.matches(b"abc"));
    }

    #[test]
    fn garbage_rejected() {
        assert!(SyncMetadata::from_bytes(b"not json").is_err());
    }
}
