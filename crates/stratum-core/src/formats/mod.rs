//! # Formats Module
//!
//! On-disk formats owned by the capability layer:
//! - `persistence`: the opaque database blob (header + postcard snapshot)
//! - `metadata`: the JSON sync sidecar written next to the blob

mod metadata;
mod persistence;

pub use metadata::SyncMetadata;
pub use persistence::{BlobHeader, snapshot_from_bytes, snapshot_to_bytes};
