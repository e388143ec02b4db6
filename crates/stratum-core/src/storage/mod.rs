//! # Storage Module
//!
//! Concrete tiers behind the capability traits:
//! - `FsDurableStore`: durable whole-file storage on the local filesystem
//! - `MemoryDurableStore`: shared in-process durable store with a write log
//! - `RedbBootCache`: redb-backed record cache for fast cold starts

mod fs_durable;
mod memory_durable;
mod redb_cache;

pub use fs_durable::FsDurableStore;
pub use memory_durable::{MemoryDurableStore, WriteRecord};
pub use redb_cache::RedbBootCache;
