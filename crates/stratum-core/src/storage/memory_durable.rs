//! # In-Memory Durable Store
//!
//! A `DurableStore` kept in process memory. Clones share the same files, so
//! several coordinator contexts can be pointed at one "disk". Every write is
//! appended to a log, which makes write ordering observable in tests.

use crate::StratumError;
use crate::capability::DurableStore;
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard};

/// One entry of the write log.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WriteRecord {
    pub path: String,
    pub size: usize,
}

#[derive(Debug, Default)]
struct Files {
    files: BTreeMap<String, Vec<u8>>,
    log: Vec<WriteRecord>,
    fail_writes: bool,
}

/// Shared in-memory durable store.
#[derive(Debug, Clone, Default)]
pub struct MemoryDurableStore {
    inner: Arc<Mutex<Files>>,
}

impl MemoryDurableStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Every successful write so far, oldest first.
    pub fn write_log(&self) -> Result<Vec<WriteRecord>, StratumError> {
        Ok(self.lock()?.log.clone())
    }

    /// Number of successful writes to `path`.
    pub fn writes_to(&self, path: &str) -> Result<usize, StratumError> {
        Ok(self.lock()?.log.iter().filter(|w| w.path == path).count())
    }

    /// Make every subsequent write fail until switched back.
    pub fn set_fail_writes(&self, fail: bool) -> Result<(), StratumError> {
        self.lock()?.fail_writes = fail;
        Ok(())
    }

    fn lock(&self) -> Result<MutexGuard<'_, Files>, StratumError> {
        self.inner
            .lock()
            .map_err(|_| StratumError::LockPoisoned("memory durable store"))
    }
}

impl DurableStore for MemoryDurableStore {
    fn exists(&self, path: &str) -> Result<bool, StratumError> {
        Ok(self.lock()?.files.contains_key(path))
    }

    fn read(&self, path: &str) -> Result<Option<Vec<u8>>, StratumError> {
        Ok(self.lock()?.files.get(path).cloned())
    }

    fn write(&self, path: &str, bytes: &[u8]) -> Result<(), StratumError> {
        let mut files = self.lock()?;
        if files.fail_writes {
            return Err(StratumError::IoError(format!(
                "write to '{}' rejected",
                path
            )));
        }
        files.files.insert(path.to_string(), bytes.to_vec());
        files.log.push(WriteRecord {
            path: path.to_string(),
            size: bytes.len(),
        });
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clones_share_files() {
        let a = MemoryDurableStore::new();
        let b = a.clone();

        a.write("stratum.db", b"abc").expect("write");
        assert!(b.exists("stratum.db").expect("exists"));
        assert_eq!(b.read("stratum.db").expect("read"), Some(b"abc".to_vec()));
    }

    #[test]
    fn log_records_writes_in_order() {
        let store = MemoryDurableStore::new();
        store.write("stratum.db", b"abc").expect("write");
        store.write("stratum.db.meta.json", b"{}").expect("write");
        store.write("stratum.db", b"abcd").expect("write");

        let log = store.write_log().expect("log");
        assert_eq!(log.len(), 3);
        assert_eq!(log[1].path, "stratum.db.meta.json");
        assert_eq!(log[2].size, 4);
        assert_eq!(store.writes_to("stratum.db").expect("count"), 2);
    }

    #[test]
    fn failing_writes_leave_no_trace() {
        let store = MemoryDurableStore::new();
        store.set_fail_writes(true).expect("toggle");

        assert!(store.write("stratum.db", b"abc").is_err());
        assert!(!store.exists("stratum.db").expect("exists"));
        assert!(store.write_log().expect("log").is_empty());

        store.set_fail_writes(false).expect("toggle");
        store.write("stratum.db", b"abc").expect("write");
    }
}
