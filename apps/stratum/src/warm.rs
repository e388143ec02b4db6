//! # Boot-Cache Warmer
//!
//! Detached, best-effort writes to the boot cache. Each put or delete runs on
//! its own task with a bounded number of attempts; the outcome only moves
//! counters. Nothing here affects correctness.

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use stratum_core::{BootCache, Record, RecordKind, Snapshot, StratumError};
use tokio::task::JoinHandle;

/// Warm counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WarmStats {
    pub succeeded: u64,
    pub failed: u64,
    pub retried: u64,
}

#[derive(Debug, Default)]
struct Counters {
    succeeded: AtomicU64,
    failed: AtomicU64,
    retried: AtomicU64,
}

#[derive(Debug, Clone)]
enum WarmOp {
    Put(Record),
    Delete(RecordKind, String),
}

impl WarmOp {
    fn run(&self, cache: &dyn BootCache) -> Result<(), StratumError> {
        match self {
            WarmOp::Put(record) => cache.put(record),
            WarmOp::Delete(kind, id) => cache.delete(*kind, id),
        }
    }
}

/// Fire-and-forget writer for an optional boot cache.
#[derive(Clone)]
pub struct CacheWarmer {
    cache: Option<Arc<dyn BootCache>>,
    attempts: u32,
    backoff: Duration,
    counters: Arc<Counters>,
}

impl std::fmt::Debug for CacheWarmer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CacheWarmer")
            .field("enabled", &self.cache.is_some())
            .field("attempts", &self.attempts)
            .finish_non_exhaustive()
    }
}

impl CacheWarmer {
    /// Create a warmer. `attempts` is clamped to at least one.
    #[must_use]
    pub fn new(cache: Option<Arc<dyn BootCache>>, attempts: u32, backoff: Duration) -> Self {
        Self {
            cache,
            attempts: attempts.max(1),
            backoff,
            counters: Arc::new(Counters::default()),
        }
    }

    /// A warmer with no cache behind it.
    #[must_use]
    pub fn disabled() -> Self {
        Self::new(None, 1, Duration::ZERO)
    }

    /// Cache a record in the background.
    pub fn warm(&self, record: Record) -> Option<JoinHandle<()>> {
        self.spawn(WarmOp::Put(record))
    }

    /// Drop a cached record in the background.
    pub fn evict(&self, kind: RecordKind, id: &str) -> Option<JoinHandle<()>> {
        self.spawn(WarmOp::Delete(kind, id.to_string()))
    }

    /// Everything previously cached. Failures are logged and read as empty.
    pub fn preload(&self) -> Option<Snapshot> {
        let cache = self.cache.as_ref()?;
        match cache.preload() {
            Ok(snapshot) => snapshot,
            Err(e) => {
                tracing::debug!("Boot cache preload failed: {}", e);
                None
            }
        }
    }

    /// Current counters.
    #[must_use]
    pub fn stats(&self) -> WarmStats {
        WarmStats {
            succeeded: self.counters.succeeded.load(Ordering::Relaxed),
            failed: self.counters.failed.load(Ordering::Relaxed),
            retried: self.counters.retried.load(Ordering::Relaxed),
        }
    }

    fn spawn(&self, op: WarmOp) -> Option<JoinHandle<()>> {
        let cache = self.cache.clone()?;
        tokio::runtime::Handle::try_current().ok()?;

        let counters = self.counters.clone();
        let attempts = self.attempts;
        let backoff = self.backoff;

        Some(tokio::spawn(async move {
            for attempt in 1..=attempts {
                match op.run(cache.as_ref()) {
                    Ok(()) => {
                        counters.succeeded.fetch_add(1, Ordering::Relaxed);
                        return;
                    }
                    Err(e) if attempt < attempts => {
                        tracing::debug!(attempt, "Boot cache write failed, retrying: {}", e);
                        counters.retried.fetch_add(1, Ordering::Relaxed);
                        tokio::time::sleep(backoff.saturating_mul(attempt)).await;
                    }
                    Err(e) => {
                        tracing::debug!(attempt, "Boot cache write abandoned: {}", e);
                        counters.failed.fetch_add(1, Ordering::Relaxed);
                    }
                }
            }
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;
    use stratum_core::Note;

    /// Cache that fails a fixed number of times before succeeding.
    #[derive(Default)]
    struct Flaky {
        failures_left: Mutex<u32>,
        puts: Mutex<Vec<String>>,
    }

    impl BootCache for Flaky {
        fn put(&self, record: &Record) -> Result<(), StratumError> {
            let mut left = self.failures_left.lock().expect("lock");
            if *left > 0 {
                *left -= 1;
                return Err(StratumError::StorageError("flaky".to_string()));
            }
            self.puts.lock().expect("lock").push(record.id().to_string());
            Ok(())
        }

        fn delete(&self, _kind: RecordKind, _id: &str) -> Result<(), StratumError> {
            Ok(())
        }

        fn preload(&self) -> Result<Option<Snapshot>, StratumError> {
            Err(StratumError::StorageError("unavailable".to_string()))
        }
    }

    fn flaky(failures: u32) -> Arc<Flaky> {
        Arc::new(Flaky {
            failures_left: Mutex::new(failures),
            ..Flaky::default()
        })
    }

    #[tokio::test(start_paused = true)]
    async fn retries_then_succeeds() {
        let cache = flaky(2);
        let warmer = CacheWarmer::new(Some(cache.clone()), 3, Duration::from_millis(10));

        warmer
            .warm(Note::new("n1", "t", "").into())
            .expect("spawned")
            .await
            .expect("join");

        assert_eq!(
            warmer.stats(),
            WarmStats {
                succeeded: 1,
                failed: 0,
                retried: 2
            }
        );
        assert_eq!(*cache.puts.lock().expect("lock"), vec!["n1".to_string()]);
    }

    #[tokio::test(start_paused = true)]
    async fn gives_up_after_attempts() {
        let warmer = CacheWarmer::new(Some(flaky(10)), 2, Duration::from_millis(10));

        warmer
            .warm(Note::new("n1", "t", "").into())
            .expect("spawned")
            .await
            .expect("join");

        let stats = warmer.stats();
        assert_eq!(stats.failed, 1);
        assert_eq!(stats.retried, 1);
        assert_eq!(stats.succeeded, 0);
    }

    #[tokio::test]
    async fn disabled_warmer_does_nothing() {
        let warmer = CacheWarmer::disabled();
        assert!(warmer.warm(Note::new("n1", "t", "").into()).is_none());
        assert!(warmer.evict(RecordKind::Note, "n1").is_none());
        assert!(warmer.preload().is_none());
        assert_eq!(warmer.stats(), WarmStats::default());
    }

    #[test]
    fn preload_failure_reads_as_empty() {
        let warmer = CacheWarmer::new(Some(flaky(0)), 1, Duration::ZERO);
        assert!(warmer.preload().is_none());
    }
}
