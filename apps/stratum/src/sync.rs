//! # Durable Sync Coordinator
//!
//! Keeps the slow durable tier eventually consistent with the in-memory
//! source of truth.
//!
//! ## Scheduling
//!
//! `mark_dirty` (re)starts a debounce timer on every call and starts a
//! max-wait timer once per dirty episode. Whichever fires first cancels the
//! other and flushes, so a continuous stream of writes is still flushed at
//! least every `max_wait`.
//!
//! ## Flushing
//!
//! A flush holds the hub's named lock for the blob path, exports the source
//! of truth, writes the blob, then writes the sidecar metadata. The dirty
//! flag is cleared only if the flush is still the latest one and no write
//! arrived after the export.
//!
//! Every flush runs on its own task. A caller that stops waiting (a dropped
//! request, an expired shutdown timeout) never cuts a flush off between the
//! blob and its sidecar.

use crate::hub::{ContextHub, SyncEvent};
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex, MutexGuard, Weak};
use std::time::Duration;
use stratum_core::{
    DurableStore, RecordStore, StratumError, SyncMetadata, now_millis, primitives,
};
use tokio::sync::broadcast::error::RecvError;
use tokio::task::JoinHandle;

// =============================================================================
// PUBLIC TYPES
// =============================================================================

/// Durable sync status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncStatus {
    Idle,
    Syncing,
    Error,
    Booting,
}

/// Which tier the boot data came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BootSource {
    /// The source of truth was already populated.
    Cache,
    /// The durable blob was imported.
    Durable,
    /// Nothing to load.
    Fresh,
}

/// Result of one flush attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum SyncOutcome {
    /// Nothing was dirty.
    Clean,
    /// Blob and metadata were written.
    Flushed { bytes: u64 },
    /// A newer flush started before this one finished.
    Superseded,
    /// A write failed; a retry has been scheduled.
    Failed,
}

/// Point-in-time view of the coordinator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncSnapshot {
    pub status: SyncStatus,
    pub last_sync_ms: Option<u64>,
    pub dirty: bool,
    pub sync_version: u64,
    pub remote_syncs: u64,
}

/// Timing and naming for a coordinator.
#[derive(Debug, Clone)]
pub struct SyncSettings {
    pub blob_path: String,
    pub writer_id: String,
    pub debounce: Duration,
    pub max_wait: Duration,
    pub shutdown_flush: Duration,
}

impl Default for SyncSettings {
    fn default() -> Self {
        Self {
            blob_path: primitives::DEFAULT_BLOB_PATH.to_string(),
            writer_id: "stratum".to_string(),
            debounce: Duration::from_millis(primitives::DEFAULT_DEBOUNCE_MS),
            max_wait: Duration::from_millis(primitives::DEFAULT_MAX_WAIT_MS),
            shutdown_flush: Duration::from_millis(primitives::DEFAULT_SHUTDOWN_FLUSH_MS),
        }
    }
}

// =============================================================================
// INTERNAL STATE
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TimerKind {
    Debounce,
    MaxWait,
}

#[derive(Debug)]
struct Timer {
    id: u64,
    handle: JoinHandle<()>,
}

#[derive(Debug)]
struct SyncState {
    status: SyncStatus,
    dirty: bool,
    /// Bumped on every `mark_dirty`.
    dirty_generation: u64,
    /// Bumped when a flush cycle starts.
    sync_version: u64,
    last_sync_ms: Option<u64>,
    remote_syncs: u64,
    debounce: Option<Timer>,
    max_wait: Option<Timer>,
    next_timer_id: u64,
    listener: Option<JoinHandle<()>>,
    verification: Option<JoinHandle<()>>,
}

impl SyncState {
    fn new() -> Self {
        Self {
            status: SyncStatus::Idle,
            dirty: false,
            dirty_generation: 0,
            sync_version: 0,
            last_sync_ms: None,
            remote_syncs: 0,
            debounce: None,
            max_wait: None,
            next_timer_id: 0,
            listener: None,
            verification: None,
        }
    }

    fn slot(&mut self, kind: TimerKind) -> &mut Option<Timer> {
        match kind {
            TimerKind::Debounce => &mut self.debounce,
            TimerKind::MaxWait => &mut self.max_wait,
        }
    }

    fn cancel_timers(&mut self) {
        for timer in [self.debounce.take(), self.max_wait.take()]
            .into_iter()
            .flatten()
        {
            timer.handle.abort();
        }
    }
}

struct Inner {
    store: Arc<dyn RecordStore>,
    durable: Arc<dyn DurableStore>,
    hub: Arc<ContextHub>,
    settings: SyncSettings,
    meta_path: String,
    state: Mutex<SyncState>,
}

// =============================================================================
// COORDINATOR
// =============================================================================

/// Debounced, lock-protected durable sync for one execution context.
///
/// Cheap to clone; clones share state.
#[derive(Clone)]
pub struct DurableSyncCoordinator {
    inner: Arc<Inner>,
}

impl std::fmt::Debug for DurableSyncCoordinator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DurableSyncCoordinator")
            .field("writer_id", &self.inner.settings.writer_id)
            .field("blob_path", &self.inner.settings.blob_path)
            .finish_non_exhaustive()
    }
}

impl DurableSyncCoordinator {
    /// Create a coordinator for one context.
    #[must_use]
    pub fn new(
        store: Arc<dyn RecordStore>,
        durable: Arc<dyn DurableStore>,
        hub: Arc<ContextHub>,
        settings: SyncSettings,
    ) -> Self {
        let meta_path = primitives::metadata_path(&settings.blob_path);
        Self {
            inner: Arc::new(Inner {
                store,
                durable,
                hub,
                settings,
                meta_path,
                state: Mutex::new(SyncState::new()),
            }),
        }
    }

    /// Identity of this context in broadcasts and metadata.
    #[must_use]
    pub fn writer_id(&self) -> &str {
        &self.inner.settings.writer_id
    }

    // -------------------------------------------------------------------------
    // Boot
    // -------------------------------------------------------------------------

    /// Select the boot tier and load from it.
    ///
    /// A populated source of truth wins; a background check then makes sure
    /// the durable blob exists. Otherwise a non-empty durable blob is
    /// imported. A blob that exists but cannot be imported fails the boot.
    pub async fn boot(&self) -> Result<BootSource, StratumError> {
        self.state()?.status = SyncStatus::Booting;

        let selected = self.select_source();
        self.state()?.status = match selected {
            Ok(_) => SyncStatus::Idle,
            Err(_) => SyncStatus::Error,
        };

        let source = selected?;
        tracing::info!(source = ?source, writer_id = %self.writer_id(), "Boot source selected");

        if source == BootSource::Cache {
            let this = self.clone();
            let handle = tokio::spawn(async move { this.verify_durable().await });
            self.state()?.verification = Some(handle);
        }
        Ok(source)
    }

    fn select_source(&self) -> Result<BootSource, StratumError> {
        let inner = &self.inner;
        if inner.store.counts()?.total() > 0 {
            return Ok(BootSource::Cache);
        }

        match inner.durable.read(&inner.settings.blob_path)? {
            Some(bytes) if !bytes.is_empty() => {
                inner.store.import_database(&bytes).map_err(|e| {
                    StratumError::Initialization(format!(
                        "durable blob '{}' could not be imported: {}",
                        inner.settings.blob_path, e
                    ))
                })?;
                Ok(BootSource::Durable)
            }
            _ => Ok(BootSource::Fresh),
        }
    }

    /// Flush immediately if the durable blob is missing.
    async fn verify_durable(&self) {
        match self.inner.durable.exists(&self.inner.settings.blob_path) {
            Ok(true) => {}
            Ok(false) => {
                tracing::info!("Durable blob missing after warm boot, flushing");
                self.mark_dirty();
                self.sync_now().await;
            }
            Err(e) => tracing::warn!("Durable verification failed: {}", e),
        }
    }

    /// Wait for the post-boot durable verification, if one was started.
    pub async fn verified(&self) {
        let handle = self.state().ok().and_then(|mut st| st.verification.take());
        if let Some(handle) = handle {
            let _ = handle.await;
        }
    }

    // -------------------------------------------------------------------------
    // Scheduling
    // -------------------------------------------------------------------------

    /// Record that the source of truth changed and schedule a flush.
    pub fn mark_dirty(&self) {
        let Ok(mut st) = self.state() else {
            return;
        };
        st.dirty = true;
        st.dirty_generation = st.dirty_generation.wrapping_add(1);
        self.arm_timers(&mut st);
    }

    /// Restart the debounce timer and start max-wait if none is pending.
    fn arm_timers(&self, st: &mut SyncState) {
        if tokio::runtime::Handle::try_current().is_err() {
            tracing::debug!("No runtime; flush deferred until sync_now");
            return;
        }

        if let Some(old) = st.debounce.take() {
            old.handle.abort();
        }
        let debounce = self.spawn_timer(st, TimerKind::Debounce, self.inner.settings.debounce);
        st.debounce = Some(debounce);

        if st.max_wait.is_none() {
            let max_wait = self.spawn_timer(st, TimerKind::MaxWait, self.inner.settings.max_wait);
            st.max_wait = Some(max_wait);
        }
    }

    fn spawn_timer(&self, st: &mut SyncState, kind: TimerKind, delay: Duration) -> Timer {
        st.next_timer_id = st.next_timer_id.wrapping_add(1);
        let id = st.next_timer_id;
        let this = self.clone();
        let handle = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            this.on_timer(kind, id).await;
        });
        Timer { id, handle }
    }

    async fn on_timer(&self, kind: TimerKind, id: u64) {
        {
            let Ok(mut st) = self.state() else {
                return;
            };
            let slot = st.slot(kind);
            // A replaced or cancelled timer no longer owns its slot.
            if slot.as_ref().is_none_or(|t| t.id != id) {
                return;
            }
            *slot = None;
            let other = match kind {
                TimerKind::Debounce => st.max_wait.take(),
                TimerKind::MaxWait => st.debounce.take(),
            };
            if let Some(other) = other {
                other.handle.abort();
            }
        }
        tracing::debug!(timer = ?kind, "Flush timer fired");
        self.flush_detached().await;
    }

    /// Cancel pending timers and flush now.
    pub async fn sync_now(&self) -> SyncOutcome {
        if let Ok(mut st) = self.state() {
            st.cancel_timers();
        }
        self.flush_detached().await
    }

    /// Run one flush on a spawned task and wait for it.
    async fn flush_detached(&self) -> SyncOutcome {
        let this = self.clone();
        match tokio::spawn(async move { this.perform_sync().await }).await {
            Ok(outcome) => outcome,
            Err(e) => {
                tracing::warn!("Flush task did not finish: {}", e);
                SyncOutcome::Failed
            }
        }
    }

    // -------------------------------------------------------------------------
    // Flush
    // -------------------------------------------------------------------------

    async fn perform_sync(&self) -> SyncOutcome {
        if !self.is_dirty() {
            return SyncOutcome::Clean;
        }

        let inner = &self.inner;
        let _guard = match inner.hub.locks().acquire(&inner.settings.blob_path).await {
            Ok(guard) => guard,
            Err(e) => return self.fail(&e),
        };

        let (version, generation) = {
            let Ok(mut st) = self.state() else {
                return SyncOutcome::Failed;
            };
            // A flush that held the lock before us may have covered everything.
            if !st.dirty {
                return SyncOutcome::Clean;
            }
            st.sync_version = st.sync_version.wrapping_add(1);
            st.status = SyncStatus::Syncing;
            (st.sync_version, st.dirty_generation)
        };

        inner.hub.publish(SyncEvent::SyncStart {
            writer_id: inner.settings.writer_id.clone(),
        });

        let size = match self.write_through().await {
            Ok(size) => size,
            Err(e) => return self.fail(&e),
        };

        inner.hub.publish(SyncEvent::SyncComplete {
            writer_id: inner.settings.writer_id.clone(),
            size,
        });

        let Ok(mut st) = self.state() else {
            return SyncOutcome::Failed;
        };
        if st.sync_version != version {
            tracing::debug!(version, current = st.sync_version, "Flush superseded");
            return SyncOutcome::Superseded;
        }
        st.status = SyncStatus::Idle;
        st.last_sync_ms = Some(now_millis());
        if st.dirty_generation == generation {
            st.dirty = false;
        } else {
            tracing::debug!("Writes arrived during flush; staying dirty");
        }
        tracing::info!(bytes = size, version, "Durable flush complete");
        SyncOutcome::Flushed { bytes: size }
    }

    /// Export, write the blob, then write the sidecar metadata.
    async fn write_through(&self) -> Result<u64, StratumError> {
        let inner = &self.inner;
        let blob = inner.store.export_database()?;
        inner.durable.write(&inner.settings.blob_path, &blob)?;

        tokio::task::yield_now().await;

        let meta = SyncMetadata::describe(&blob, &inner.settings.writer_id, now_millis());
        inner.durable.write(&inner.meta_path, &meta.to_bytes()?)?;
        Ok(meta.size)
    }

    fn fail(&self, error: &StratumError) -> SyncOutcome {
        tracing::warn!("Durable flush failed, will retry: {}", error);
        if let Ok(mut st) = self.state() {
            st.status = SyncStatus::Error;
            self.arm_timers(&mut st);
        }
        SyncOutcome::Failed
    }

    // -------------------------------------------------------------------------
    // Cross-context notifications
    // -------------------------------------------------------------------------

    /// Start listening for other contexts' flushes.
    ///
    /// Events are advisory: they are logged and counted, nothing reloads.
    pub fn spawn_listener(&self) {
        let mut rx = self.inner.hub.subscribe();
        let weak: Weak<Inner> = Arc::downgrade(&self.inner);
        let own_id = self.inner.settings.writer_id.clone();

        let handle = tokio::spawn(async move {
            loop {
                let event = match rx.recv().await {
                    Ok(event) => event,
                    Err(RecvError::Lagged(skipped)) => {
                        tracing::debug!(skipped, "Sync listener lagged");
                        continue;
                    }
                    Err(RecvError::Closed) => break,
                };
                if event.writer_id() == own_id {
                    continue;
                }
                let Some(inner) = weak.upgrade() else {
                    break;
                };
                tracing::debug!(event = ?event, "Remote sync event");
                if matches!(event, SyncEvent::SyncComplete { .. })
                    && let Ok(mut st) = inner.state.lock()
                {
                    st.remote_syncs = st.remote_syncs.saturating_add(1);
                }
            }
        });

        if let Ok(mut st) = self.state()
            && let Some(old) = st.listener.replace(handle)
        {
            old.abort();
        }
    }

    // -------------------------------------------------------------------------
    // Lifecycle and inspection
    // -------------------------------------------------------------------------

    /// Best-effort final flush, bounded by the shutdown timeout.
    pub async fn shutdown(&self) {
        if let Ok(mut st) = self.state() {
            st.cancel_timers();
            if let Some(listener) = st.listener.take() {
                listener.abort();
            }
        }

        if !self.is_dirty() {
            return;
        }
        match tokio::time::timeout(self.inner.settings.shutdown_flush, self.flush_detached()).await
        {
            Ok(outcome) => tracing::info!(outcome = ?outcome, "Shutdown flush"),
            Err(_) => tracing::warn!("Shutdown flush timed out; it keeps running"),
        }
    }

    /// Whether changes are waiting to be flushed.
    #[must_use]
    pub fn is_dirty(&self) -> bool {
        self.state().map(|st| st.dirty).unwrap_or(false)
    }

    /// Current status, versions and counters.
    #[must_use]
    pub fn snapshot(&self) -> SyncSnapshot {
        match self.state() {
            Ok(st) => SyncSnapshot {
                status: st.status,
                last_sync_ms: st.last_sync_ms,
                dirty: st.dirty,
                sync_version: st.sync_version,
                remote_syncs: st.remote_syncs,
            },
            Err(_) => SyncSnapshot {
                status: SyncStatus::Error,
                last_sync_ms: None,
                dirty: true,
                sync_version: 0,
                remote_syncs: 0,
            },
        }
    }

    fn state(&self) -> Result<MutexGuard<'_, SyncState>, StratumError> {
        self.inner
            .state
            .lock()
            .map_err(|_| StratumError::LockPoisoned("sync state"))
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use stratum_core::{MemoryDurableStore, MemoryStore, Note};

    struct Fixture {
        store: Arc<MemoryStore>,
        disk: MemoryDurableStore,
        sync: DurableSyncCoordinator,
    }

    fn fixture() -> Fixture {
        let store = Arc::new(MemoryStore::new());
        let disk = MemoryDurableStore::new();
        let sync = DurableSyncCoordinator::new(
            store.clone(),
            Arc::new(disk.clone()),
            Arc::new(ContextHub::default()),
            SyncSettings::default(),
        );
        Fixture { store, disk, sync }
    }

    fn add_note(store: &MemoryStore, id: &str) {
        store
            .upsert(Note::new(id, "title", "").into())
            .expect("upsert");
    }

    #[tokio::test]
    async fn clean_flush_is_noop() {
        let f = fixture();
        assert_eq!(f.sync.sync_now().await, SyncOutcome::Clean);
        assert!(f.disk.write_log().expect("log").is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn mark_dirty_then_sync_now_writes_once() {
        let f = fixture();
        add_note(&f.store, "n1");

        f.sync.mark_dirty();
        let outcome = f.sync.sync_now().await;

        assert!(matches!(outcome, SyncOutcome::Flushed { .. }));
        let snap = f.sync.snapshot();
        assert!(!snap.dirty);
        assert!(snap.last_sync_ms.is_some());
        assert_eq!(snap.status, SyncStatus::Idle);

        // Cancelled timers must not flush again.
        tokio::time::sleep(Duration::from_secs(60)).await;
        assert_eq!(f.disk.writes_to("stratum.db").expect("count"), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn debounce_collapses_bursts() {
        let f = fixture();
        add_note(&f.store, "n1");

        for _ in 0..5 {
            f.sync.mark_dirty();
            tokio::time::sleep(Duration::from_millis(100)).await;
        }
        assert_eq!(f.disk.writes_to("stratum.db").expect("count"), 0);

        tokio::time::sleep(Duration::from_millis(2_500)).await;
        assert_eq!(f.disk.writes_to("stratum.db").expect("count"), 1);
        assert!(!f.sync.is_dirty());
    }

    #[tokio::test(start_paused = true)]
    async fn max_wait_bounds_continuous_writes() {
        let f = fixture();
        add_note(&f.store, "n1");

        // Every 500ms for 15s: the debounce never gets to fire.
        for _ in 0..30 {
            f.sync.mark_dirty();
            tokio::time::sleep(Duration::from_millis(500)).await;
        }

        assert!(f.disk.writes_to("stratum.db").expect("count") >= 1);
    }

    #[tokio::test(start_paused = true)]
    async fn failed_flush_retries_via_debounce() {
        let f = fixture();
        add_note(&f.store, "n1");
        f.disk.set_fail_writes(true).expect("toggle");

        f.sync.mark_dirty();
        assert_eq!(f.sync.sync_now().await, SyncOutcome::Failed);
        assert_eq!(f.sync.snapshot().status, SyncStatus::Error);
        assert!(f.sync.is_dirty());

        f.disk.set_fail_writes(false).expect("toggle");
        tokio::time::sleep(Duration::from_millis(2_500)).await;

        assert!(!f.sync.is_dirty());
        assert_eq!(f.sync.snapshot().status, SyncStatus::Idle);
        assert_eq!(f.disk.writes_to("stratum.db").expect("count"), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn abandoned_sync_now_still_writes_sidecar() {
        let f = fixture();
        add_note(&f.store, "n1");
        f.sync.mark_dirty();

        let caller = {
            let sync = f.sync.clone();
            tokio::spawn(async move { sync.sync_now().await })
        };
        for _ in 0..100 {
            if f.disk.writes_to("stratum.db").expect("count") > 0 {
                break;
            }
            tokio::task::yield_now().await;
        }
        caller.abort();
        let _ = caller.await;

        tokio::time::sleep(Duration::from_millis(10)).await;
        assert_eq!(f.disk.writes_to("stratum.db.meta.json").expect("count"), 1);
        let snap = f.sync.snapshot();
        assert_eq!(snap.status, SyncStatus::Idle);
        assert!(!snap.dirty);

        tokio::time::sleep(Duration::from_secs(120)).await;
        assert_eq!(f.disk.writes_to("stratum.db").expect("count"), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn shutdown_timeout_does_not_cut_flush_short() {
        let store = Arc::new(MemoryStore::new());
        add_note(&store, "n1");
        let disk = MemoryDurableStore::new();
        let hub = Arc::new(ContextHub::default());
        let sync = DurableSyncCoordinator::new(
            store,
            Arc::new(disk.clone()),
            hub.clone(),
            SyncSettings {
                shutdown_flush: Duration::from_millis(100),
                ..SyncSettings::default()
            },
        );

        let held = hub.locks().acquire("stratum.db").await.expect("lock");
        sync.mark_dirty();
        sync.shutdown().await;
        assert!(sync.is_dirty());
        assert_eq!(disk.writes_to("stratum.db").expect("count"), 0);

        drop(held);
        tokio::time::sleep(Duration::from_millis(10)).await;
        assert!(!sync.is_dirty());
        assert_eq!(disk.writes_to("stratum.db.meta.json").expect("count"), 1);
    }

    #[tokio::test]
    async fn boot_fresh_when_everything_empty() {
        let f = fixture();
        assert_eq!(f.sync.boot().await.expect("boot"), BootSource::Fresh);
        assert_eq!(f.sync.snapshot().status, SyncStatus::Idle);
    }

    #[tokio::test]
    async fn boot_imports_durable_blob() {
        let source = MemoryStore::new();
        for id in ["n1", "n2", "n3"] {
            add_note(&source, id);
        }
        let f = fixture();
        f.disk
            .write("stratum.db", &source.export_database().expect("export"))
            .expect("write");

        assert_eq!(f.sync.boot().await.expect("boot"), BootSource::Durable);
        assert_eq!(f.store.count_notes().expect("count"), 3);
    }

    #[tokio::test]
    async fn boot_fails_on_corrupt_blob() {
        let f = fixture();
        f.disk.write("stratum.db", b"not a blob").expect("write");

        let err = f.sync.boot().await.expect_err("corrupt");
        assert!(matches!(err, StratumError::Initialization(_)));
        assert_eq!(f.sync.snapshot().status, SyncStatus::Error);
    }

    #[tokio::test]
    async fn warm_boot_writes_missing_blob() {
        let f = fixture();
        add_note(&f.store, "n1");

        assert_eq!(f.sync.boot().await.expect("boot"), BootSource::Cache);
        f.sync.verified().await;

        assert!(f.disk.exists("stratum.db").expect("exists"));
        assert!(f.disk.exists("stratum.db.meta.json").expect("exists"));
    }

    #[tokio::test]
    async fn listener_counts_remote_flushes_only() {
        let hub = Arc::new(ContextHub::default());
        let disk = MemoryDurableStore::new();
        let settings = |id: &str| SyncSettings {
            writer_id: id.to_string(),
            ..SyncSettings::default()
        };
        let a = DurableSyncCoordinator::new(
            Arc::new(MemoryStore::new()),
            Arc::new(disk.clone()),
            hub.clone(),
            settings("a"),
        );
        let b_store = Arc::new(MemoryStore::new());
        add_note(&b_store, "n1");
        let b = DurableSyncCoordinator::new(b_store, Arc::new(disk), hub, settings("b"));

        a.spawn_listener();
        b.spawn_listener();
        b.mark_dirty();
        b.sync_now().await;
        for _ in 0..4 {
            tokio::task::yield_now().await;
        }

        assert_eq!(a.snapshot().remote_syncs, 1);
        assert_eq!(b.snapshot().remote_syncs, 0);
    }
}
