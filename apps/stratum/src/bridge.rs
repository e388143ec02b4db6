//! # Bridge Facade
//!
//! The single entry point the rest of the application talks to.
//!
//! Writes go to the source of truth first; side effects fan out from there:
//!
//! ```text
//! sync_*(record) ──► RecordStore ──┬─► DurableSyncCoordinator::mark_dirty
//!                                  ├─► folders: direct graph upsert
//!                                  ├─► entities / relationships: invalidate
//!                                  └─► CacheWarmer (detached)
//! ```
//!
//! Reads are routed by kind: notes, entities and relationships come from the
//! source of truth, folders from the graph engine.

use crate::boot::{BootOrchestrator, BootPhase};
use crate::hydrator::{self, GraphHydrator, HydrationOutcome, HydrationStatus};
use crate::sync::{BootSource, DurableSyncCoordinator, SyncOutcome, SyncSnapshot};
use crate::warm::{CacheWarmer, WarmStats};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::{Arc, Mutex, OnceLock};
use stratum_core::{
    Entity, Folder, GraphEngine, Mutation, Note, Params, Record, RecordCounts, RecordKind,
    RecordStore, Relationship, Row, StratumError,
};

// =============================================================================
// PUBLIC TYPES
// =============================================================================

/// Initialization status of the bridge.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", content = "message", rename_all = "snake_case")]
pub enum BridgeStatus {
    Uninitialized,
    Initializing,
    Ready,
    Error(String),
}

/// What was loaded at boot. Built once per process.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BootReport {
    pub notes: usize,
    pub folders: usize,
    pub entities: usize,
    pub relationships: usize,
    pub elapsed_ms: u64,
    pub source: BootSource,
}

/// Combined view of the durable tier, the graph projection and the boot cache.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncStatusReport {
    pub sync: SyncSnapshot,
    pub hydration: HydrationStatus,
    pub hydration_version: u64,
    pub warm: WarmStats,
}

// =============================================================================
// BRIDGE
// =============================================================================

/// Routes reads and writes across the storage tiers.
pub struct Bridge {
    store: Arc<dyn RecordStore>,
    engine: Arc<dyn GraphEngine>,
    sync: DurableSyncCoordinator,
    hydrator: Arc<GraphHydrator>,
    warmer: CacheWarmer,
    orchestrator: Arc<BootOrchestrator>,
    status: Mutex<BridgeStatus>,
    init_lock: tokio::sync::Mutex<()>,
    report: OnceLock<BootReport>,
}

impl std::fmt::Debug for Bridge {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Bridge")
            .field("status", &self.status())
            .field("sync", &self.sync)
            .field("hydrator", &self.hydrator)
            .finish_non_exhaustive()
    }
}

impl Bridge {
    /// Wire a bridge from its collaborators.
    #[must_use]
    pub fn new(
        store: Arc<dyn RecordStore>,
        engine: Arc<dyn GraphEngine>,
        sync: DurableSyncCoordinator,
        hydrator: Arc<GraphHydrator>,
        warmer: CacheWarmer,
        orchestrator: Arc<BootOrchestrator>,
    ) -> Self {
        Self {
            store,
            engine,
            sync,
            hydrator,
            warmer,
            orchestrator,
            status: Mutex::new(BridgeStatus::Uninitialized),
            init_lock: tokio::sync::Mutex::new(()),
            report: OnceLock::new(),
        }
    }

    // -------------------------------------------------------------------------
    // Initialization
    // -------------------------------------------------------------------------

    /// Boot every tier in order and gate the boot phases on it.
    ///
    /// Idempotent: concurrent and repeated calls share one successful boot.
    /// A failed boot leaves the status at `Error` and may be retried.
    pub async fn init(&self) -> Result<BootReport, StratumError> {
        let _guard = self.init_lock.lock().await;
        if let Some(report) = self.report.get() {
            return Ok(report.clone());
        }

        self.set_status(BridgeStatus::Initializing);
        match self.boot_sequence().await {
            Ok(report) => {
                let report = self.report.get_or_init(|| report).clone();
                self.set_status(BridgeStatus::Ready);
                // Phase waiters are released only once the report and status
                // are visible.
                self.orchestrator.complete_phase(BootPhase::ModuleHydrate);
                self.orchestrator.complete_phase(BootPhase::Ready);
                tracing::info!(
                    notes = report.notes,
                    folders = report.folders,
                    entities = report.entities,
                    relationships = report.relationships,
                    elapsed_ms = report.elapsed_ms,
                    source = ?report.source,
                    "Bridge ready"
                );
                Ok(report)
            }
            Err(e) => {
                tracing::error!("Bridge initialization failed: {}", e);
                self.set_status(BridgeStatus::Error(e.to_string()));
                Err(e)
            }
        }
    }

    async fn boot_sequence(&self) -> Result<BootReport, StratumError> {
        let started = tokio::time::Instant::now();

        self.store.ensure_ready()?;
        self.orchestrator.complete_phase(BootPhase::Registry);

        if !self.engine.is_ready() {
            return Err(StratumError::NotReady("graph engine".to_string()));
        }
        self.orchestrator.complete_phase(BootPhase::ModuleLoad);

        let source = self.sync.boot().await?;
        if source == BootSource::Fresh {
            self.seed_from_cache()?;
        }

        let folders = self.project_folders()?;
        tracing::debug!(folders, "Folders projected");

        let counts = self.store.counts()?;
        Ok(BootReport {
            notes: counts.notes,
            folders: counts.folders,
            entities: counts.entities,
            relationships: counts.relationships,
            elapsed_ms: started.elapsed().as_millis() as u64,
            source,
        })
    }

    /// Copy the boot-cache preload into an empty source of truth.
    fn seed_from_cache(&self) -> Result<(), StratumError> {
        let Some(snapshot) = self.warmer.preload() else {
            return Ok(());
        };
        if snapshot.is_empty() {
            return Ok(());
        }

        let counts = snapshot.counts();
        for record in snapshot.into_records() {
            self.store.upsert(record)?;
        }
        tracing::info!(records = counts.total(), "Seeded from boot cache");
        self.sync.mark_dirty();
        Ok(())
    }

    /// Push every folder into the graph engine, their read path.
    fn project_folders(&self) -> Result<usize, StratumError> {
        let mut projected = 0usize;
        for record in self.store.list(RecordKind::Folder)? {
            if let Some(mutation) = hydrator::projection(record)
                && self.hydrator.mutate(&mutation)
            {
                projected = projected.saturating_add(1);
            }
        }
        Ok(projected)
    }

    // -------------------------------------------------------------------------
    // Writes
    // -------------------------------------------------------------------------

    /// Create or replace a note.
    pub fn sync_note(&self, note: Note) -> Result<(), StratumError> {
        self.write(note.into())
    }

    /// Create or replace a folder.
    pub fn sync_folder(&self, folder: Folder) -> Result<(), StratumError> {
        self.write(folder.into())
    }

    /// Create or replace an entity.
    pub fn sync_entity(&self, entity: Entity) -> Result<(), StratumError> {
        self.write(entity.into())
    }

    /// Create or replace a relationship.
    pub fn sync_relationship(&self, relationship: Relationship) -> Result<(), StratumError> {
        self.write(relationship.into())
    }

    /// Delete a note. Returns whether it existed.
    pub fn delete_note(&self, id: &str) -> Result<bool, StratumError> {
        self.remove(RecordKind::Note, id)
    }

    /// Delete a folder. Returns whether it existed.
    pub fn delete_folder(&self, id: &str) -> Result<bool, StratumError> {
        self.remove(RecordKind::Folder, id)
    }

    /// Delete an entity. Returns whether it existed.
    pub fn delete_entity(&self, id: &str) -> Result<bool, StratumError> {
        self.remove(RecordKind::Entity, id)
    }

    /// Delete a relationship. Returns whether it existed.
    pub fn delete_relationship(&self, id: &str) -> Result<bool, StratumError> {
        self.remove(RecordKind::Relationship, id)
    }

    fn write(&self, record: Record) -> Result<(), StratumError> {
        let kind = record.kind();
        self.store.upsert(record.clone())?;
        self.sync.mark_dirty();

        match kind {
            RecordKind::Note => {}
            RecordKind::Folder => {
                if let Some(mutation) = hydrator::projection(record.clone()) {
                    self.hydrator.mutate(&mutation);
                }
            }
            RecordKind::Entity | RecordKind::Relationship => self.hydrator.invalidate(),
        }

        self.warmer.warm(record);
        Ok(())
    }

    fn remove(&self, kind: RecordKind, id: &str) -> Result<bool, StratumError> {
        if !self.store.delete(kind, id)? {
            return Ok(false);
        }
        self.sync.mark_dirty();

        if let Some(mutation) = hydrator::removal(kind, id) {
            self.hydrator.mutate(&mutation);
        }
        if matches!(kind, RecordKind::Entity | RecordKind::Relationship) {
            self.hydrator.invalidate();
        }

        self.warmer.evict(kind, id);
        Ok(true)
    }

    // -------------------------------------------------------------------------
    // Reads
    // -------------------------------------------------------------------------

    /// One note by id.
    pub fn get_note(&self, id: &str) -> Result<Option<Note>, StratumError> {
        self.get_typed(RecordKind::Note, id)
    }

    /// All notes in id order.
    pub fn get_all_notes(&self) -> Result<Vec<Note>, StratumError> {
        self.list_typed(RecordKind::Note)
    }

    /// One entity by id.
    pub fn get_entity(&self, id: &str) -> Result<Option<Entity>, StratumError> {
        self.get_typed(RecordKind::Entity, id)
    }

    /// All entities in id order.
    pub fn get_all_entities(&self) -> Result<Vec<Entity>, StratumError> {
        self.list_typed(RecordKind::Entity)
    }

    /// One relationship by id.
    pub fn get_relationship(&self, id: &str) -> Result<Option<Relationship>, StratumError> {
        self.get_typed(RecordKind::Relationship, id)
    }

    /// All relationships in id order.
    pub fn get_all_relationships(&self) -> Result<Vec<Relationship>, StratumError> {
        self.list_typed(RecordKind::Relationship)
    }

    /// One folder by id, read from the graph engine.
    pub fn get_folder(&self, id: &str) -> Option<Folder> {
        let params = hydrator::params(serde_json::json!({ "id": id }));
        self.hydrator
            .query_one("folder", &params)
            .and_then(row_into)
    }

    /// All folders, read from the graph engine.
    pub fn get_all_folders(&self) -> Vec<Folder> {
        self.hydrator
            .query_sync("folders", &Params::new())
            .into_iter()
            .filter_map(row_into)
            .collect()
    }

    /// Per-kind record counts in the source of truth.
    pub fn counts(&self) -> Result<RecordCounts, StratumError> {
        self.store.counts()
    }

    fn get_typed<T>(&self, kind: RecordKind, id: &str) -> Result<Option<T>, StratumError>
    where
        T: TryFrom<Record, Error = StratumError>,
    {
        self.store.get(kind, id)?.map(T::try_from).transpose()
    }

    fn list_typed<T>(&self, kind: RecordKind) -> Result<Vec<T>, StratumError>
    where
        T: TryFrom<Record, Error = StratumError>,
    {
        self.store.list(kind)?.into_iter().map(T::try_from).collect()
    }

    // -------------------------------------------------------------------------
    // Graph queries
    // -------------------------------------------------------------------------

    /// Query the graph as it is right now, without waiting for hydration.
    pub fn query_graph(&self, script: &str, params: &Params) -> Vec<Row> {
        self.hydrator.query_sync(script, params)
    }

    /// Query the graph after making sure the projection is current.
    pub async fn query_graph_async(&self, script: &str, params: &Params) -> Vec<Row> {
        self.hydrator.query_async(script, params).await
    }

    /// Rebuild the graph projection now, from any state including `Error`.
    pub async fn rehydrate(&self) -> HydrationOutcome {
        self.hydrator.retry().await
    }

    // -------------------------------------------------------------------------
    // Whole-database transfer
    // -------------------------------------------------------------------------

    /// Export the source of truth as a database blob.
    pub fn export_database(&self) -> Result<Vec<u8>, StratumError> {
        self.store.export_database()
    }

    /// Replace the source of truth with a database blob.
    ///
    /// The graph is cleared and folders re-projected; entities and
    /// relationships are rebuilt lazily on the next graph access.
    pub fn import_database(&self, bytes: &[u8]) -> Result<RecordCounts, StratumError> {
        self.store.import_database(bytes)?;
        self.hydrator.mutate(&Mutation::Clear);
        self.project_folders()?;
        self.hydrator.invalidate();
        self.sync.mark_dirty();

        let counts = self.store.counts()?;
        tracing::info!(records = counts.total(), "Database imported");
        Ok(counts)
    }

    // -------------------------------------------------------------------------
    // Sync and status
    // -------------------------------------------------------------------------

    /// Flush pending changes to the durable tier now.
    pub async fn flush_queue(&self) -> SyncOutcome {
        self.sync.sync_now().await
    }

    /// Whether changes are waiting for a durable flush.
    #[must_use]
    pub fn has_pending_sync(&self) -> bool {
        self.sync.is_dirty()
    }

    /// Durable sync, graph projection and boot-cache counters.
    #[must_use]
    pub fn get_sync_status(&self) -> SyncStatusReport {
        SyncStatusReport {
            sync: self.sync.snapshot(),
            hydration: self.hydrator.status(),
            hydration_version: self.hydrator.version(),
            warm: self.warmer.stats(),
        }
    }

    /// The report of the completed boot, if any.
    #[must_use]
    pub fn boot_report(&self) -> Option<BootReport> {
        self.report.get().cloned()
    }

    /// Current initialization status.
    #[must_use]
    pub fn status(&self) -> BridgeStatus {
        self.status
            .lock()
            .map(|s| s.clone())
            .unwrap_or_else(|_| BridgeStatus::Error("status lock poisoned".to_string()))
    }

    /// The boot orchestrator gating this bridge.
    #[must_use]
    pub fn orchestrator(&self) -> &Arc<BootOrchestrator> {
        &self.orchestrator
    }

    /// The durable sync coordinator.
    #[must_use]
    pub fn sync(&self) -> &DurableSyncCoordinator {
        &self.sync
    }

    /// The graph hydrator.
    #[must_use]
    pub fn hydrator(&self) -> &Arc<GraphHydrator> {
        &self.hydrator
    }

    fn set_status(&self, status: BridgeStatus) {
        if let Ok(mut current) = self.status.lock() {
            *current = status;
        }
    }
}

fn row_into<T: DeserializeOwned>(row: Row) -> Option<T> {
    serde_json::from_value(Value::Object(row)).ok()
}

// =============================================================================
// TESTS
// =============================================================================
