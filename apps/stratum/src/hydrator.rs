//! # Graph Hydrator
//!
//! Lazily rebuilds the derived graph projection (entities and relationships)
//! from the source of truth.
//!
//! ## States
//!
//! ```text
//! Empty --hydrate--> Hydrating --> Ready --invalidate--> Stale --access--> Hydrating
//!                        \
//!                         `--> Error (engine not ready, source unreadable)
//! ```
//!
//! Every run takes a new version number. A run stops projecting as soon as
//! a newer one starts, and leaves the status alone. A completed run also
//! removes graph records the source of truth no longer has, so a
//! superseded run cannot leave ghosts behind.
//!
//! A run whose future is dropped mid-way hands its `Hydrating` status back
//! as `Stale`, so the next access starts over.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeSet;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use stratum_core::{
    GraphEngine, Mutation, Params, Record, RecordKind, RecordStore, Row, StratumError, now_millis,
};
use tokio::sync::watch;

/// Graph projection status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HydrationStatus {
    Empty,
    Hydrating,
    Ready,
    Stale,
    Error,
}

/// Result of one hydration run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum HydrationOutcome {
    /// The projection is current. Per-record failures are counted, not fatal.
    Completed { upserted: u64, failed: u64 },
    /// A newer run started first; this result was discarded.
    Superseded,
    /// The engine or the source of truth was unavailable.
    Failed,
}

// =============================================================================
// RECORD MAPPING
// =============================================================================

/// The graph command that projects a record, if its kind lives in the graph.
#[must_use]
pub fn projection(record: Record) -> Option<Mutation> {
    match record {
        Record::Note(_) => None,
        Record::Folder(folder) => Some(Mutation::PutFolder(folder)),
        Record::Entity(entity) => Some(Mutation::PutEntity(entity)),
        Record::Relationship(rel) => Some(Mutation::PutRelationship(rel)),
    }
}

/// The graph command that removes a record, if its kind lives in the graph.
#[must_use]
pub fn removal(kind: RecordKind, id: &str) -> Option<Mutation> {
    let id = id.to_string();
    match kind {
        RecordKind::Note => None,
        RecordKind::Folder => Some(Mutation::RemoveFolder(id)),
        RecordKind::Entity => Some(Mutation::RemoveEntity(id)),
        RecordKind::Relationship => Some(Mutation::RemoveRelationship(id)),
    }
}

/// Build a params map from a JSON object literal.
#[must_use]
pub fn params(value: Value) -> Params {
    match value {
        Value::Object(map) => map,
        _ => Params::new(),
    }
}

// =============================================================================
// HYDRATOR
// =============================================================================

/// Ids present in the source of truth when a run started.
#[derive(Debug, Default)]
struct LiveIds {
    entities: BTreeSet<String>,
    relationships: BTreeSet<String>,
}

impl LiveIds {
    fn insert(&mut self, record: &Record) {
        let set = match record.kind() {
            RecordKind::Entity => &mut self.entities,
            RecordKind::Relationship => &mut self.relationships,
            RecordKind::Note | RecordKind::Folder => return,
        };
        set.insert(record.id().to_string());
    }
}

fn row_id(row: &Row) -> Option<&str> {
    row.get("id").and_then(Value::as_str)
}

/// Versioned, lazily triggered graph projection.
pub struct GraphHydrator {
    store: Arc<dyn RecordStore>,
    engine: Arc<dyn GraphEngine>,
    status: watch::Sender<HydrationStatus>,
    version: AtomicU64,
    last_hydrated_ms: AtomicU64,
    wait_bound: Duration,
    /// Held across each version check and the graph write it guards.
    apply_lock: Mutex<()>,
}

/// Turns an abandoned run's `Hydrating` into `Stale`.
struct RunGuard<'a> {
    hydrator: &'a GraphHydrator,
    version: u64,
}

impl Drop for RunGuard<'_> {
    fn drop(&mut self) {
        let version = self.version;
        let hydrator = self.hydrator;
        let abandoned = hydrator.status.send_if_modified(|status| {
            if *status == HydrationStatus::Hydrating && hydrator.version() == version {
                *status = HydrationStatus::Stale;
                true
            } else {
                false
            }
        });
        if abandoned {
            tracing::debug!(version, "Hydration abandoned; projection marked stale");
        }
    }
}

impl std::fmt::Debug for GraphHydrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GraphHydrator")
            .field("status", &self.status())
            .field("version", &self.version())
            .finish_non_exhaustive()
    }
}

impl GraphHydrator {
    /// Create a hydrator in `Empty`. Waiting on an in-flight run gives up
    /// after `wait_bound`.
    #[must_use]
    pub fn new(
        store: Arc<dyn RecordStore>,
        engine: Arc<dyn GraphEngine>,
        wait_bound: Duration,
    ) -> Self {
        let (status, _) = watch::channel(HydrationStatus::Empty);
        Self {
            store,
            engine,
            status,
            version: AtomicU64::new(0),
            last_hydrated_ms: AtomicU64::new(0),
            wait_bound,
            apply_lock: Mutex::new(()),
        }
    }

    /// Current status.
    #[must_use]
    pub fn status(&self) -> HydrationStatus {
        *self.status.borrow()
    }

    /// Number of runs started so far.
    #[must_use]
    pub fn version(&self) -> u64 {
        self.version.load(Ordering::SeqCst)
    }

    /// Completion time of the last run that reached `Ready`.
    #[must_use]
    pub fn last_hydrated_ms(&self) -> Option<u64> {
        match self.last_hydrated_ms.load(Ordering::Relaxed) {
            0 => None,
            ms => Some(ms),
        }
    }

    /// Mark a ready projection out of date. No-op in any other state.
    pub fn invalidate(&self) {
        let changed = self.status.send_if_modified(|status| {
            if *status == HydrationStatus::Ready {
                *status = HydrationStatus::Stale;
                true
            } else {
                false
            }
        });
        if changed {
            tracing::debug!("Graph projection invalidated");
        }
    }

    /// Make sure the projection is usable before a read.
    ///
    /// A run already in flight is awaited (bounded); an empty or stale
    /// projection is rebuilt. A run that is still on the same version when
    /// the wait runs out is treated as stuck and replaced. A failed
    /// projection stays failed until [`retry`](Self::retry) is called.
    pub async fn ensure_hydrated(&self) {
        match self.status() {
            HydrationStatus::Ready => {}
            HydrationStatus::Hydrating => {
                let awaited = self.version();
                let mut rx = self.status.subscribe();
                let waited = tokio::time::timeout(self.wait_bound, async {
                    rx.wait_for(|s| *s != HydrationStatus::Hydrating)
                        .await
                        .is_ok()
                })
                .await;
                match waited {
                    Ok(_) => {
                        if matches!(
                            self.status(),
                            HydrationStatus::Empty | HydrationStatus::Stale
                        ) {
                            self.hydrate().await;
                        }
                    }
                    Err(_) => {
                        tracing::warn!(
                            wait_ms = self.wait_bound.as_millis() as u64,
                            "Timed out waiting for graph hydration"
                        );
                        if self.version() == awaited {
                            self.hydrate().await;
                        }
                    }
                }
            }
            HydrationStatus::Empty | HydrationStatus::Stale => {
                self.hydrate().await;
            }
            HydrationStatus::Error => {
                tracing::warn!("Graph projection failed earlier; call retry() to rebuild");
            }
        }
    }

    /// Rebuild the projection from any state.
    pub async fn retry(&self) -> HydrationOutcome {
        tracing::info!("Retrying graph hydration");
        self.hydrate().await
    }

    /// Rebuild the projection from the source of truth.
    pub async fn hydrate(&self) -> HydrationOutcome {
        let v = self.version.fetch_add(1, Ordering::SeqCst).wrapping_add(1);
        self.status.send_replace(HydrationStatus::Hydrating);
        let _guard = RunGuard {
            hydrator: self,
            version: v,
        };
        let started = tokio::time::Instant::now();

        if !self.engine.is_ready() {
            return self.fail(v, &StratumError::NotReady("graph engine".to_string()));
        }

        let records = match self.read_source() {
            Ok(records) => records,
            Err(e) => return self.fail(v, &e),
        };
        let mut live = LiveIds::default();
        for record in &records {
            live.insert(record);
        }

        let mut upserted = 0u64;
        let mut failed = 0u64;
        for record in records {
            let id = record.id().to_string();
            let Some(mutation) = projection(record) else {
                continue;
            };
            match self.apply_current(v, &mutation) {
                None => return self.superseded(v),
                Some(true) => upserted = upserted.saturating_add(1),
                Some(false) => {
                    failed = failed.saturating_add(1);
                    tracing::debug!(id = %id, "Graph projection of record failed");
                }
            }
            tokio::task::yield_now().await;
        }

        let Some(pruned) = self.prune(v, &live) else {
            return self.superseded(v);
        };

        self.last_hydrated_ms.store(now_millis(), Ordering::Relaxed);
        self.status.send_replace(HydrationStatus::Ready);
        tracing::info!(
            version = v,
            upserted,
            failed,
            pruned,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Graph hydration complete"
        );
        HydrationOutcome::Completed { upserted, failed }
    }

    /// Entities first so relationships find their endpoints.
    fn read_source(&self) -> Result<Vec<Record>, StratumError> {
        let mut records = self.store.list(RecordKind::Entity)?;
        records.extend(self.store.list(RecordKind::Relationship)?);
        Ok(records)
    }

    /// Apply a mutation only while run `v` is the latest one.
    ///
    /// `None` means a newer run has started and nothing was written.
    fn apply_current(&self, v: u64, mutation: &Mutation) -> Option<bool> {
        let _held = self.apply_lock.lock().unwrap_or_else(PoisonError::into_inner);
        if self.version() != v {
            return None;
        }
        Some(self.apply(mutation))
    }

    /// Remove graph entities and relationships missing from the source of
    /// truth. Returns how many were removed, or `None` if superseded.
    fn prune(&self, v: u64, live: &LiveIds) -> Option<usize> {
        let mut removals = Vec::new();
        for row in self.query_sync("relationships", &Params::new()) {
            if let Some(id) = row_id(&row)
                && !live.relationships.contains(id)
            {
                removals.push(Mutation::RemoveRelationship(id.to_string()));
            }
        }
        for row in self.query_sync("entities", &Params::new()) {
            if let Some(id) = row_id(&row)
                && !live.entities.contains(id)
            {
                removals.push(Mutation::RemoveEntity(id.to_string()));
            }
        }

        let pruned = removals.len();
        for mutation in &removals {
            self.apply_current(v, mutation)?;
        }
        if pruned > 0 {
            tracing::debug!(pruned, "Removed graph records missing from the source");
        }
        Some(pruned)
    }

    fn apply(&self, mutation: &Mutation) -> bool {
        match mutation.params() {
            Ok(params) => self.run_mutation(mutation.script(), &params),
            Err(e) => {
                tracing::debug!("Cannot encode graph command: {}", e);
                false
            }
        }
    }

    fn superseded(&self, v: u64) -> HydrationOutcome {
        tracing::debug!(version = v, current = self.version(), "Hydration superseded");
        HydrationOutcome::Superseded
    }

    fn fail(&self, v: u64, error: &StratumError) -> HydrationOutcome {
        if self.version() != v {
            return HydrationOutcome::Superseded;
        }
        tracing::warn!("Graph hydration failed: {}", error);
        self.status.send_replace(HydrationStatus::Error);
        HydrationOutcome::Failed
    }

    // -------------------------------------------------------------------------
    // Pass-through access
    // -------------------------------------------------------------------------

    /// Run a read script as-is. Engine failures read as no rows.
    pub fn query_sync(&self, script: &str, params: &Params) -> Vec<Row> {
        let result = self.engine.run_query(script, params);
        if result.ok {
            result.rows
        } else {
            tracing::warn!(
                script,
                message = result.message.as_deref().unwrap_or("unknown error"),
                "Graph query failed"
            );
            Vec::new()
        }
    }

    /// First row of a read script.
    pub fn query_one(&self, script: &str, params: &Params) -> Option<Row> {
        self.query_sync(script, params).into_iter().next()
    }

    /// Run a read script once the projection is usable.
    pub async fn query_async(&self, script: &str, params: &Params) -> Vec<Row> {
        self.ensure_hydrated().await;
        self.query_sync(script, params)
    }

    /// Run a write script. Failures are logged and reported as `false`.
    pub fn run_mutation(&self, script: &str, params: &Params) -> bool {
        let result = self.engine.run_mutation(script, params);
        if !result.ok {
            tracing::debug!(
                script,
                message = result.message.as_deref().unwrap_or("unknown error"),
                "Graph mutation failed"
            );
        }
        result.ok
    }

    /// Apply a typed graph command.
    pub fn mutate(&self, mutation: &Mutation) -> bool {
        self.apply(mutation)
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use stratum_core::{
        Entity, GraphIndex, MemoryStore, MutationResult, QueryResult, Relationship,
    };

    struct Unready;

    impl GraphEngine for Unready {
        fn is_ready(&self) -> bool {
            false
        }
        fn run_query(&self, _script: &str, _params: &Params) -> QueryResult {
            QueryResult::failed("not loaded")
        }
        fn run_mutation(&self, _script: &str, _params: &Params) -> MutationResult {
            MutationResult::failed("not loaded")
        }
    }

    fn populated_store(entities: usize) -> Arc<MemoryStore> {
        let store = Arc::new(MemoryStore::new());
        for i in 0..entities {
            store
                .upsert(Entity::new(format!("e{:03}", i), "name", "concept").into())
                .expect("upsert");
        }
        store
    }

    fn hydrator(store: Arc<MemoryStore>) -> (Arc<GraphHydrator>, Arc<GraphIndex>) {
        let engine = Arc::new(GraphIndex::new());
        let hydrator = Arc::new(GraphHydrator::new(
            store,
            engine.clone(),
            Duration::from_secs(10),
        ));
        (hydrator, engine)
    }

    #[test]
    fn invalidate_on_empty_stays_empty() {
        let (hydrator, _) = hydrator(populated_store(0));
        hydrator.invalidate();
        assert_eq!(hydrator.status(), HydrationStatus::Empty);
    }

    #[tokio::test]
    async fn hydrate_projects_entities_and_relationships() {
        let store = populated_store(2);
        store
            .upsert(Relationship::new("r1", "e000", "e001", "knows").into())
            .expect("upsert");
        store
            .upsert(Relationship::new("r2", "e000", "missing", "knows").into())
            .expect("upsert");
        let (hydrator, _) = hydrator(store);

        let outcome = hydrator.hydrate().await;
        assert_eq!(
            outcome,
            HydrationOutcome::Completed {
                upserted: 3,
                failed: 1
            }
        );
        assert_eq!(hydrator.status(), HydrationStatus::Ready);
        assert!(hydrator.last_hydrated_ms().is_some());

        let rows = hydrator.query_sync("neighbors", &params(json!({"id": "e000"})));
        assert_eq!(rows.len(), 1);
    }

    #[tokio::test]
    async fn ready_invalidate_access_cycle() {
        let (hydrator, _) = hydrator(populated_store(1));
        hydrator.ensure_hydrated().await;
        assert_eq!(hydrator.status(), HydrationStatus::Ready);

        hydrator.invalidate();
        assert_eq!(hydrator.status(), HydrationStatus::Stale);

        let rows = hydrator
            .query_async("entity", &params(json!({"id": "e000"})))
            .await;
        assert_eq!(rows.len(), 1);
        assert_eq!(hydrator.status(), HydrationStatus::Ready);
        assert_eq!(hydrator.version(), 2);
    }

    #[tokio::test]
    async fn unready_engine_fails_and_needs_retry() {
        let hydrator = GraphHydrator::new(
            populated_store(1),
            Arc::new(Unready),
            Duration::from_secs(1),
        );

        assert_eq!(hydrator.hydrate().await, HydrationOutcome::Failed);
        assert_eq!(hydrator.status(), HydrationStatus::Error);

        // No automatic retry from Error.
        hydrator.ensure_hydrated().await;
        assert_eq!(hydrator.version(), 1);

        assert_eq!(hydrator.retry().await, HydrationOutcome::Failed);
        assert_eq!(hydrator.version(), 2);
    }

    #[tokio::test]
    async fn failed_queries_read_as_empty() {
        let (hydrator, _) = hydrator(populated_store(0));
        assert!(hydrator.query_sync("bogus", &Params::new()).is_empty());
        assert!(hydrator.query_one("entity", &Params::new()).is_none());
        assert!(!hydrator.run_mutation("bogus", &Params::new()));
    }

    #[tokio::test]
    async fn waiters_join_in_flight_run() {
        let (hydrator, _) = hydrator(populated_store(20));

        let first = {
            let hydrator = hydrator.clone();
            tokio::spawn(async move { hydrator.hydrate().await })
        };
        tokio::task::yield_now().await;
        assert_eq!(hydrator.status(), HydrationStatus::Hydrating);

        hydrator.ensure_hydrated().await;
        assert_eq!(hydrator.status(), HydrationStatus::Ready);
        assert_eq!(hydrator.version(), 1);
        assert!(matches!(
            first.await.expect("join"),
            HydrationOutcome::Completed { .. }
        ));
    }

    #[tokio::test]
    async fn rehydrate_drops_records_gone_from_source() {
        let store = populated_store(3);
        let (hydrator, _) = hydrator(store.clone());
        hydrator.hydrate().await;

        store.delete(RecordKind::Entity, "e001").expect("delete");
        hydrator.invalidate();
        let rows = hydrator.query_async("entities", &Params::new()).await;

        let ids: Vec<_> = rows.iter().filter_map(row_id).collect();
        assert_eq!(ids, vec!["e000", "e002"]);
    }

    #[tokio::test]
    async fn abandoned_run_leaves_projection_stale() {
        let store = populated_store(20);
        let (hydrator, _) = hydrator(store.clone());

        let run = {
            let hydrator = hydrator.clone();
            tokio::spawn(async move { hydrator.hydrate().await })
        };
        tokio::task::yield_now().await;
        assert_eq!(hydrator.status(), HydrationStatus::Hydrating);
        run.abort();
        assert!(run.await.expect_err("aborted").is_cancelled());
        assert_eq!(hydrator.status(), HydrationStatus::Stale);

        store
            .upsert(Entity::new("late", "name", "concept").into())
            .expect("upsert");
        hydrator.invalidate();
        let rows = hydrator
            .query_async("entity", &params(json!({"id": "late"})))
            .await;
        assert_eq!(rows.len(), 1);
        assert_eq!(hydrator.status(), HydrationStatus::Ready);
        assert_eq!(hydrator.version(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn stuck_run_is_replaced_after_wait_bound() {
        let store = populated_store(20);
        let hydrator = GraphHydrator::new(
            store,
            Arc::new(GraphIndex::new()),
            Duration::from_millis(100),
        );

        // Poll a run a couple of times, then keep it alive without polling.
        let mut stuck = Box::pin(hydrator.hydrate());
        let finished = tokio::select! {
            biased;
            _ = &mut stuck => true,
            _ = tokio::task::yield_now() => false,
        };
        assert!(!finished);
        assert_eq!(hydrator.status(), HydrationStatus::Hydrating);

        hydrator.ensure_hydrated().await;
        assert_eq!(hydrator.status(), HydrationStatus::Ready);
        assert_eq!(hydrator.version(), 2);
        assert_eq!(hydrator.query_sync("entities", &Params::new()).len(), 20);

        drop(stuck);
        assert_eq!(hydrator.status(), HydrationStatus::Ready);
    }

    #[test]
    fn mapping_covers_graph_kinds_only() {
        assert!(projection(stratum_core::Note::new("n", "t", "").into()).is_none());
        assert!(removal(RecordKind::Note, "n").is_none());
        assert_eq!(
            removal(RecordKind::Folder, "f"),
            Some(Mutation::RemoveFolder("f".to_string()))
        );
    }
}
