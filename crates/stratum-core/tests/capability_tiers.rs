//! # Capability Tier Tests
//!
//! Each tier exercised through its trait object, the way the coordinator
//! sees it.
//!
//! ## Tiers
//! - Source of truth (`RecordStore`)
//! - Durable store (`DurableStore`)
//! - Boot cache (`BootCache`)
//! - Graph engine (`GraphEngine`)

use serde_json::{Value, json};
use std::sync::Arc;
use stratum_core::{
    BootCache, DurableStore, Entity, Folder, FsDurableStore, GraphEngine, GraphIndex,
    MemoryDurableStore, MemoryStore, Mutation, Note, Params, RecordKind, RecordStore,
    RedbBootCache, Relationship, SyncMetadata, primitives,
};
use tempfile::tempdir;

fn params(value: Value) -> Params {
    match value {
        Value::Object(map) => map,
        _ => Params::new(),
    }
}

// =============================================================================
// SOURCE OF TRUTH -> DURABLE
// =============================================================================

mod durable_tier {
    use super::*;

    /// A store export written to disk restores into an empty store.
    #[test]
    fn export_survives_filesystem_round_trip() {
        let temp = tempdir().expect("temp dir");
        let durable: Arc<dyn DurableStore> =
            Arc::new(FsDurableStore::open(temp.path()).expect("open"));

        let source: Arc<dyn RecordStore> = Arc::new(MemoryStore::new());
        for i in 0..3 {
            source
                .upsert(Note::new(format!("n{}", i), format!("Note {}", i), "").into())
                .expect("upsert");
        }

        let blob = source.export_database().expect("export");
        durable
            .write(primitives::DEFAULT_BLOB_PATH, &blob)
            .expect("write blob");
        let meta = SyncMetadata::describe(&blob, "ctx-test", 1);
        durable
            .write(
                &primitives::metadata_path(primitives::DEFAULT_BLOB_PATH),
                &meta.to_bytes().expect("encode"),
            )
            .expect("write meta");

        let restored = MemoryStore::new();
        let bytes = durable
            .read(primitives::DEFAULT_BLOB_PATH)
            .expect("read")
            .expect("blob present");
        restored.import_database(&bytes).expect("import");
        assert_eq!(restored.count_notes().expect("count"), 3);

        let sidecar = durable
            .read("stratum.db.meta.json")
            .expect("read")
            .expect("sidecar present");
        let decoded = SyncMetadata::from_bytes(&sidecar).expect("decode");
        assert!(decoded.matches(&bytes));
        assert_eq!(decoded.writer_id, "ctx-test");
    }

    /// Clones of the in-memory durable store behave like one disk.
    #[test]
    fn shared_memory_durable() {
        let disk = MemoryDurableStore::new();
        let a: Arc<dyn DurableStore> = Arc::new(disk.clone());
        let b: Arc<dyn DurableStore> = Arc::new(disk.clone());

        a.write("stratum.db", b"blob").expect("write");
        assert_eq!(b.read("stratum.db").expect("read"), Some(b"blob".to_vec()));
        assert_eq!(disk.writes_to("stratum.db").expect("count"), 1);
    }
}

// =============================================================================
// BOOT CACHE
// =============================================================================

mod boot_cache_tier {
    use super::*;

    /// Records cached by one process are preloaded by the next.
    #[test]
    fn preload_after_reopen() {
        let temp = tempdir().expect("temp dir");
        let path = temp.path().join("boot.redb");

        {
            let cache: Arc<dyn BootCache> = Arc::new(RedbBootCache::open(&path).expect("open"));
            cache
                .put(&Note::new("n1", "Cached", "").into())
                .expect("put");
            cache
                .put(&Relationship::new("r1", "e1", "e2", "knows").into())
                .expect("put");
            cache.delete(RecordKind::Relationship, "r1").expect("delete");
        }

        let cache = RedbBootCache::open(&path).expect("reopen");
        let snapshot = cache.preload().expect("preload").expect("some");
        assert_eq!(snapshot.counts().notes, 1);
        assert_eq!(snapshot.counts().relationships, 0);

        let store = MemoryStore::with_snapshot(snapshot);
        assert!(store.get(RecordKind::Note, "n1").expect("get").is_some());
    }
}

// =============================================================================
// GRAPH ENGINE
// =============================================================================

mod graph_tier {
    use super::*;

    fn engine() -> Arc<dyn GraphEngine> {
        Arc::new(GraphIndex::new())
    }

    /// Records projected through scripts come back out of queries.
    #[test]
    fn projected_records_are_queryable() {
        let engine = engine();
        assert!(engine.is_ready());

        for mutation in [
            Mutation::PutEntity(Entity::new("ada", "Ada", "person")),
            Mutation::PutEntity(Entity::new("babbage", "Babbage", "person")),
            Mutation::PutRelationship(Relationship::new("r1", "ada", "babbage", "knows")),
        ] {
            let result =
                engine.run_mutation(mutation.script(), &mutation.params().expect("params"));
            assert!(result.ok, "{:?}", result.message);
        }

        let result = engine.run_query("entities", &params(json!({"kind": "person"})));
        assert!(result.ok);
        assert_eq!(result.rows.len(), 2);

        let result = engine.run_query("neighbors", &params(json!({"id": "ada"})));
        assert_eq!(result.rows.len(), 1);
        assert_eq!(result.rows[0]["id"], "babbage");
        assert_eq!(result.rows[0]["kind"], "knows");
    }

    /// Folder rows deserialize back into folders.
    #[test]
    fn folder_rows_decode() {
        let engine = engine();
        let folder = Folder::new("f1", "Inbox", None);
        let mutation = Mutation::PutFolder(folder.clone());
        assert!(
            engine
                .run_mutation(mutation.script(), &mutation.params().expect("params"))
                .ok
        );

        let result = engine.run_query("folder", &params(json!({"id": "f1"})));
        let decoded: Folder =
            serde_json::from_value(Value::Object(result.rows[0].clone())).expect("decode");
        assert_eq!(decoded, folder);
    }

    /// Bad scripts fail in band, never panic.
    #[test]
    fn failures_are_reported_not_raised() {
        let engine = engine();

        let result = engine.run_mutation(
            "put_relationship",
            &params(json!({"id": "r1", "source_id": "x", "target_id": "y", "kind": "k"})),
        );
        assert!(!result.ok);

        let result = engine.run_query("entity", &Params::new());
        assert!(!result.ok);
        assert!(result.rows.is_empty());
    }

    /// Missing records yield empty results.
    #[test]
    fn unknown_ids_are_empty() {
        let engine = engine();
        assert!(engine.run_query("entity", &params(json!({"id": "nobody"}))).rows.is_empty());
        assert!(
            engine
                .run_query("traverse", &params(json!({"id": "nobody", "depth": 2})))
                .rows
                .is_empty()
        );
    }
}
