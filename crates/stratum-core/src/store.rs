//! # Source-of-Truth Store
//!
//! `MemoryStore` is the reference `RecordStore`: one ordered table per record
//! kind behind a single `RwLock`. Exports go through the database blob format
//! so the durable tier only ever sees opaque bytes.

use crate::capability::RecordStore;
use crate::formats::{snapshot_from_bytes, snapshot_to_bytes};
use crate::{Entity, Folder, Note, Record, RecordCounts, RecordKind, Relationship, Snapshot};
use crate::StratumError;
use std::collections::BTreeMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

/// Per-kind tables keyed by record id.
#[derive(Debug, Default)]
struct Tables {
    notes: BTreeMap<String, Note>,
    folders: BTreeMap<String, Folder>,
    entities: BTreeMap<String, Entity>,
    relationships: BTreeMap<String, Relationship>,
}

impl Tables {
    fn insert(&mut self, record: Record) {
        match record {
            Record::Note(r) => {
                self.notes.insert(r.id.clone(), r);
            }
            Record::Folder(r) => {
                self.folders.insert(r.id.clone(), r);
            }
            Record::Entity(r) => {
                self.entities.insert(r.id.clone(), r);
            }
            Record::Relationship(r) => {
                self.relationships.insert(r.id.clone(), r);
            }
        }
    }

    fn get(&self, kind: RecordKind, id: &str) -> Option<Record> {
        match kind {
            RecordKind::Note => self.notes.get(id).cloned().map(Record::Note),
            RecordKind::Folder => self.folders.get(id).cloned().map(Record::Folder),
            RecordKind::Entity => self.entities.get(id).cloned().map(Record::Entity),
            RecordKind::Relationship => self
                .relationships
                .get(id)
                .cloned()
                .map(Record::Relationship),
        }
    }

    fn remove(&mut self, kind: RecordKind, id: &str) -> bool {
        match kind {
            RecordKind::Note => self.notes.remove(id).is_some(),
            RecordKind::Folder => self.folders.remove(id).is_some(),
            RecordKind::Entity => self.entities.remove(id).is_some(),
            RecordKind::Relationship => self.relationships.remove(id).is_some(),
        }
    }

    fn list(&self, kind: RecordKind) -> Vec<Record> {
        match kind {
            RecordKind::Note => self.notes.values().cloned().map(Record::Note).collect(),
            RecordKind::Folder => self.folders.values().cloned().map(Record::Folder).collect(),
            RecordKind::Entity => self.entities.values().cloned().map(Record::Entity).collect(),
            RecordKind::Relationship => self
                .relationships
                .values()
                .cloned()
                .map(Record::Relationship)
                .collect(),
        }
    }

    fn counts(&self) -> RecordCounts {
        RecordCounts {
            notes: self.notes.len(),
            folders: self.folders.len(),
            entities: self.entities.len(),
            relationships: self.relationships.len(),
        }
    }

    fn snapshot(&self) -> Snapshot {
        Snapshot {
            notes: self.notes.values().cloned().collect(),
            folders: self.folders.values().cloned().collect(),
            entities: self.entities.values().cloned().collect(),
            relationships: self.relationships.values().cloned().collect(),
        }
    }

    fn from_snapshot(snapshot: Snapshot) -> Self {
        let mut tables = Self::default();
        for record in snapshot.into_records() {
            tables.insert(record);
        }
        tables
    }
}

/// In-memory source of truth.
#[derive(Debug, Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
}

impl MemoryStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store pre-populated from a snapshot.
    #[must_use]
    pub fn with_snapshot(snapshot: Snapshot) -> Self {
        Self {
            tables: RwLock::new(Tables::from_snapshot(snapshot)),
        }
    }

    /// Copy of the full contents.
    pub fn snapshot(&self) -> Result<Snapshot, StratumError> {
        Ok(self.read()?.snapshot())
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, Tables>, StratumError> {
        self.tables
            .read()
            .map_err(|_| StratumError::LockPoisoned("memory store"))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, Tables>, StratumError> {
        self.tables
            .write()
            .map_err(|_| StratumError::LockPoisoned("memory store"))
    }
}

impl RecordStore for MemoryStore {
    fn ensure_ready(&self) -> Result<(), StratumError> {
        self.read().map(|_| ())
    }

    fn upsert(&self, record: Record) -> Result<(), StratumError> {
        self.write()?.insert(record);
        Ok(())
    }

    fn get(&self, kind: RecordKind, id: &str) -> Result<Option<Record>, StratumError> {
        Ok(self.read()?.get(kind, id))
    }

    fn delete(&self, kind: RecordKind, id: &str) -> Result<bool, StratumError> {
        Ok(self.write()?.remove(kind, id))
    }

    fn list(&self, kind: RecordKind) -> Result<Vec<Record>, StratumError> {
        Ok(self.read()?.list(kind))
    }

    fn export_database(&self) -> Result<Vec<u8>, StratumError> {
        let snapshot = self.read()?.snapshot();
        snapshot_to_bytes(&snapshot)
    }

    fn import_database(&self, bytes: &[u8]) -> Result<(), StratumError> {
        // Decode before taking the lock so a bad blob leaves contents untouched.
        let snapshot = snapshot_from_bytes(bytes)?;
        *self.write()? = Tables::from_snapshot(snapshot);
        Ok(())
    }

    fn count_notes(&self) -> Result<usize, StratumError> {
        Ok(self.read()?.notes.len())
    }

    fn counts(&self) -> Result<RecordCounts, StratumError> {
        Ok(self.read()?.counts())
    }
}

// =============================================================================
// TESTS
// =============================================================================
