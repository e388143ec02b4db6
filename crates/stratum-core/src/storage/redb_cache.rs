//! # redb-backed Boot Cache
//!
//! A fast, record-level cache using the redb embedded database. One table
//! per record kind, keyed by record id, values postcard-encoded `Record`s.
//!
//! The cache is never authoritative: the coordinator reads it only when
//! neither the in-memory store nor the durable blob has anything to offer,
//! and every write to it is best effort.

use crate::capability::BootCache;
use crate::{Record, RecordKind, Snapshot, StratumError};
use redb::{Database, ReadableDatabase, ReadableTable, ReadableTableMetadata, TableDefinition};
use std::path::Path;

const NOTES: TableDefinition<&str, &[u8]> = TableDefinition::new("boot_notes");
const FOLDERS: TableDefinition<&str, &[u8]> = TableDefinition::new("boot_folders");
const ENTITIES: TableDefinition<&str, &[u8]> = TableDefinition::new("boot_entities");
const RELATIONSHIPS: TableDefinition<&str, &[u8]> = TableDefinition::new("boot_relationships");

fn table_for(kind: RecordKind) -> TableDefinition<'static, &'static str, &'static [u8]> {
    match kind {
        RecordKind::Note => NOTES,
        RecordKind::Folder => FOLDERS,
        RecordKind::Entity => ENTITIES,
        RecordKind::Relationship => RELATIONSHIPS,
    }
}

fn storage_err(e: impl std::fmt::Display) -> StratumError {
    StratumError::StorageError(e.to_string())
}

/// Boot cache persisted in a redb database file.
pub struct RedbBootCache {
    db: Database,
}

impl std::fmt::Debug for RedbBootCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedbBootCache").finish_non_exhaustive()
    }
}

impl RedbBootCache {
    /// Open or create a boot cache at the given path.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StratumError> {
        let db = Database::create(path.as_ref()).map_err(storage_err)?;

        // Initialize tables if they don't exist
        {
            let write_txn = db.begin_write().map_err(storage_err)?;
            for kind in RecordKind::ALL {
                let _ = write_txn.open_table(table_for(kind)).map_err(storage_err)?;
            }
            write_txn.commit().map_err(storage_err)?;
        }

        Ok(Self { db })
    }

    /// Number of cached records of one kind.
    pub fn len(&self, kind: RecordKind) -> Result<usize, StratumError> {
        let read_txn = self.db.begin_read().map_err(storage_err)?;
        let table = read_txn.open_table(table_for(kind)).map_err(storage_err)?;
        Ok(table.len().map_err(storage_err)? as usize)
    }

    fn load_kind(&self, kind: RecordKind) -> Result<Vec<Record>, StratumError> {
        let read_txn = self.db.begin_read().map_err(storage_err)?;
        let table = read_txn.open_table(table_for(kind)).map_err(storage_err)?;

        let mut records = Vec::new();
        for entry in table.iter().map_err(storage_err)? {
            let (_, value) = entry.map_err(storage_err)?;
            let record: Record = postcard::from_bytes(value.value())
                .map_err(|e| StratumError::DeserializationError(e.to_string()))?;
            records.push(record);
        }
        Ok(records)
    }
}

impl BootCache for RedbBootCache {
    fn put(&self, record: &Record) -> Result<(), StratumError> {
        let bytes = postcard::to_allocvec(record)
            .map_err(|e| StratumError::SerializationError(e.to_string()))?;

        let write_txn = self.db.begin_write().map_err(storage_err)?;
        {
            let mut table = write_txn
                .open_table(table_for(record.kind()))
                .map_err(storage_err)?;
            table
                .insert(record.id(), bytes.as_slice())
                .map_err(storage_err)?;
        }
        write_txn.commit().map_err(storage_err)
    }

    fn delete(&self, kind: RecordKind, id: &str) -> Result<(), StratumError> {
        let write_txn = self.db.begin_write().map_err(storage_err)?;
        {
            let mut table = write_txn.open_table(table_for(kind)).map_err(storage_err)?;
            table.remove(id).map_err(storage_err)?;
        }
        write_txn.commit().map_err(storage_err)
    }

    fn preload(&self) -> Result<Option<Snapshot>, StratumError> {
        let mut snapshot = Snapshot::default();
        for kind in RecordKind::ALL {
            for record in self.load_kind(kind)? {
                match record {
                    Record::Note(r) => snapshot.notes.push(r),
                    Record::Folder(r) => snapshot.folders.push(r),
                    Record::Entity(r) => snapshot.entities.push(r),
                    Record::Relationship(r) => snapshot.relationships.push(r),
                }
            }
        }

        if snapshot.is_empty() {
            Ok(None)
        } else {
            Ok(Some(snapshot))
        }
    }
}

// =============================================================================
// TESTS
// =============================================================================
