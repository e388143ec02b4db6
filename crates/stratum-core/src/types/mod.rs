//! # Core Type Definitions
//!
//! This module contains the record types shared by every storage tier:
//! - Source-of-truth records (`Note`, `Folder`, `Entity`, `Relationship`)
//! - The tagged union over them (`Record`, `RecordKind`)
//! - Whole-database views (`Snapshot`, `RecordCounts`)
//! - Error types (`StratumError`)
//!
//! ## Determinism Guarantees
//!
//! - Record identifiers are plain strings compared byte-wise
//! - Collections are ordered (`BTreeMap`) wherever order is observable
//! - Timestamps are integer milliseconds since the Unix epoch

use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::{SystemTime, UNIX_EPOCH};
use thiserror::Error;

// =============================================================================
// TIME
// =============================================================================

/// Current wall-clock time in milliseconds since the Unix epoch.
///
/// Returns 0 if the system clock reports a time before the epoch.
#[must_use]
pub fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

// =============================================================================
// RECORD KIND
// =============================================================================

/// The kinds of record that have a durable representation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordKind {
    Note,
    Folder,
    Entity,
    Relationship,
}

impl RecordKind {
    /// All kinds in canonical order.
    pub const ALL: [RecordKind; 4] = [
        RecordKind::Note,
        RecordKind::Folder,
        RecordKind::Entity,
        RecordKind::Relationship,
    ];

    /// Stable lowercase name, used for table names and log fields.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            RecordKind::Note => "note",
            RecordKind::Folder => "folder",
            RecordKind::Entity => "entity",
            RecordKind::Relationship => "relationship",
        }
    }

    /// Whether the graph engine is the read path for this kind.
    ///
    /// Folders live in the graph engine with their full hierarchy; every
    /// other kind is read straight from the source of truth.
    #[must_use]
    pub const fn is_graph_authoritative(self) -> bool {
        matches!(self, RecordKind::Folder)
    }

    /// Whether the graph engine holds a derived projection of this kind.
    #[must_use]
    pub const fn is_graph_derived(self) -> bool {
        matches!(self, RecordKind::Entity | RecordKind::Relationship)
    }
}

impl fmt::Display for RecordKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// RECORDS
// =============================================================================

/// A note: the primary user document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Note {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub folder_id: Option<String>,
    #[serde(default)]
    pub created_at: u64,
    #[serde(default)]
    pub updated_at: u64,
}

impl Note {
    /// Create a note stamped with the current time.
    #[must_use]
    pub fn new(id: impl Into<String>, title: impl Into<String>, content: impl Into<String>) -> Self {
        let now = now_millis();
        Self {
            id: id.into(),
            title: title.into(),
            content: content.into(),
            folder_id: None,
            created_at: now,
            updated_at: now,
        }
    }
}

/// A folder: hierarchical container for notes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Folder {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub parent_id: Option<String>,
    #[serde(default)]
    pub position: i64,
}

impl Folder {
    /// Create a folder.
    #[must_use]
    pub fn new(id: impl Into<String>, name: impl Into<String>, parent_id: Option<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            parent_id,
            position: 0,
        }
    }
}

/// An entity extracted from notes (person, place, concept...).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entity {
    pub id: String,
    pub name: String,
    pub kind: String,
    #[serde(default)]
    pub note_id: Option<String>,
    #[serde(default)]
    pub aliases: Vec<String>,
}

impl Entity {
    /// Create an entity with no source note and no aliases.
    #[must_use]
    pub fn new(id: impl Into<String>, name: impl Into<String>, kind: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            kind: kind.into(),
            note_id: None,
            aliases: Vec::new(),
        }
    }
}

/// A directed, weighted relationship between two entities.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Relationship {
    pub id: String,
    pub source_id: String,
    pub target_id: String,
    pub kind: String,
    #[serde(default = "default_weight")]
    pub weight: i64,
}

fn default_weight() -> i64 {
    1
}

impl Relationship {
    /// Create a relationship with weight 1.
    #[must_use]
    pub fn new(
        id: impl Into<String>,
        source_id: impl Into<String>,
        target_id: impl Into<String>,
        kind: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            source_id: source_id.into(),
            target_id: target_id.into(),
            kind: kind.into(),
            weight: default_weight(),
        }
    }
}

// =============================================================================
// RECORD UNION
// =============================================================================

/// Any record with a durable representation.
///
/// Externally tagged so the same value encodes with both postcard and JSON.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Record {
    Note(Note),
    Folder(Folder),
    Entity(Entity),
    Relationship(Relationship),
}

impl Record {
    /// The kind of this record.
    #[must_use]
    pub fn kind(&self) -> RecordKind {
        match self {
            Record::Note(_) => RecordKind::Note,
            Record::Folder(_) => RecordKind::Folder,
            Record::Entity(_) => RecordKind::Entity,
            Record::Relationship(_) => RecordKind::Relationship,
        }
    }

    /// The identifier of this record.
    #[must_use]
    pub fn id(&self) -> &str {
        match self {
            Record::Note(r) => &r.id,
            Record::Folder(r) => &r.id,
            Record::Entity(r) => &r.id,
            Record::Relationship(r) => &r.id,
        }
    }
}

macro_rules! record_conversions {
    ($($variant:ident),* $(,)?) => {
        $(
            impl From<$variant> for Record {
                fn from(record: $variant) -> Self {
                    Record::$variant(record)
                }
            }

            impl TryFrom<Record> for $variant {
                type Error = StratumError;

                fn try_from(record: Record) -> Result<Self, Self::Error> {
                    match record {
                        Record::$variant(inner) => Ok(inner),
                        other => Err(StratumError::KindMismatch {
                            expected: RecordKind::$variant,
                            found: other.kind(),
                        }),
                    }
                }
            }
        )*
    };
}

record_conversions!(Note, Folder, Entity, Relationship);

// =============================================================================
// WHOLE-DATABASE VIEWS
// =============================================================================

/// Per-kind record counts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordCounts {
    pub notes: usize,
    pub folders: usize,
    pub entities: usize,
    pub relationships: usize,
}

impl RecordCounts {
    /// Total number of records across all kinds.
    #[must_use]
    pub fn total(&self) -> usize {
        self.notes
            .saturating_add(self.folders)
            .saturating_add(self.entities)
            .saturating_add(self.relationships)
    }
}

/// A full copy of every record, in id order per kind.
///
/// This is the payload of the durable database blob and of the boot-cache
/// preload.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot {
    pub notes: Vec<Note>,
    pub folders: Vec<Folder>,
    pub entities: Vec<Entity>,
    pub relationships: Vec<Relationship>,
}

impl Snapshot {
    /// Record counts for this snapshot.
    #[must_use]
    pub fn counts(&self) -> RecordCounts {
        RecordCounts {
            notes: self.notes.len(),
            folders: self.folders.len(),
            entities: self.entities.len(),
            relationships: self.relationships.len(),
        }
    }

    /// Whether the snapshot holds no records at all.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.counts().total() == 0
    }

    /// Flatten into records, notes first.
    #[must_use]
    pub fn into_records(self) -> Vec<Record> {
        let mut records = Vec::with_capacity(self.counts().total());
        records.extend(self.notes.into_iter().map(Record::Note));
        records.extend(self.folders.into_iter().map(Record::Folder));
        records.extend(self.entities.into_iter().map(Record::Entity));
        records.extend(self.relationships.into_iter().map(Record::Relationship));
        records
    }
}

// =============================================================================
// ERRORS
// =============================================================================

/// Errors raised by storage capabilities and the coordinator.
#[derive(Debug, Error)]
pub enum StratumError {
    /// A capability is not ready to serve requests.
    #[error("Not ready: {0}")]
    NotReady(String),

    /// A record was not found.
    #[error("{kind} not found: {id}")]
    RecordNotFound { kind: RecordKind, id: String },

    /// A record of one kind was used where another kind was expected.
    #[error("Record kind mismatch: expected {expected}, found {found}")]
    KindMismatch {
        expected: RecordKind,
        found: RecordKind,
    },

    /// A graph script or its parameters could not be understood.
    #[error("Invalid command: {0}")]
    InvalidCommand(String),

    /// A durable path escaped its root or was otherwise malformed.
    #[error("Invalid path: {0}")]
    InvalidPath(String),

    /// A serialization error occurred.
    #[error("Serialization error: {0}")]
    SerializationError(String),

    /// A deserialization error occurred.
    #[error("Deserialization error: {0}")]
    DeserializationError(String),

    /// An I/O error occurred.
    #[error("I/O error: {0}")]
    IoError(String),

    /// The embedded database reported an error.
    #[error("Storage error: {0}")]
    StorageError(String),

    /// A lock guarding in-memory state was poisoned by a panicking holder.
    #[error("Lock poisoned: {0}")]
    LockPoisoned(&'static str),

    /// Configuration could not be loaded or is invalid.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Startup could not complete.
    #[error("Initialization failed: {0}")]
    Initialization(String),
}

// =============================================================================
// TESTS
// =============================================================================
