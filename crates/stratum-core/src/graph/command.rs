//! # Graph Commands
//!
//! The fixed command vocabulary understood by `GraphIndex`.
//!
//! A script is a single command name; its arguments travel in the params
//! map. Parsing is strict: unknown names and missing arguments are errors,
//! nothing is guessed.

use crate::capability::Params;
use crate::{Entity, Folder, Relationship, StratumError, primitives};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

/// Default traversal depth when a `traverse` query names none.
pub const DEFAULT_TRAVERSE_DEPTH: usize = 3;

// =============================================================================
// MUTATIONS
// =============================================================================

/// Write commands.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mutation {
    PutEntity(Entity),
    PutRelationship(Relationship),
    PutFolder(Folder),
    RemoveEntity(String),
    RemoveRelationship(String),
    RemoveFolder(String),
    Clear,
}

impl Mutation {
    /// Parse a mutation script with its params.
    pub fn parse(script: &str, params: &Params) -> Result<Self, StratumError> {
        match script.trim() {
            "put_entity" => Ok(Self::PutEntity(record_from(params)?)),
            "put_relationship" => Ok(Self::PutRelationship(record_from(params)?)),
            "put_folder" => Ok(Self::PutFolder(record_from(params)?)),
            "remove_entity" => Ok(Self::RemoveEntity(required_str(params, "id")?)),
            "remove_relationship" => Ok(Self::RemoveRelationship(required_str(params, "id")?)),
            "remove_folder" => Ok(Self::RemoveFolder(required_str(params, "id")?)),
            "clear" => Ok(Self::Clear),
            other => Err(unknown(other)),
        }
    }

    /// The script name of this mutation.
    #[must_use]
    pub fn script(&self) -> &'static str {
        match self {
            Self::PutEntity(_) => "put_entity",
            Self::PutRelationship(_) => "put_relationship",
            Self::PutFolder(_) => "put_folder",
            Self::RemoveEntity(_) => "remove_entity",
            Self::RemoveRelationship(_) => "remove_relationship",
            Self::RemoveFolder(_) => "remove_folder",
            Self::Clear => "clear",
        }
    }

    /// The params map that `parse` accepts back for this mutation.
    pub fn params(&self) -> Result<Params, StratumError> {
        match self {
            Self::PutEntity(r) => to_params(r),
            Self::PutRelationship(r) => to_params(r),
            Self::PutFolder(r) => to_params(r),
            Self::RemoveEntity(id) | Self::RemoveRelationship(id) | Self::RemoveFolder(id) => {
                Ok(id_params(id))
            }
            Self::Clear => Ok(Params::new()),
        }
    }
}

// =============================================================================
// QUERIES
// =============================================================================

/// Read commands.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Query {
    /// One entity by id.
    Entity(String),
    /// All entities, optionally of one kind.
    Entities { kind: Option<String> },
    /// All relationships.
    Relationships,
    /// Outgoing relationships of an entity.
    Neighbors(String),
    /// Breadth-first reachability from an entity.
    Traverse { start: String, depth: usize },
    /// Strongest path between two entities.
    Path { from: String, to: String },
    /// One folder by id.
    Folder(String),
    /// All folders.
    Folders,
    /// Child folders of a parent, or root folders.
    Children { parent: Option<String> },
    /// Node, edge and folder counts.
    Stats,
}

impl Query {
    /// Parse a query script with its params.
    pub fn parse(script: &str, params: &Params) -> Result<Self, StratumError> {
        match script.trim() {
            "entity" => Ok(Self::Entity(required_str(params, "id")?)),
            "entities" => Ok(Self::Entities {
                kind: optional_str(params, "kind")?,
            }),
            "relationships" => Ok(Self::Relationships),
            "neighbors" => Ok(Self::Neighbors(required_str(params, "id")?)),
            "traverse" => {
                let depth = optional_usize(params, "depth")?.unwrap_or(DEFAULT_TRAVERSE_DEPTH);
                Ok(Self::Traverse {
                    start: required_str(params, "id")?,
                    depth: depth.min(primitives::MAX_TRAVERSAL_DEPTH),
                })
            }
            "path" => Ok(Self::Path {
                from: required_str(params, "from")?,
                to: required_str(params, "to")?,
            }),
            "folder" => Ok(Self::Folder(required_str(params, "id")?)),
            "folders" => Ok(Self::Folders),
            "children" => Ok(Self::Children {
                parent: optional_str(params, "parent_id")?,
            }),
            "stats" => Ok(Self::Stats),
            other => Err(unknown(other)),
        }
    }
}

// =============================================================================
// PARAM HELPERS
// =============================================================================

fn unknown(script: &str) -> StratumError {
    StratumError::InvalidCommand(format!("unknown command '{}'", script))
}

fn required_str(params: &Params, key: &str) -> Result<String, StratumError> {
    optional_str(params, key)?
        .ok_or_else(|| StratumError::InvalidCommand(format!("missing parameter '{}'", key)))
}

fn optional_str(params: &Params, key: &str) -> Result<Option<String>, StratumError> {
    match params.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => Ok(Some(s.clone())),
        Some(_) => Err(StratumError::InvalidCommand(format!(
            "parameter '{}' must be a string",
            key
        ))),
    }
}

fn optional_usize(params: &Params, key: &str) -> Result<Option<usize>, StratumError> {
    match params.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(value) => value
            .as_u64()
            .and_then(|n| usize::try_from(n).ok())
            .map(Some)
            .ok_or_else(|| {
                StratumError::InvalidCommand(format!(
                    "parameter '{}' must be a non-negative integer",
                    key
                ))
            }),
    }
}

fn record_from<T: DeserializeOwned>(params: &Params) -> Result<T, StratumError> {
    serde_json::from_value(Value::Object(params.clone()))
        .map_err(|e| StratumError::InvalidCommand(e.to_string()))
}

/// Serialize a value into a params map or row.
pub(crate) fn to_params<T: Serialize>(value: &T) -> Result<Params, StratumError> {
    match serde_json::to_value(value) {
        Ok(Value::Object(map)) => Ok(map),
        Ok(_) => Err(StratumError::SerializationError(
            "expected a JSON object".to_string(),
        )),
        Err(e) => Err(StratumError::SerializationError(e.to_string())),
    }
}

fn id_params(id: &str) -> Params {
    let mut params = Params::new();
    params.insert("id".to_string(), Value::String(id.to_string()));
    params
}

// =============================================================================
// TESTS
// =============================================================================
