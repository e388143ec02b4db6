//! # Graph Index
//!
//! The reference `GraphEngine`: an in-memory, read-optimized projection of
//! entities, relationships and folders.
//!
//! All data structures use `BTreeMap` for deterministic ordering. All
//! queries are computationally bounded by `MAX_TRAVERSAL_DEPTH`.

mod command;

pub use command::{DEFAULT_TRAVERSE_DEPTH, Mutation, Query};

use crate::capability::{GraphEngine, MutationResult, Params, QueryResult, Row};
use crate::{Entity, Folder, Relationship, StratumError, primitives};
use command::to_params;
use serde_json::Value;
use std::collections::{BTreeMap, BTreeSet, VecDeque};
use std::sync::RwLock;

// =============================================================================
// GRAPH STATE
// =============================================================================

/// Index contents.
#[derive(Debug, Default)]
struct Graph {
    entities: BTreeMap<String, Entity>,
    relationships: BTreeMap<String, Relationship>,
    /// Adjacency list: source entity -> outgoing relationship ids
    outgoing: BTreeMap<String, BTreeSet<String>>,
    folders: BTreeMap<String, Folder>,
}

impl Graph {
    fn apply(&mut self, mutation: Mutation) -> Result<(), StratumError> {
        match mutation {
            Mutation::PutEntity(entity) => {
                self.entities.insert(entity.id.clone(), entity);
            }
            Mutation::PutRelationship(rel) => {
                for endpoint in [&rel.source_id, &rel.target_id] {
                    if !self.entities.contains_key(endpoint) {
                        return Err(StratumError::RecordNotFound {
                            kind: crate::RecordKind::Entity,
                            id: endpoint.clone(),
                        });
                    }
                }
                // Replacing a relationship may move its source.
                self.unlink(&rel.id);
                self.outgoing
                    .entry(rel.source_id.clone())
                    .or_default()
                    .insert(rel.id.clone());
                self.relationships.insert(rel.id.clone(), rel);
            }
            Mutation::PutFolder(folder) => {
                self.folders.insert(folder.id.clone(), folder);
            }
            Mutation::RemoveEntity(id) => {
                self.entities.remove(&id);
                let incident: Vec<String> = self
                    .relationships
                    .values()
                    .filter(|r| r.source_id == id || r.target_id == id)
                    .map(|r| r.id.clone())
                    .collect();
                for rel_id in incident {
                    self.unlink(&rel_id);
                }
            }
            Mutation::RemoveRelationship(id) => self.unlink(&id),
            Mutation::RemoveFolder(id) => {
                self.folders.remove(&id);
            }
            Mutation::Clear => *self = Self::default(),
        }
        Ok(())
    }

    fn unlink(&mut self, rel_id: &str) {
        if let Some(old) = self.relationships.remove(rel_id)
            && let Some(ids) = self.outgoing.get_mut(&old.source_id)
        {
            ids.remove(rel_id);
            if ids.is_empty() {
                self.outgoing.remove(&old.source_id);
            }
        }
    }

    /// Outgoing relationships of an entity, ordered by relationship id.
    fn out_edges<'a>(&'a self, id: &str) -> impl Iterator<Item = &'a Relationship> + use<'a> {
        self.outgoing
            .get(id)
            .into_iter()
            .flatten()
            .filter_map(|rel_id| self.relationships.get(rel_id))
    }

    fn run(&self, query: &Query) -> Result<Vec<Row>, StratumError> {
        match query {
            Query::Entity(id) => self.entities.get(id).map(to_params).into_iter().collect(),
            Query::Entities { kind } => self
                .entities
                .values()
                .filter(|e| kind.as_ref().is_none_or(|k| &e.kind == k))
                .map(to_params)
                .collect(),
            Query::Relationships => self.relationships.values().map(to_params).collect(),
            Query::Neighbors(id) => Ok(self
                .out_edges(id)
                .map(|rel| {
                    row([
                        ("id", Value::from(rel.target_id.clone())),
                        ("relationship_id", Value::from(rel.id.clone())),
                        ("kind", Value::from(rel.kind.clone())),
                        ("weight", Value::from(rel.weight)),
                    ])
                })
                .collect()),
            Query::Traverse { start, depth } => Ok(self.traverse(start, *depth)),
            Query::Path { from, to } => Ok(self
                .strongest_path(from, to)
                .unwrap_or_default()
                .into_iter()
                .enumerate()
                .map(|(step, id)| row([("id", Value::from(id)), ("step", Value::from(step))]))
                .collect()),
            Query::Folder(id) => self.folders.get(id).map(to_params).into_iter().collect(),
            Query::Folders => self.folders.values().map(to_params).collect(),
            Query::Children { parent } => {
                let mut children: Vec<&Folder> = self
                    .folders
                    .values()
                    .filter(|f| f.parent_id == *parent)
                    .collect();
                children.sort_by(|a, b| a.position.cmp(&b.position).then(a.id.cmp(&b.id)));
                children.into_iter().map(to_params).collect()
            }
            Query::Stats => Ok(vec![row([
                ("entities", Value::from(self.entities.len())),
                ("relationships", Value::from(self.relationships.len())),
                ("folders", Value::from(self.folders.len())),
            ])]),
        }
    }

    /// Breadth-first traversal. Rows are `{id, depth}` in visit order.
    fn traverse(&self, start: &str, depth: usize) -> Vec<Row> {
        let depth = depth.min(primitives::MAX_TRAVERSAL_DEPTH);
        if !self.entities.contains_key(start) {
            return Vec::new();
        }

        let mut visited = BTreeSet::new();
        let mut queue = VecDeque::new();
        let mut rows = Vec::new();

        queue.push_back((start.to_string(), 0usize));
        visited.insert(start.to_string());

        while let Some((current, current_depth)) = queue.pop_front() {
            rows.push(row([
                ("id", Value::from(current.clone())),
                ("depth", Value::from(current_depth)),
            ]));

            if current_depth >= depth {
                continue;
            }

            for rel in self.out_edges(&current) {
                if visited.insert(rel.target_id.clone()) {
                    queue.push_back((rel.target_id.clone(), current_depth.saturating_add(1)));
                }
            }
        }

        rows
    }

    /// Strongest path between two entities.
    ///
    /// Dijkstra with edge cost = i64::MAX - weight, so fewer hops win first
    /// and heavier edges break ties. Costs accumulate in `u128`, which
    /// cannot overflow for any path through a map-sized graph.
    /// Parallel relationships between the same pair count with their heaviest
    /// weight.
    fn strongest_path(&self, start: &str, end: &str) -> Option<Vec<String>> {
        if !self.entities.contains_key(start) || !self.entities.contains_key(end) {
            return None;
        }
        if start == end {
            return Some(vec![start.to_string()]);
        }

        let mut dist: BTreeMap<&str, u128> = BTreeMap::new();
        let mut prev: BTreeMap<&str, &str> = BTreeMap::new();
        let mut visited: BTreeSet<&str> = BTreeSet::new();

        dist.insert(start, 0);

        loop {
            let current = dist
                .iter()
                .filter(|(n, _)| !visited.contains(*n))
                .min_by_key(|(_, d)| **d)
                .map(|(n, d)| (*n, *d));

            let Some((current, current_dist)) = current else {
                break;
            };
            if current == end {
                break;
            }
            visited.insert(current);

            for rel in self.out_edges(current) {
                let neighbor = rel.target_id.as_str();
                if visited.contains(neighbor) || !self.entities.contains_key(neighbor) {
                    continue;
                }

                // Negative weights clamp to 0 to keep costs non-negative.
                let edge_cost = u128::from(i64::MAX.abs_diff(rel.weight.max(0)));
                let new_dist = current_dist.saturating_add(edge_cost);

                if dist.get(neighbor).is_none_or(|&d| new_dist < d) {
                    dist.insert(neighbor, new_dist);
                    prev.insert(neighbor, current);
                }
            }
        }

        let mut path = vec![end.to_string()];
        let mut current = end;
        while current != start {
            current = *prev.get(current)?;
            path.push(current.to_string());
        }
        path.reverse();
        Some(path)
    }
}

fn row<const N: usize>(fields: [(&str, Value); N]) -> Row {
    fields
        .into_iter()
        .map(|(k, v)| (k.to_string(), v))
        .collect()
}

// =============================================================================
// GRAPH INDEX
// =============================================================================

/// In-memory graph engine driven by the command vocabulary in [`Mutation`]
/// and [`Query`].
#[derive(Debug, Default)]
pub struct GraphIndex {
    graph: RwLock<Graph>,
}

impl GraphIndex {
    /// Create an empty index.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply a typed mutation.
    pub fn apply(&self, mutation: Mutation) -> Result<(), StratumError> {
        self.graph
            .write()
            .map_err(|_| StratumError::LockPoisoned("graph index"))?
            .apply(mutation)
    }

    /// Run a typed query.
    pub fn query(&self, query: &Query) -> Result<Vec<Row>, StratumError> {
        self.graph
            .read()
            .map_err(|_| StratumError::LockPoisoned("graph index"))?
            .run(query)
    }
}

impl GraphEngine for GraphIndex {
    fn is_ready(&self) -> bool {
        true
    }

    fn run_query(&self, script: &str, params: &Params) -> QueryResult {
        match Query::parse(script, params).and_then(|q| self.query(&q)) {
            Ok(rows) => QueryResult::rows(rows),
            Err(e) => QueryResult::failed(e.to_string()),
        }
    }

    fn run_mutation(&self, script: &str, params: &Params) -> MutationResult {
        match Mutation::parse(script, params).and_then(|m| self.apply(m)) {
            Ok(()) => MutationResult::ok(),
            Err(e) => MutationResult::failed(e.to_string()),
        }
    }
}

// =============================================================================
// TESTS
// =============================================================================
