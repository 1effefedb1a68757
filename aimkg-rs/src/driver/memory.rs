//! In-process graph store.
//!
//! Same merge and traversal semantics as the Neo4j store, held in memory
//! behind a `tokio` lock. Used by the test suites and for offline runs; it can
//! be switched to "unavailable" to exercise store-failure paths.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::atomic::{AtomicBool, Ordering};

use tokio::sync::RwLock;

use crate::driver::{
    GraphStore, PropertyUpdate, Seed, SeedKey, StoredLink, StoredNode, TraversalRecord,
    TraversalShape, TraversalStep,
};
use crate::edges::RelationshipType;
use crate::errors::{AimkgError, Result};
use crate::ids::ItemId;
use crate::nodes::{EntityKind, NodeRow};

#[derive(Debug)]
struct MemNode {
    kind: EntityKind,
    properties: BTreeMap<String, String>,
}

#[derive(Debug)]
struct MemLink {
    rel: RelationshipType,
    start: usize,
    end: usize,
}

#[derive(Debug, Default)]
struct MemGraph {
    nodes: Vec<MemNode>,
    by_item: HashMap<(EntityKind, ItemId), usize>,
    links: Vec<MemLink>,
    link_keys: HashSet<(RelationshipType, usize, usize)>,
    /// node index → incident link indices
    adjacency: HashMap<usize, Vec<usize>>,
}

impl MemGraph {
    fn node_id(idx: usize) -> String {
        format!("mem:n:{idx}")
    }

    fn link_id(idx: usize) -> String {
        format!("mem:r:{idx}")
    }

    fn stored_node(&self, idx: usize) -> StoredNode {
        let node = &self.nodes[idx];
        StoredNode {
            id: Self::node_id(idx),
            kind: node.kind,
            properties: node.properties.clone(),
        }
    }

    fn stored_link(&self, idx: usize) -> StoredLink {
        let link = &self.links[idx];
        StoredLink {
            id: Self::link_id(idx),
            start: Self::node_id(link.start),
            end: Self::node_id(link.end),
            rel: link.rel,
            properties: BTreeMap::new(),
        }
    }

    /// `(link, neighbour)` pairs of `node` along `rel` to nodes of `kind`,
    /// ignoring direction.
    fn neighbours(
        &self,
        node: usize,
        rel: RelationshipType,
        kind: EntityKind,
    ) -> Vec<(usize, usize)> {
        self.adjacency
            .get(&node)
            .into_iter()
            .flatten()
            .filter_map(|&li| {
                let link = &self.links[li];
                if link.rel != rel {
                    return None;
                }
                let other = if link.start == node { link.end } else { link.start };
                (self.nodes[other].kind == kind).then_some((li, other))
            })
            .collect()
    }

    /// Bind the remaining `steps` depth-first, pushing each complete row to
    /// `out`. Each step behaves like an OPTIONAL MATCH: a row fans out into
    /// one row per match, or continues with nulls when nothing matches. Rows
    /// come out in the order step-by-step matching would produce them, and
    /// nothing is expanded once `out` holds `limit` rows.
    fn expand(
        &self,
        steps: &[TraversalStep],
        row: &mut Binding,
        limit: usize,
        out: &mut Vec<Binding>,
    ) {
        if out.len() >= limit {
            return;
        }
        let Some((step, rest)) = steps.split_first() else {
            out.push(row.clone());
            return;
        };
        let matches = row
            .nodes
            .get(&step.from)
            .copied()
            .flatten()
            .map(|n| self.neighbours(n, step.rel, step.to))
            .unwrap_or_default();
        if matches.is_empty() {
            row.nodes.insert(step.to, None);
            row.links.push(None);
            self.expand(rest, row, limit, out);
            row.links.pop();
        }
        for (link, other) in matches {
            if out.len() >= limit {
                break;
            }
            row.nodes.insert(step.to, Some(other));
            row.links.push(Some(link));
            self.expand(rest, row, limit, out);
            row.links.pop();
        }
        row.nodes.remove(&step.to);
    }

    fn seeds(&self, seed: &Seed) -> Vec<usize> {
        match &seed.key {
            SeedKey::ItemId(id) => self.by_item.get(&(seed.kind, *id)).copied().into_iter().collect(),
            SeedKey::Name(name) => (0..self.nodes.len())
                .filter(|&i| {
                    let n = &self.nodes[i];
                    n.kind == seed.kind && n.properties.get("name") == Some(name)
                })
                .collect(),
        }
    }
}

/// Bindings of one traversal row: node index per bound kind, link index per
/// step (`None` where the optional hop found nothing).
#[derive(Clone)]
struct Binding {
    nodes: HashMap<EntityKind, Option<usize>>,
    links: Vec<Option<usize>>,
}

#[derive(Debug, Default)]
pub struct MemoryStore {
    graph: RwLock<MemGraph>,
    unavailable: AtomicBool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent call fail with a store error (or succeed again).
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    fn check(&self) -> Result<()> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(AimkgError::Store("in-memory store marked unavailable".into()));
        }
        Ok(())
    }

    pub async fn node_count(&self, kind: EntityKind) -> usize {
        self.graph
            .read()
            .await
            .nodes
            .iter()
            .filter(|n| n.kind == kind)
            .count()
    }

    pub async fn link_count(&self, rel: RelationshipType) -> usize {
        self.graph
            .read()
            .await
            .links
            .iter()
            .filter(|l| l.rel == rel)
            .count()
    }
}

impl GraphStore for MemoryStore {
    async fn ping(&self) -> Result<()> {
        self.check()
    }

    async fn write_nodes(&self, kind: EntityKind, rows: &[NodeRow]) -> Result<usize> {
        self.check()?;
        // Validate everything before touching the graph so a bad batch
        // leaves no partial writes.
        let mut keyed = Vec::with_capacity(rows.len());
        for row in rows {
            if row.kind != kind {
                return Err(AimkgError::Validation(format!(
                    "{} row in a {kind} batch",
                    row.kind
                )));
            }
            keyed.push((row.item_id()?, row));
        }
        let mut graph = self.graph.write().await;
        for (id, row) in keyed {
            if graph.by_item.contains_key(&(kind, id)) {
                continue;
            }
            let idx = graph.nodes.len();
            graph.nodes.push(MemNode {
                kind,
                properties: row
                    .properties()
                    .map(|(k, v)| (k.to_string(), v.to_string()))
                    .collect(),
            });
            graph.by_item.insert((kind, id), idx);
        }
        Ok(rows.len())
    }

    async fn write_relationships(
        &self,
        rel: RelationshipType,
        pairs: &[(ItemId, ItemId)],
    ) -> Result<usize> {
        self.check()?;
        let (from_kind, to_kind) = rel.endpoints();
        let mut graph = self.graph.write().await;
        let mut merged = 0;
        for (from, to) in pairs {
            let (Some(&start), Some(&end)) = (
                graph.by_item.get(&(from_kind, *from)),
                graph.by_item.get(&(to_kind, *to)),
            ) else {
                continue;
            };
            merged += 1;
            if !graph.link_keys.insert((rel, start, end)) {
                continue;
            }
            let idx = graph.links.len();
            graph.links.push(MemLink { rel, start, end });
            graph.adjacency.entry(start).or_default().push(idx);
            graph.adjacency.entry(end).or_default().push(idx);
        }
        Ok(merged)
    }

    async fn update_properties(
        &self,
        kind: EntityKind,
        updates: &[PropertyUpdate],
    ) -> Result<usize> {
        self.check()?;
        let mut graph = self.graph.write().await;
        let mut matched = 0;
        for update in updates {
            let Some(&idx) = graph.by_item.get(&(kind, update.item_id)) else {
                continue;
            };
            graph.nodes[idx]
                .properties
                .extend(update.properties.iter().map(|(k, v)| (k.clone(), v.clone())));
            matched += 1;
        }
        Ok(matched)
    }

    async fn nodes(&self, kind: EntityKind, limit: Option<usize>) -> Result<Vec<StoredNode>> {
        self.check()?;
        let graph = self.graph.read().await;
        Ok((0..graph.nodes.len())
            .filter(|&i| graph.nodes[i].kind == kind)
            .take(limit.unwrap_or(usize::MAX))
            .map(|i| graph.stored_node(i))
            .collect())
    }

    async fn task_modalities_by_dataset(&self) -> Result<Vec<(ItemId, Vec<String>)>> {
        use EntityKind::*;
        self.check()?;
        let graph = self.graph.read().await;
        let path = [
            (RelationshipType::UsesDataset, Artifact),
            (RelationshipType::HasArtifact, Execution),
            (RelationshipType::HasExecution, Stage),
            (RelationshipType::HasStage, Pipeline),
            (RelationshipType::HasTask, Task),
        ];
        let mut out = Vec::new();
        for (&(kind, id), &start) in graph.by_item.iter() {
            if kind != Dataset {
                continue;
            }
            let mut frontier = vec![start];
            for (rel, next_kind) in path {
                let mut next: Vec<usize> = frontier
                    .iter()
                    .flat_map(|&n| graph.neighbours(n, rel, next_kind))
                    .map(|(_, other)| other)
                    .collect();
                next.sort_unstable();
                next.dedup();
                frontier = next;
            }
            if frontier.is_empty() {
                continue;
            }
            let mut modalities: Vec<String> = frontier
                .iter()
                .filter_map(|&t| graph.nodes[t].properties.get("modality").cloned())
                .collect();
            modalities.sort();
            modalities.dedup();
            out.push((id, modalities));
        }
        out.sort_by_key(|(id, _)| *id);
        Ok(out)
    }

    async fn traverse(
        &self,
        shape: &TraversalShape,
        seed: &Seed,
        limit: usize,
    ) -> Result<Vec<TraversalRecord>> {
        self.check()?;
        let graph = self.graph.read().await;
        let mut rows = Vec::new();
        for idx in graph.seeds(seed) {
            if rows.len() >= limit {
                break;
            }
            let mut row = Binding {
                nodes: HashMap::from([(shape.root(), Some(idx))]),
                links: Vec::new(),
            };
            graph.expand(shape.steps(), &mut row, limit, &mut rows);
        }

        let node_order: Vec<EntityKind> = std::iter::once(shape.root())
            .chain(shape.steps().iter().map(|s| s.to))
            .collect();
        Ok(rows
            .into_iter()
            .map(|row| TraversalRecord {
                nodes: node_order
                    .iter()
                    .filter_map(|k| row.nodes.get(k).copied().flatten())
                    .map(|i| graph.stored_node(i))
                    .collect(),
                links: row.links.iter().flatten().map(|&l| graph.stored_link(l)).collect(),
            })
            .collect())
    }
}
