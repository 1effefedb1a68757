//! Graph store abstraction.
//!
//! Defines the [`GraphStore`] trait that every backend must satisfy, plus the
//! Neo4j implementation and an in-process store used as a test double and for
//! offline runs. A store is an explicitly constructed value handed to each
//! component; nothing in the crate reaches for a global connection.

pub mod memory;
pub mod neo4j;

use std::collections::{BTreeMap, BTreeSet, VecDeque};

use serde::{Deserialize, Serialize};

use crate::edges::RelationshipType;
use crate::errors::Result;
use crate::ids::ItemId;
use crate::nodes::{EntityKind, NodeRow};

pub use memory::MemoryStore;
pub use neo4j::Neo4jStore;

/// A node as read back from the store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredNode {
    /// The store's native element identity.
    pub id: String,
    #[serde(rename = "label")]
    pub kind: EntityKind,
    pub properties: BTreeMap<String, String>,
}

impl StoredNode {
    pub fn property(&self, key: &str) -> Option<&str> {
        self.properties.get(key).map(String::as_str)
    }

    pub fn item_id(&self) -> Option<ItemId> {
        self.property("itemID").and_then(|s| s.parse().ok())
    }

    pub fn name(&self) -> &str {
        self.property("name").unwrap_or_default()
    }
}

/// A relationship as read back from the store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredLink {
    pub id: String,
    /// Native identity of the start node.
    pub start: String,
    /// Native identity of the end node.
    pub end: String,
    #[serde(rename = "type")]
    pub rel: RelationshipType,
    #[serde(default)]
    pub properties: BTreeMap<String, String>,
}

/// One matched row of a traversal: the non-null nodes and relationships bound
/// by the pattern.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TraversalRecord {
    pub nodes: Vec<StoredNode>,
    pub links: Vec<StoredLink>,
}

/// How a traversal's root node is looked up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SeedKey {
    ItemId(ItemId),
    /// Exact `name` match; may match several nodes.
    Name(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Seed {
    pub kind: EntityKind,
    pub key: SeedKey,
}

impl Seed {
    pub fn by_id(kind: EntityKind, id: ItemId) -> Self {
        Self {
            kind,
            key: SeedKey::ItemId(id),
        }
    }

    pub fn by_name(kind: EntityKind, name: impl Into<String>) -> Self {
        Self {
            kind,
            key: SeedKey::Name(name.into()),
        }
    }
}

/// One optional hop of a traversal: from an already bound entity type, along
/// `rel` (either direction), to a new entity type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TraversalStep {
    pub from: EntityKind,
    pub rel: RelationshipType,
    pub to: EntityKind,
}

/// The fixed-shape traversal for a root entity type: the relationship schema
/// laid out as a tree rooted at that type, in breadth-first order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TraversalShape {
    root: EntityKind,
    steps: Vec<TraversalStep>,
}

impl TraversalShape {
    pub fn rooted_at(root: EntityKind) -> Self {
        let mut seen = BTreeSet::from([root]);
        let mut queue = VecDeque::from([root]);
        let mut steps = Vec::new();
        while let Some(from) = queue.pop_front() {
            for (rel, to) in RelationshipType::incident(from) {
                if seen.insert(to) {
                    steps.push(TraversalStep { from, rel, to });
                    queue.push_back(to);
                }
            }
        }
        Self { root, steps }
    }

    pub fn root(&self) -> EntityKind {
        self.root
    }

    pub fn steps(&self) -> &[TraversalStep] {
        &self.steps
    }
}

/// A property overwrite for one existing node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PropertyUpdate {
    pub item_id: ItemId,
    pub properties: BTreeMap<String, String>,
}

/// Trait representing the graph store backend.
///
/// Writes merge nodes by `itemID` (attributes set on creation only) and
/// relationships by `(type, start, end)`. Each write call is atomic: either
/// all of `rows` are committed or none are.
#[allow(async_fn_in_trait)]
pub trait GraphStore: Send + Sync {
    /// Health check: verify connectivity to the store.
    async fn ping(&self) -> Result<()>;

    /// Merge nodes of one type. Returns the number of rows submitted.
    async fn write_nodes(&self, kind: EntityKind, rows: &[NodeRow]) -> Result<usize>;

    /// Merge relationships of one type between existing nodes, given as
    /// `(start itemID, end itemID)` in the type's write direction. Pairs whose
    /// endpoints do not exist are skipped. Returns the number of pairs merged,
    /// counting relationships that already existed.
    async fn write_relationships(
        &self,
        rel: RelationshipType,
        pairs: &[(ItemId, ItemId)],
    ) -> Result<usize>;

    /// Overwrite properties of existing nodes. Returns how many nodes matched.
    async fn update_properties(
        &self,
        kind: EntityKind,
        updates: &[PropertyUpdate],
    ) -> Result<usize>;

    /// All nodes of a type in store order, optionally capped.
    async fn nodes(&self, kind: EntityKind, limit: Option<usize>) -> Result<Vec<StoredNode>>;

    /// For every Dataset reachable from at least one Task through
    /// Artifact → Execution → Stage → Pipeline, the stored `modality` values of
    /// those Tasks.
    async fn task_modalities_by_dataset(&self) -> Result<Vec<(ItemId, Vec<String>)>>;

    /// Run the fixed-shape traversal from every node matching `seed`, returning
    /// at most `limit` records.
    async fn traverse(
        &self,
        shape: &TraversalShape,
        seed: &Seed,
        limit: usize,
    ) -> Result<Vec<TraversalRecord>>;
}
