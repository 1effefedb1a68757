//! Neo4j graph store implementation.
//!
//! Uses `neo4rs` 0.8 for async, pooled Bolt connections. Writes are batched
//! with `UNWIND` and run one transaction per call; reads project nodes and
//! relationships into plain maps that deserialize into small projection
//! structs before becoming [`StoredNode`] / [`StoredLink`].

use std::collections::BTreeMap;

use neo4rs::{query, BoltList, BoltMap, BoltString, BoltType, ConfigBuilder, Graph, Query};
use serde::Deserialize;
use tracing::{debug, info};

use crate::driver::{
    GraphStore, PropertyUpdate, Seed, SeedKey, StoredLink, StoredNode, TraversalRecord,
    TraversalShape,
};
use crate::edges::RelationshipType;
use crate::errors::{AimkgError, Result};
use crate::ids::ItemId;
use crate::nodes::{EntityKind, NodeRow};
use crate::types::AimkgConfig;

/// Rows per `UNWIND` batch.
const WRITE_CHUNK: usize = 1000;

const NODE_PROJECTION: &str = "{id: elementId(x), label: labels(x)[0], properties: properties(x)}";
const LINK_PROJECTION: &str = "{id: elementId(r), start: elementId(startNode(r)), \
     end: elementId(endNode(r)), type: type(r), properties: properties(r)}";

/// Row shape of [`NODE_PROJECTION`]; labels and types arrive as plain strings.
#[derive(Debug, Deserialize)]
struct NodeProjection {
    id: String,
    label: String,
    #[serde(default)]
    properties: BTreeMap<String, String>,
}

impl NodeProjection {
    fn into_stored(self) -> Result<StoredNode> {
        Ok(StoredNode {
            id: self.id,
            kind: self.label.parse()?,
            properties: self.properties,
        })
    }
}

#[derive(Debug, Deserialize)]
struct LinkProjection {
    id: String,
    start: String,
    end: String,
    #[serde(rename = "type")]
    rel: String,
    #[serde(default)]
    properties: BTreeMap<String, String>,
}

impl LinkProjection {
    fn into_stored(self) -> Result<StoredLink> {
        Ok(StoredLink {
            id: self.id,
            start: self.start,
            end: self.end,
            rel: self.rel.parse()?,
            properties: self.properties,
        })
    }
}

pub struct Neo4jStore {
    graph: Graph,
}

impl Neo4jStore {
    pub async fn connect(config: &AimkgConfig) -> Result<Self> {
        let mut builder = ConfigBuilder::default()
            .uri(config.neo4j_uri.as_str())
            .user(config.neo4j_user.as_str())
            .password(config.neo4j_password.as_str());
        if let Some(db) = config.neo4j_database.as_deref() {
            builder = builder.db(db);
        }
        let graph = Graph::connect(builder.build()?).await?;
        info!(uri = %config.neo4j_uri, "connected to neo4j");
        Ok(Self { graph })
    }

    pub fn from_graph(graph: Graph) -> Self {
        Self { graph }
    }

    /// Run write queries in one transaction; nothing is committed if any fails.
    async fn run_in_txn(&self, queries: Vec<Query>) -> Result<()> {
        let mut txn = self.graph.start_txn().await?;
        for q in queries {
            if let Err(e) = txn.run(q).await {
                // Dropping an uncommitted transaction rolls it back; do it
                // explicitly so the error surfaced is the query's.
                let _ = txn.rollback().await;
                return Err(e.into());
            }
        }
        txn.commit().await?;
        Ok(())
    }

    /// Run `queries` in one transaction and sum the integer `column` over
    /// every returned row.
    async fn count_in_txn(&self, queries: Vec<Query>, column: &str) -> Result<usize> {
        let mut txn = self.graph.start_txn().await?;
        let mut total = 0usize;
        for q in queries {
            let mut stream = match txn.execute(q).await {
                Ok(stream) => stream,
                Err(e) => {
                    let _ = txn.rollback().await;
                    return Err(e.into());
                }
            };
            while let Some(row) = stream.next(txn.handle()).await? {
                total += row.get::<i64>(column)?.max(0) as usize;
            }
        }
        txn.commit().await?;
        Ok(total)
    }

    async fn fetch_nodes(&self, q: Query, column: &str) -> Result<Vec<StoredNode>> {
        let mut stream = self.graph.execute(q).await?;
        let mut out = Vec::new();
        while let Some(row) = stream.next().await? {
            out.push(row.get::<NodeProjection>(column)?.into_stored()?);
        }
        Ok(out)
    }
}

fn bolt_str(s: &str) -> BoltType {
    BoltType::String(BoltString::from(s))
}

fn bolt_map<K, V>(pairs: impl IntoIterator<Item = (K, V)>) -> BoltType
where
    K: AsRef<str>,
    V: AsRef<str>,
{
    let mut map = BoltMap::new();
    for (k, v) in pairs {
        map.put(BoltString::from(k.as_ref()), bolt_str(v.as_ref()));
    }
    BoltType::Map(map)
}

fn bolt_list(items: impl IntoIterator<Item = BoltType>) -> BoltType {
    let mut list = BoltList::new();
    for item in items {
        list.push(item);
    }
    BoltType::List(list)
}

pub(crate) fn merge_nodes_cypher(kind: EntityKind) -> String {
    format!(
        "UNWIND $rows AS row \
         MERGE (n:{label} {{itemID: row.itemID}}) \
         ON CREATE SET n += row",
        label = kind.label()
    )
}

pub(crate) fn merge_relationships_cypher(rel: RelationshipType) -> String {
    let (from, to) = rel.endpoints();
    format!(
        "UNWIND $pairs AS pair \
         MATCH (a:{from} {{itemID: pair.start}}) \
         MATCH (b:{to} {{itemID: pair.end}}) \
         MERGE (a)-[:{rel}]->(b) \
         RETURN count(*) AS merged",
        from = from.label(),
        to = to.label(),
        rel = rel.as_str()
    )
}

pub(crate) fn update_properties_cypher(kind: EntityKind) -> String {
    format!(
        "UNWIND $updates AS u \
         MATCH (n:{label} {{itemID: u.itemID}}) \
         SET n += u.properties \
         RETURN count(n) AS matched",
        label = kind.label()
    )
}

/// Cypher for a traversal: the seed match, one undirected `OPTIONAL MATCH`
/// per step, then the non-null nodes and relationships of each row.
pub(crate) fn traversal_cypher(shape: &TraversalShape, seed: &Seed) -> String {
    let root = shape.root();
    let key_field = match seed.key {
        SeedKey::ItemId(_) => "itemID",
        SeedKey::Name(_) => "name",
    };
    let mut cypher = format!(
        "MATCH ({var}:{label} {{{key_field}: $key}})",
        var = root.key_prefix(),
        label = root.label()
    );
    let mut node_vars = vec![root.key_prefix().to_string()];
    let mut rel_vars = Vec::new();
    for (i, step) in shape.steps().iter().enumerate() {
        let rel_var = format!("r{}", i + 1);
        cypher.push_str(&format!(
            " OPTIONAL MATCH ({from})-[{rel_var}:{rel}]-({to}:{label})",
            from = step.from.key_prefix(),
            rel = step.rel.as_str(),
            to = step.to.key_prefix(),
            label = step.to.label()
        ));
        node_vars.push(step.to.key_prefix().to_string());
        rel_vars.push(rel_var);
    }
    cypher.push_str(&format!(
        " RETURN [x IN [{nodes}] WHERE x IS NOT NULL | {NODE_PROJECTION}] AS nodes, \
         [r IN [{rels}] WHERE r IS NOT NULL | {LINK_PROJECTION}] AS links \
         LIMIT $limit",
        nodes = node_vars.join(", "),
        rels = rel_vars.join(", ")
    ));
    cypher
}

impl GraphStore for Neo4jStore {
    async fn ping(&self) -> Result<()> {
        let mut stream = self.graph.execute(query("RETURN 1 AS ok")).await?;
        stream
            .next()
            .await?
            .ok_or_else(|| AimkgError::Store("ping returned no rows".into()))?;
        Ok(())
    }

    async fn write_nodes(&self, kind: EntityKind, rows: &[NodeRow]) -> Result<usize> {
        for row in rows {
            if row.kind != kind {
                return Err(AimkgError::Validation(format!(
                    "{} row in a {kind} batch",
                    row.kind
                )));
            }
        }
        let cypher = merge_nodes_cypher(kind);
        let queries = rows
            .chunks(WRITE_CHUNK)
            .map(|chunk| {
                query(&cypher).param("rows", bolt_list(chunk.iter().map(|r| bolt_map(r.properties()))))
            })
            .collect();
        self.run_in_txn(queries).await?;
        debug!(kind = %kind, rows = rows.len(), "merged nodes");
        Ok(rows.len())
    }

    async fn write_relationships(
        &self,
        rel: RelationshipType,
        pairs: &[(ItemId, ItemId)],
    ) -> Result<usize> {
        let cypher = merge_relationships_cypher(rel);
        let queries = pairs
            .chunks(WRITE_CHUNK)
            .map(|chunk| {
                let items = chunk.iter().map(|(start, end)| {
                    let (start, end) = (start.to_string(), end.to_string());
                    bolt_map([("start", start.as_str()), ("end", end.as_str())])
                });
                query(&cypher).param("pairs", bolt_list(items))
            })
            .collect();
        let merged = self.count_in_txn(queries, "merged").await?;
        debug!(rel = %rel, pairs = pairs.len(), merged, "merged relationships");
        Ok(merged)
    }

    async fn update_properties(
        &self,
        kind: EntityKind,
        updates: &[PropertyUpdate],
    ) -> Result<usize> {
        let cypher = update_properties_cypher(kind);
        let queries = updates
            .chunks(WRITE_CHUNK)
            .map(|chunk| {
                let items = chunk.iter().map(|u| {
                    let mut map = BoltMap::new();
                    map.put(BoltString::from("itemID"), bolt_str(&u.item_id.to_string()));
                    map.put(
                        BoltString::from("properties"),
                        bolt_map(u.properties.iter()),
                    );
                    BoltType::Map(map)
                });
                query(&cypher).param("updates", bolt_list(items))
            })
            .collect();
        self.count_in_txn(queries, "matched").await
    }

    async fn nodes(&self, kind: EntityKind, limit: Option<usize>) -> Result<Vec<StoredNode>> {
        let mut cypher = format!(
            "MATCH (x:{label}) RETURN {NODE_PROJECTION} AS node",
            label = kind.label()
        );
        let q = match limit {
            Some(limit) => {
                cypher.push_str(" LIMIT $limit");
                query(&cypher).param("limit", limit as i64)
            }
            None => query(&cypher),
        };
        self.fetch_nodes(q, "node").await
    }

    async fn task_modalities_by_dataset(&self) -> Result<Vec<(ItemId, Vec<String>)>> {
        let q = query(
            "MATCH (d:Dataset)-[:USES_DATASET]-(:Artifact)-[:HAS_ARTIFACT]-(:Execution)\
             -[:HAS_EXECUTION]-(:Stage)-[:HAS_STAGE]-(:Pipeline)-[:HAS_TASK]-(t:Task) \
             RETURN d.itemID AS dataset, collect(DISTINCT t.modality) AS modalities \
             ORDER BY dataset",
        );
        let mut stream = self.graph.execute(q).await?;
        let mut out = Vec::new();
        while let Some(row) = stream.next().await? {
            let id: String = row.get("dataset")?;
            let modalities: Vec<String> = row.get("modalities")?;
            out.push((id.parse()?, modalities));
        }
        Ok(out)
    }

    async fn traverse(
        &self,
        shape: &TraversalShape,
        seed: &Seed,
        limit: usize,
    ) -> Result<Vec<TraversalRecord>> {
        let key = match &seed.key {
            SeedKey::ItemId(id) => id.to_string(),
            SeedKey::Name(name) => name.clone(),
        };
        let q = query(&traversal_cypher(shape, seed))
            .param("key", key)
            .param("limit", limit as i64);
        let mut stream = self.graph.execute(q).await?;
        let mut records = Vec::new();
        while let Some(row) = stream.next().await? {
            let nodes: Vec<NodeProjection> = row.get("nodes")?;
            let links: Vec<LinkProjection> = row.get("links")?;
            records.push(TraversalRecord {
                nodes: nodes
                    .into_iter()
                    .map(NodeProjection::into_stored)
                    .collect::<Result<_>>()?,
                links: links
                    .into_iter()
                    .map(LinkProjection::into_stored)
                    .collect::<Result<_>>()?,
            });
        }
        Ok(records)
    }
}
