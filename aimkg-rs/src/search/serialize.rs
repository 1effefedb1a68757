//! Result Serializer.
//!
//! Flattens traversal result sets into the presentation graph returned to
//! clients: deduplicated nodes, deduplicated links, and a list of titled
//! explanations describing why each recommendation was made.

use std::collections::{BTreeMap, BTreeSet, HashSet};

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::driver::{StoredLink, StoredNode, TraversalRecord};
use crate::edges::RelationshipType;
use crate::nodes::{EntityKind, NONE_SENTINEL};
use crate::search::rank::{QueryProfile, RankedEntity};
use crate::utils::{title_case, tokenize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PresentedNode {
    pub id: String,
    pub labels: EntityKind,
    pub properties: BTreeMap<String, String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PresentedLink {
    pub source: String,
    pub target: String,
    #[serde(rename = "type")]
    pub rel: RelationshipType,
    pub properties: BTreeMap<String, String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Explanation {
    pub title: String,
    pub content: Value,
}

impl Explanation {
    pub fn query(query: &QueryProfile, kind: EntityKind) -> Self {
        Self {
            title: "Query".to_string(),
            content: json!({
                "Name": title_case(&query.text),
                "Label": kind.label(),
                "Properties Computed": {
                    "Modality": query.modality.to_string(),
                },
            }),
        }
    }

    /// `rank` is 1-based. "Shared Tokens" are the query tokens that equal a
    /// token of the candidate's name or, from [`MIN_PARTIAL_TOKEN`] bytes up,
    /// start or end one, so `"image net"` explains `ImageNet`.
    pub fn recommendation(rank: usize, query: &QueryProfile, entity: &RankedEntity) -> Self {
        let name = entity.node.name();
        let tokens: BTreeSet<String> = tokenize(name).into_iter().collect();
        let shared: Vec<&str> = query
            .tokens
            .iter()
            .map(String::as_str)
            .filter(|t| tokens.iter().any(|c| shares_token(t, c)))
            .collect();
        let mut similar = json!({
            "Tokens": tokens,
            "Shared Tokens": shared,
        });
        if entity.node.kind.carries_taxonomy() {
            similar["Modality"] =
                Value::from(entity.node.property("modality").unwrap_or(NONE_SENTINEL));
        }
        Self {
            title: format!("Recommendation-{rank}"),
            content: json!({
                "Name": title_case(name),
                "Similarity Score": entity.score,
                "Signals": entity.signals,
                "Similar Properties": similar,
            }),
        }
    }
}

/// Shortest query token credited for matching only part of a name token.
pub const MIN_PARTIAL_TOKEN: usize = 3;

fn shares_token(query: &str, candidate: &str) -> bool {
    query == candidate
        || (query.len() >= MIN_PARTIAL_TOKEN
            && (candidate.starts_with(query) || candidate.ends_with(query)))
}

/// The client-facing graph: every node and link appears once however many
/// result sets contain it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PresentationGraph {
    pub nodes: Vec<PresentedNode>,
    pub links: Vec<PresentedLink>,
    pub explanations: Vec<Explanation>,
}

impl PresentationGraph {
    /// Nodes are deduplicated by native identity; links by the unordered
    /// endpoint pair plus type. First occurrence wins and fixes the order.
    pub fn from_results(results: &[Vec<TraversalRecord>]) -> Self {
        let mut graph = Self::default();
        let mut seen_nodes: HashSet<&str> = HashSet::new();
        let mut seen_links: HashSet<(&str, &str, RelationshipType)> = HashSet::new();
        for record in results.iter().flatten() {
            for node in &record.nodes {
                if seen_nodes.insert(node.id.as_str()) {
                    graph.nodes.push(present_node(node));
                }
            }
            for link in &record.links {
                let (a, b) = if link.start <= link.end {
                    (link.start.as_str(), link.end.as_str())
                } else {
                    (link.end.as_str(), link.start.as_str())
                };
                if seen_links.insert((a, b, link.rel)) {
                    graph.links.push(present_link(link));
                }
            }
        }
        graph
    }

    pub fn with_explanations(mut self, explanations: Vec<Explanation>) -> Self {
        self.explanations = explanations;
        self
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty() && self.links.is_empty()
    }
}

fn present_node(node: &StoredNode) -> PresentedNode {
    PresentedNode {
        id: node.id.clone(),
        labels: node.kind,
        properties: node.properties.clone(),
    }
}

fn present_link(link: &StoredLink) -> PresentedLink {
    PresentedLink {
        source: link.start.clone(),
        target: link.end.clone(),
        rel: link.rel,
        properties: link.properties.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::search::rank::{SimilarityRanker, Signals};

    fn node(id: &str, kind: EntityKind, name: &str) -> StoredNode {
        StoredNode {
            id: id.to_string(),
            kind,
            properties: BTreeMap::from([("name".to_string(), name.to_string())]),
        }
    }

    fn link(id: &str, start: &str, end: &str, rel: RelationshipType) -> StoredLink {
        StoredLink {
            id: id.to_string(),
            start: start.to_string(),
            end: end.to_string(),
            rel,
            properties: BTreeMap::new(),
        }
    }

    #[test]
    fn nodes_and_links_appear_once() {
        let pipeline = node("n1", EntityKind::Pipeline, "p");
        let task = node("n2", EntityKind::Task, "t");
        let forward = link("r1", "n1", "n2", RelationshipType::HasTask);
        let reversed = link("r9", "n2", "n1", RelationshipType::HasTask);
        let results = vec![
            vec![TraversalRecord {
                nodes: vec![pipeline.clone(), task.clone()],
                links: vec![forward],
            }],
            vec![TraversalRecord {
                nodes: vec![task, pipeline],
                links: vec![reversed],
            }],
        ];
        let graph = PresentationGraph::from_results(&results);
        assert_eq!(graph.nodes.len(), 2);
        assert_eq!(graph.nodes[0].id, "n1");
        assert_eq!(graph.links.len(), 1);
        assert_eq!(graph.links[0].source, "n1");
    }

    #[test]
    fn same_endpoints_different_type_are_distinct() {
        let results = vec![vec![TraversalRecord {
            nodes: vec![],
            links: vec![
                link("r1", "a", "b", RelationshipType::HasTask),
                link("r2", "a", "b", RelationshipType::HasStage),
            ],
        }]];
        assert_eq!(PresentationGraph::from_results(&results).links.len(), 2);
    }

    #[test]
    fn wire_shape() {
        let results = vec![vec![TraversalRecord {
            nodes: vec![node("n1", EntityKind::Dataset, "COCO")],
            links: vec![link("r1", "n1", "n2", RelationshipType::UsesDataset)],
        }]];
        let value = serde_json::to_value(PresentationGraph::from_results(&results)).unwrap();
        assert_eq!(value["nodes"][0]["labels"], "Dataset");
        assert_eq!(value["nodes"][0]["properties"]["name"], "COCO");
        assert_eq!(value["links"][0]["type"], "USES_DATASET");
        assert_eq!(value["links"][0]["target"], "n2");
        assert!(value["explanations"].as_array().unwrap().is_empty());
    }

    #[test]
    fn recommendation_explanation_names_shared_tokens() {
        let query = SimilarityRanker::default().profile("image net", vec![1.0]);
        let mut imagenet = node("n1", EntityKind::Dataset, "ImageNet");
        imagenet
            .properties
            .insert("modality".to_string(), "image".to_string());
        let entity = RankedEntity {
            node: imagenet,
            score: 0.5,
            signals: Signals {
                embedding: 1.0,
                token: Some(0.0),
                modality: None,
                category: None,
            },
        };
        let explanation = Explanation::recommendation(1, &query, &entity);
        assert_eq!(explanation.title, "Recommendation-1");
        assert_eq!(explanation.content["Name"], "Imagenet");
        assert_eq!(explanation.content["Similarity Score"], 0.5);
        let similar = &explanation.content["Similar Properties"];
        assert_eq!(similar["Tokens"], json!(["imagenet"]));
        assert_eq!(similar["Shared Tokens"], json!(["image", "net"]));
        assert_eq!(similar["Modality"], "image");
    }

    #[test]
    fn short_or_inner_fragments_are_not_shared() {
        let entity = |name: &str| RankedEntity {
            node: node("n1", EntityKind::Dataset, name),
            score: 0.5,
            signals: Signals {
                embedding: 0.5,
                token: Some(0.0),
                modality: None,
                category: None,
            },
        };
        let shared = |q: &str, name: &str| {
            let query = SimilarityRanker::default().profile(q, vec![1.0]);
            let explanation = Explanation::recommendation(1, &query, &entity(name));
            explanation.content["Similar Properties"]["Shared Tokens"].clone()
        };
        assert_eq!(shared("a net", "ImageNet"), json!(["net"]));
        assert_eq!(shared("age", "ImageNet"), json!([]));
        assert_eq!(shared("a", "A-OKVQA"), json!(["a"]));
    }

    #[test]
    fn query_explanation_reports_computed_modality() {
        let query = SimilarityRanker::default().profile("image classification", vec![1.0]);
        let explanation = Explanation::query(&query, EntityKind::Task);
        assert_eq!(explanation.content["Name"], "Image Classification");
        assert_eq!(explanation.content["Label"], "Task");
        assert_eq!(explanation.content["Properties Computed"]["Modality"], "image");
    }
}
