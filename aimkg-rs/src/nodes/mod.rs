//! Node types for the knowledge graph.
//!
//! Ten entity types share four common attributes ([`NodeMeta`]); each type adds
//! its own fields. Every node flattens into a [`NodeRow`] whose values line up
//! with [`EntityKind::fields`], which is both the interchange CSV header and the
//! property set written to the graph store.
//!
//! - [`catalog`]: Task, Dataset, Model (the rankable catalog entities)
//! - [`lineage`]: Pipeline, Stage, Execution, Artifact, Metric
//! - [`provenance`]: Framework, Report

pub mod catalog;
pub mod lineage;
pub mod provenance;

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::errors::AimkgError;
use crate::ids::ItemId;

pub use catalog::{DatasetNode, ModelNode, TaskNode};
pub use lineage::{ArtifactNode, ExecutionNode, MetricNode, PipelineNode, StageNode};
pub use provenance::{FrameworkNode, ReportNode};

/// Sentinel stored where a value is structurally required but unknown.
pub const NONE_SENTINEL: &str = "none";

const COMMON_FIELDS: [&str; 4] = ["itemID", "name", "source", "srcID"];

/// The ten entity types of the graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum EntityKind {
    Task,
    Dataset,
    Model,
    Pipeline,
    Stage,
    Execution,
    Artifact,
    Metric,
    Framework,
    Report,
}

impl EntityKind {
    pub const ALL: [EntityKind; 10] = [
        EntityKind::Task,
        EntityKind::Dataset,
        EntityKind::Model,
        EntityKind::Pipeline,
        EntityKind::Stage,
        EntityKind::Execution,
        EntityKind::Artifact,
        EntityKind::Metric,
        EntityKind::Framework,
        EntityKind::Report,
    ];

    /// Entity types that get an embedding index and can be recommended.
    pub const RANKABLE: [EntityKind; 4] = [
        EntityKind::Task,
        EntityKind::Dataset,
        EntityKind::Model,
        EntityKind::Pipeline,
    ];

    /// Graph label, e.g. `"Dataset"`.
    pub fn label(self) -> &'static str {
        match self {
            EntityKind::Task => "Task",
            EntityKind::Dataset => "Dataset",
            EntityKind::Model => "Model",
            EntityKind::Pipeline => "Pipeline",
            EntityKind::Stage => "Stage",
            EntityKind::Execution => "Execution",
            EntityKind::Artifact => "Artifact",
            EntityKind::Metric => "Metric",
            EntityKind::Framework => "Framework",
            EntityKind::Report => "Report",
        }
    }

    /// Lower-case prefix used in canonical keys and file names.
    pub fn key_prefix(self) -> &'static str {
        match self {
            EntityKind::Task => "task",
            EntityKind::Dataset => "dataset",
            EntityKind::Model => "model",
            EntityKind::Pipeline => "pipeline",
            EntityKind::Stage => "stage",
            EntityKind::Execution => "execution",
            EntityKind::Artifact => "artifact",
            EntityKind::Metric => "metric",
            EntityKind::Framework => "framework",
            EntityKind::Report => "report",
        }
    }

    /// Property names in insertion order: the common four, then kind-specific.
    pub fn fields(self) -> Vec<&'static str> {
        let extra: &[&str] = match self {
            EntityKind::Task => &["modality", "category", "description"],
            EntityKind::Dataset => &["modality", "category", "description", "url"],
            EntityKind::Model => &["modelClass", "description", "url"],
            EntityKind::Pipeline => &["task", "model"],
            EntityKind::Stage => &["pipeline"],
            EntityKind::Execution => &["stage", "dataset"],
            EntityKind::Artifact => &["dataset", "model"],
            EntityKind::Metric => &["metric", "value"],
            EntityKind::Framework => &[],
            EntityKind::Report => &["url", "abstract"],
        };
        COMMON_FIELDS.iter().chain(extra).copied().collect()
    }

    /// True for the types carrying `modality` and `category`.
    pub fn carries_taxonomy(self) -> bool {
        matches!(self, EntityKind::Task | EntityKind::Dataset)
    }

    pub fn is_rankable(self) -> bool {
        Self::RANKABLE.contains(&self)
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for EntityKind {
    type Err = AimkgError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let needle = s.trim();
        EntityKind::ALL
            .into_iter()
            .find(|k| k.label().eq_ignore_ascii_case(needle))
            .ok_or_else(|| AimkgError::Validation(format!("unknown entity type '{s}'")))
    }
}

/// Attributes shared by every node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeMeta {
    pub item_id: ItemId,
    pub name: String,
    /// Origin tag, e.g. `"huggingface"`.
    pub source: String,
    /// Source-native identifier.
    pub src_id: String,
}

impl NodeMeta {
    pub fn new(
        item_id: ItemId,
        name: impl Into<String>,
        source: impl Into<String>,
        src_id: impl Into<String>,
    ) -> Self {
        Self {
            item_id,
            name: name.into(),
            source: source.into(),
            src_id: src_id.into(),
        }
    }

    fn values(&self) -> Vec<String> {
        vec![
            self.item_id.to_string(),
            self.name.clone(),
            self.source.clone(),
            self.src_id.clone(),
        ]
    }
}

/// One node flattened to string values aligned with [`EntityKind::fields`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeRow {
    pub kind: EntityKind,
    pub values: Vec<String>,
}

impl NodeRow {
    /// Build a row, rejecting a value count that does not match the kind's
    /// field list.
    pub fn new(kind: EntityKind, values: Vec<String>) -> crate::Result<Self> {
        let expected = kind.fields().len();
        if values.len() != expected {
            return Err(AimkgError::Validation(format!(
                "{kind} row has {} values, expected {expected}",
                values.len()
            )));
        }
        Ok(Self { kind, values })
    }

    pub fn get(&self, field: &str) -> Option<&str> {
        self.kind
            .fields()
            .iter()
            .position(|f| *f == field)
            .and_then(|i| self.values.get(i))
            .map(String::as_str)
    }

    pub fn item_id(&self) -> crate::Result<ItemId> {
        self.values
            .first()
            .ok_or_else(|| AimkgError::Validation(format!("empty {} row", self.kind)))?
            .parse()
    }

    pub fn name(&self) -> &str {
        self.values.get(1).map(String::as_str).unwrap_or_default()
    }

    pub fn src_id(&self) -> &str {
        self.values.get(3).map(String::as_str).unwrap_or_default()
    }

    /// `(field, value)` pairs in field order.
    pub fn properties(&self) -> impl Iterator<Item = (&'static str, &str)> + '_ {
        self.kind
            .fields()
            .into_iter()
            .zip(self.values.iter().map(String::as_str))
    }
}

/// A typed node that flattens into a [`NodeRow`].
pub trait GraphNode {
    const KIND: EntityKind;

    fn meta(&self) -> &NodeMeta;

    /// Kind-specific values, in [`EntityKind::fields`] order after the common four.
    fn extra_values(&self) -> Vec<String>;

    fn to_row(&self) -> NodeRow {
        let mut values = self.meta().values();
        values.extend(self.extra_values());
        NodeRow {
            kind: Self::KIND,
            values,
        }
    }
}

/// Map an empty or missing optional value to [`NONE_SENTINEL`].
pub(crate) fn or_none(value: Option<&str>) -> String {
    match value.map(str::trim) {
        Some(v) if !v.is_empty() => v.to_string(),
        _ => NONE_SENTINEL.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ids::item_id;

    #[test]
    fn labels_roundtrip_through_from_str() {
        for kind in EntityKind::ALL {
            assert_eq!(kind.label().parse::<EntityKind>().unwrap(), kind);
        }
        assert_eq!("dataset".parse::<EntityKind>().unwrap(), EntityKind::Dataset);
        assert!("Paper".parse::<EntityKind>().is_err());
    }

    #[test]
    fn every_kind_starts_with_common_fields() {
        for kind in EntityKind::ALL {
            assert_eq!(&kind.fields()[..4], &COMMON_FIELDS);
        }
    }

    #[test]
    fn only_task_and_dataset_carry_taxonomy() {
        let carrying: Vec<_> = EntityKind::ALL
            .into_iter()
            .filter(|k| k.carries_taxonomy())
            .collect();
        assert_eq!(carrying, vec![EntityKind::Task, EntityKind::Dataset]);
        assert!(EntityKind::Task.fields().contains(&"modality"));
        assert!(!EntityKind::Model.fields().contains(&"modality"));
    }

    #[test]
    fn row_rejects_wrong_arity() {
        let err = NodeRow::new(EntityKind::Framework, vec!["1".into()]).unwrap_err();
        assert!(matches!(err, AimkgError::Validation(_)));
    }

    #[test]
    fn row_accessors() {
        let id = item_id("framework:pytorch");
        let row = NodeRow::new(
            EntityKind::Framework,
            vec![id.to_string(), "pytorch".into(), "huggingface".into(), "pytorch".into()],
        )
        .unwrap();
        assert_eq!(row.item_id().unwrap(), id);
        assert_eq!(row.name(), "pytorch");
        assert_eq!(row.get("source"), Some("huggingface"));
        assert_eq!(row.get("missing"), None);
        assert_eq!(row.properties().count(), 4);
    }

    #[test]
    fn or_none_substitutes_sentinel() {
        assert_eq!(or_none(None), "none");
        assert_eq!(or_none(Some("  ")), "none");
        assert_eq!(or_none(Some("x")), "x");
    }
}
