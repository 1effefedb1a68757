//! Relationship types for the knowledge graph.
//!
//! The schema is fixed: nine relationship types, each between one pair of
//! entity types. Taken undirected it forms a tree over the ten entity types,
//! which is what lets [`crate::driver::TraversalShape`] root a traversal at
//! any of them.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::errors::AimkgError;
use crate::nodes::EntityKind;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RelationshipType {
    /// Pipeline → Task
    HasTask,
    /// Pipeline → Stage
    HasStage,
    /// Stage → Execution
    HasExecution,
    /// Execution → Artifact
    HasArtifact,
    /// Artifact → Dataset
    UsesDataset,
    /// Artifact → Model
    UsesModel,
    /// Artifact → Metric
    HasMetric,
    /// Pipeline → Framework
    UsesFramework,
    /// Pipeline → Report
    HasReport,
}

impl RelationshipType {
    pub const ALL: [RelationshipType; 9] = [
        RelationshipType::HasTask,
        RelationshipType::HasStage,
        RelationshipType::HasExecution,
        RelationshipType::HasArtifact,
        RelationshipType::UsesDataset,
        RelationshipType::UsesModel,
        RelationshipType::HasMetric,
        RelationshipType::UsesFramework,
        RelationshipType::HasReport,
    ];

    /// Graph relationship type name, e.g. `"HAS_TASK"`.
    pub fn as_str(self) -> &'static str {
        match self {
            RelationshipType::HasTask => "HAS_TASK",
            RelationshipType::HasStage => "HAS_STAGE",
            RelationshipType::HasExecution => "HAS_EXECUTION",
            RelationshipType::HasArtifact => "HAS_ARTIFACT",
            RelationshipType::UsesDataset => "USES_DATASET",
            RelationshipType::UsesModel => "USES_MODEL",
            RelationshipType::HasMetric => "HAS_METRIC",
            RelationshipType::UsesFramework => "USES_FRAMEWORK",
            RelationshipType::HasReport => "HAS_REPORT",
        }
    }

    /// `(from, to)` entity types, in write direction.
    pub fn endpoints(self) -> (EntityKind, EntityKind) {
        use EntityKind::*;
        match self {
            RelationshipType::HasTask => (Pipeline, Task),
            RelationshipType::HasStage => (Pipeline, Stage),
            RelationshipType::HasExecution => (Stage, Execution),
            RelationshipType::HasArtifact => (Execution, Artifact),
            RelationshipType::UsesDataset => (Artifact, Dataset),
            RelationshipType::UsesModel => (Artifact, Model),
            RelationshipType::HasMetric => (Artifact, Metric),
            RelationshipType::UsesFramework => (Pipeline, Framework),
            RelationshipType::HasReport => (Pipeline, Report),
        }
    }

    /// Interchange file stem, e.g. `"pipeline_task"`.
    pub fn file_stem(self) -> String {
        let (from, to) = self.endpoints();
        format!("{}_{}", from.key_prefix(), to.key_prefix())
    }

    /// Relationship types touching `kind`, with the entity type on the far side.
    pub fn incident(kind: EntityKind) -> impl Iterator<Item = (RelationshipType, EntityKind)> {
        Self::ALL.into_iter().filter_map(move |rel| {
            let (from, to) = rel.endpoints();
            if from == kind {
                Some((rel, to))
            } else if to == kind {
                Some((rel, from))
            } else {
                None
            }
        })
    }
}

impl fmt::Display for RelationshipType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RelationshipType {
    type Err = AimkgError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|r| r.as_str() == s)
            .ok_or_else(|| AimkgError::Validation(format!("unknown relationship type '{s}'")))
    }
}
