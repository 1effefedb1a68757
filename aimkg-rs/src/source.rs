//! Per-source input records.
//!
//! A [`SourceDump`] is everything one external fetch client produced for a
//! single source, already mapped onto the graph vocabulary. Required fields are
//! plain values; optional ones are `Option` or default to empty, so a partially
//! complete dump still deserializes.

use std::collections::BTreeMap;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::errors::{AimkgError, Result};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SourceDump {
    /// Origin tag written to every node, e.g. `"huggingface"`.
    pub source: String,
    #[serde(default)]
    pub tasks: Vec<TaskRecord>,
    #[serde(default)]
    pub datasets: Vec<DatasetRecord>,
    #[serde(default)]
    pub models: Vec<ModelRecord>,
    #[serde(default)]
    pub metrics: Vec<MetricRecord>,
    #[serde(default)]
    pub reports: Vec<ReportRecord>,
}

impl SourceDump {
    /// Read a dump from a JSON file.
    pub fn load(path: &Path) -> Result<Self> {
        let file = File::open(path).map_err(|e| {
            AimkgError::Source(format!("cannot open source dump {}: {e}", path.display()))
        })?;
        let dump: SourceDump = serde_json::from_reader(BufReader::new(file)).map_err(|e| {
            AimkgError::Source(format!("cannot parse source dump {}: {e}", path.display()))
        })?;
        if dump.source.trim().is_empty() {
            return Err(AimkgError::Source(format!(
                "source dump {} has an empty source tag",
                path.display()
            )));
        }
        info!(
            source = %dump.source,
            tasks = dump.tasks.len(),
            datasets = dump.datasets.len(),
            models = dump.models.len(),
            metrics = dump.metrics.len(),
            reports = dump.reports.len(),
            "loaded source dump"
        );
        Ok(dump)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskRecord {
    pub src_id: String,
    pub name: Option<String>,
    pub description: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatasetRecord {
    pub src_id: String,
    pub name: Option<String>,
    pub description: Option<String>,
    pub url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelRecord {
    pub src_id: String,
    pub name: Option<String>,
    pub model_class: Option<String>,
    pub description: Option<String>,
    pub url: Option<String>,
    /// Source-native ID of the task this model performs.
    pub task: Option<String>,
    /// Source-native IDs of the datasets the model was run against.
    #[serde(default)]
    pub datasets: Vec<String>,
    /// Free-form tags; framework names are picked out of them.
    #[serde(default)]
    pub tags: Vec<String>,
    /// Source-native IDs of reports citing the model.
    #[serde(default)]
    pub reports: Vec<String>,
}

/// A reported evaluation result of a model, optionally on a dataset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricRecord {
    pub model: String,
    pub dataset: Option<String>,
    pub name: String,
    pub value: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportRecord {
    pub src_id: String,
    pub title: String,
    #[serde(rename = "abstract")]
    pub summary: Option<String>,
    pub url: Option<String>,
}

impl TaskRecord {
    /// True when an optional field is absent.
    pub fn is_incomplete(&self) -> bool {
        self.name.is_none() || self.description.is_none()
    }
}

impl DatasetRecord {
    pub fn is_incomplete(&self) -> bool {
        self.name.is_none() || self.description.is_none() || self.url.is_none()
    }
}

impl ModelRecord {
    /// A model without a task or datasets still yields a pipeline, but one
    /// built from sentinels.
    pub fn is_incomplete(&self) -> bool {
        self.name.is_none()
            || self.description.is_none()
            || self.task.is_none()
            || self.datasets.is_empty()
    }
}

impl ReportRecord {
    pub fn is_incomplete(&self) -> bool {
        self.summary.is_none() || self.url.is_none()
    }
}

/// One entry of the external task taxonomy used by enrichment pass 1.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TaxonomyEntry {
    /// Research area name, e.g. `"Computer Vision"`.
    pub area: Option<String>,
    pub description: Option<String>,
}

/// Task taxonomy keyed by task source ID.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TaskTaxonomy(pub BTreeMap<String, TaxonomyEntry>);

impl TaskTaxonomy {
    pub fn load(path: &Path) -> Result<Self> {
        let file = File::open(path).map_err(|e| {
            AimkgError::Source(format!("cannot open task taxonomy {}: {e}", path.display()))
        })?;
        let taxonomy: TaskTaxonomy = serde_json::from_reader(BufReader::new(file))
            .map_err(|e| {
                AimkgError::Source(format!("cannot parse task taxonomy {}: {e}", path.display()))
            })?;
        info!(entries = taxonomy.0.len(), "loaded task taxonomy");
        Ok(taxonomy)
    }

    pub fn get(&self, src_id: &str) -> Option<&TaxonomyEntry> {
        self.0.get(src_id)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}
