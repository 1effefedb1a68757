//! Graph Assembler.
//!
//! Phase 1 turns one [`SourceDump`] into node tables plus pending link files
//! whose endpoints may still be source-native IDs. Phase 2 resolves those
//! endpoints through [`IdMap`]s built from the id tables and writes the
//! relationship files the loader consumes. A link with an unresolvable
//! endpoint is dropped and counted.

use std::collections::hash_map::Entry;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::path::PathBuf;

use tracing::{debug, info, warn};

use crate::edges::RelationshipType;
use crate::errors::{AimkgError, Result};
use crate::ids::ItemId;
use crate::interchange::{
    for_each_pending, EndpointRef, IdMap, NodeTableWriter, PendingLink, PendingWriter,
    RelationshipWriter, SourceLayout,
};
use crate::nodes::lineage::run_src_id;
use crate::nodes::{
    ArtifactNode, DatasetNode, EntityKind, ExecutionNode, FrameworkNode, GraphNode, MetricNode,
    ModelNode, PipelineNode, ReportNode, StageNode, TaskNode,
};
use crate::pipeline::report::SourceReport;
use crate::source::{DatasetRecord, ModelRecord, SourceDump, TaskRecord};
use crate::taxonomy::{vocab, Classifier};
use crate::utils::{capitalize_first, strip_interchange_chars, tokenize};

/// Stage created for every pipeline.
pub const DEFAULT_STAGE: &str = "evaluation";

/// Task name used for the pipeline of a model that reports no task.
pub const TASKLESS_PIPELINE: &str = "Pipeline";

fn present(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

/// `"image-classification"` → `"Image classification"`.
pub fn task_name(rec: &TaskRecord) -> String {
    present(rec.name.as_deref())
        .map(str::to_string)
        .unwrap_or_else(|| task_name_from_src(&rec.src_id))
}

fn task_name_from_src(src_id: &str) -> String {
    capitalize_first(&src_id.split('-').collect::<Vec<_>>().join(" "))
}

/// `"org/imagenet-1k"` → `"Imagenet-1k"`.
pub fn dataset_name(rec: &DatasetRecord) -> String {
    present(rec.name.as_deref())
        .map(str::to_string)
        .unwrap_or_else(|| {
            capitalize_first(rec.src_id.rsplit('/').next().unwrap_or(&rec.src_id))
        })
}

pub fn model_name(rec: &ModelRecord) -> String {
    present(rec.name.as_deref())
        .unwrap_or(&rec.src_id)
        .to_string()
}

/// Trimmed, non-empty references in first-seen order.
fn distinct_refs(refs: &[String]) -> Vec<&str> {
    let mut seen = HashSet::new();
    refs.iter()
        .map(|r| r.trim())
        .filter(|r| !r.is_empty() && seen.insert(*r))
        .collect()
}

/// Framework names among a model's tags, first-seen order.
fn frameworks(tags: &[String]) -> Vec<String> {
    let mut seen = HashSet::new();
    tags.iter()
        .map(|t| t.trim().to_lowercase())
        .filter(|t| vocab::FRAMEWORK.contains(&t.as_str()))
        .filter(|t| seen.insert(t.clone()))
        .collect()
}

fn clean_text(value: Option<&str>) -> Option<String> {
    present(value).map(strip_interchange_chars)
}

/// Open writers of Phase 1.
struct Phase1 {
    tables: BTreeMap<EntityKind, NodeTableWriter>,
    pending: BTreeMap<RelationshipType, PendingWriter>,
}

impl Phase1 {
    fn create(layout: &SourceLayout) -> Result<Self> {
        let mut tables = BTreeMap::new();
        for kind in EntityKind::ALL {
            tables.insert(kind, NodeTableWriter::create(layout, kind)?);
        }
        let mut pending = BTreeMap::new();
        for rel in RelationshipType::ALL {
            pending.insert(rel, PendingWriter::create(&layout.pending(rel))?);
        }
        Ok(Self { tables, pending })
    }

    fn node<N: GraphNode>(&mut self, node: &N) -> Result<ItemId> {
        let row = node.to_row();
        let table = self
            .tables
            .get_mut(&N::KIND)
            .ok_or_else(|| AimkgError::Validation(format!("no {} table open", N::KIND)))?;
        table.write(&row)?;
        Ok(node.meta().item_id)
    }

    fn link(&mut self, rel: RelationshipType, from: EndpointRef, to: EndpointRef) -> Result<()> {
        let writer = self
            .pending
            .get_mut(&rel)
            .ok_or_else(|| AimkgError::Validation(format!("no {rel} pending file open")))?;
        writer.write(&PendingLink { from, to })
    }

    fn finish(self, report: &mut SourceReport) -> Result<()> {
        for (kind, table) in self.tables {
            report.nodes.insert(kind, table.finish()?);
        }
        for (_, writer) in self.pending {
            writer.finish()?;
        }
        Ok(())
    }
}

pub struct GraphAssembler {
    classifier: Classifier,
    data_dir: PathBuf,
    stage: String,
}

impl GraphAssembler {
    pub fn new(classifier: Classifier, data_dir: impl Into<PathBuf>) -> Self {
        Self {
            classifier,
            data_dir: data_dir.into(),
            stage: DEFAULT_STAGE.to_string(),
        }
    }

    pub fn with_stage(mut self, stage: impl Into<String>) -> Self {
        self.stage = stage.into();
        self
    }

    pub fn layout(&self, source: &str) -> SourceLayout {
        SourceLayout::new(&self.data_dir, source)
    }

    /// Run both phases for one source. Re-running on the same dump rewrites
    /// identical files.
    pub fn assemble(&self, dump: &SourceDump) -> Result<SourceReport> {
        let layout = self.layout(&dump.source);
        layout.create_dirs()?;
        let mut report = SourceReport::new(dump.source.as_str());

        self.write_nodes(dump, &layout, &mut report)?;
        self.resolve(&layout, &mut report)?;

        info!(
            source = %dump.source,
            nodes = report.nodes.values().sum::<usize>(),
            resolved = report.total_resolved(),
            missed = report.total_missed(),
            "source assembled"
        );
        Ok(report)
    }

    // ── Phase 1 ─────────────────────────────────────────────────────────────

    fn write_nodes(
        &self,
        dump: &SourceDump,
        layout: &SourceLayout,
        report: &mut SourceReport,
    ) -> Result<()> {
        let source = dump.source.as_str();
        let mut out = Phase1::create(layout)?;
        let mut incomplete = |kind: EntityKind, flag: bool| {
            if flag {
                *report.incomplete.entry(kind).or_default() += 1;
            }
        };

        let mut task_names: HashMap<&str, String> = HashMap::new();
        for rec in &dump.tasks {
            incomplete(EntityKind::Task, rec.is_incomplete());
            let name = task_name(rec);
            let tokens = tokenize(&name);
            let description = clean_text(rec.description.as_deref());
            out.node(&TaskNode::new(
                &name,
                source,
                &rec.src_id,
                self.classifier.modality(&tokens),
                self.classifier.category(&tokens),
                description.as_deref(),
            ))?;
            task_names.insert(rec.src_id.as_str(), name);
        }

        for rec in &dump.datasets {
            incomplete(EntityKind::Dataset, rec.is_incomplete());
            let name = dataset_name(rec);
            let description = clean_text(rec.description.as_deref());
            let mut tokens = tokenize(&name);
            if let Some(d) = &description {
                tokens.extend(tokenize(d));
            }
            out.node(&DatasetNode::new(
                &name,
                source,
                &rec.src_id,
                self.classifier.modality(&tokens),
                self.classifier.category(&tokens),
                description.as_deref(),
                present(rec.url.as_deref()),
            ))?;
        }

        for rec in &dump.reports {
            incomplete(EntityKind::Report, rec.is_incomplete());
            let summary = clean_text(rec.summary.as_deref());
            out.node(&ReportNode::new(
                rec.title.trim(),
                source,
                &rec.src_id,
                present(rec.url.as_deref()),
                summary.as_deref(),
            ))?;
        }

        for rec in &dump.models {
            incomplete(EntityKind::Model, rec.is_incomplete());
            self.write_model(rec, source, &task_names, &mut out)?;
        }

        for rec in &dump.metrics {
            let dataset = present(rec.dataset.as_deref());
            let model = rec.model.trim();
            let metric = MetricNode::new(source, model, dataset, rec.name.trim(), rec.value.trim());
            let metric_id = out.node(&metric)?;
            out.link(
                RelationshipType::HasMetric,
                EndpointRef::Src(run_src_id(model, dataset)),
                EndpointRef::Id(metric_id),
            )?;
        }

        out.finish(report)
    }

    /// Model, its pipeline and stage, one execution/artifact pair per
    /// distinct dataset (or one against the sentinel), frameworks, and the
    /// pipeline's task/report links.
    fn write_model(
        &self,
        rec: &ModelRecord,
        source: &str,
        task_names: &HashMap<&str, String>,
        out: &mut Phase1,
    ) -> Result<()> {
        let name = model_name(rec);
        let description = clean_text(rec.description.as_deref());
        let model_id = out.node(&ModelNode::new(
            &name,
            source,
            &rec.src_id,
            present(rec.model_class.as_deref()),
            description.as_deref(),
            present(rec.url.as_deref()),
        ))?;

        let task_src = present(rec.task.as_deref());
        let task = match task_src {
            Some(src) => task_names
                .get(src)
                .cloned()
                .unwrap_or_else(|| task_name_from_src(src)),
            None => TASKLESS_PIPELINE.to_string(),
        };
        let pipeline = PipelineNode::new(&task, &name, source, &rec.src_id);
        let pipeline_id = out.node(&pipeline)?;
        if let Some(src) = task_src {
            out.link(
                RelationshipType::HasTask,
                EndpointRef::Id(pipeline_id),
                EndpointRef::Src(src.to_string()),
            )?;
        }

        let stage = StageNode::new(&pipeline, &self.stage);
        let stage_id = out.node(&stage)?;
        out.link(
            RelationshipType::HasStage,
            EndpointRef::Id(pipeline_id),
            EndpointRef::Id(stage_id),
        )?;

        let datasets = distinct_refs(&rec.datasets);
        let runs: Vec<Option<&str>> = if datasets.is_empty() {
            vec![None]
        } else {
            datasets.into_iter().map(Some).collect()
        };
        for dataset in runs {
            let execution = ExecutionNode::new(&stage, &rec.src_id, dataset);
            let artifact = ArtifactNode::new(&execution, &name);
            let execution_id = out.node(&execution)?;
            let artifact_id = out.node(&artifact)?;
            out.link(
                RelationshipType::HasExecution,
                EndpointRef::Id(stage_id),
                EndpointRef::Id(execution_id),
            )?;
            out.link(
                RelationshipType::HasArtifact,
                EndpointRef::Id(execution_id),
                EndpointRef::Id(artifact_id),
            )?;
            out.link(
                RelationshipType::UsesModel,
                EndpointRef::Id(artifact_id),
                EndpointRef::Id(model_id),
            )?;
            if let Some(dataset) = dataset {
                out.link(
                    RelationshipType::UsesDataset,
                    EndpointRef::Id(artifact_id),
                    EndpointRef::Src(dataset.to_string()),
                )?;
            }
        }

        for framework in frameworks(&rec.tags) {
            let framework_id = out.node(&FrameworkNode::new(&framework, source))?;
            out.link(
                RelationshipType::UsesFramework,
                EndpointRef::Id(pipeline_id),
                EndpointRef::Id(framework_id),
            )?;
        }

        for report in distinct_refs(&rec.reports) {
            out.link(
                RelationshipType::HasReport,
                EndpointRef::Id(pipeline_id),
                EndpointRef::Src(report.to_string()),
            )?;
        }
        Ok(())
    }

    // ── Phase 2 ─────────────────────────────────────────────────────────────

    fn resolve(&self, layout: &SourceLayout, report: &mut SourceReport) -> Result<()> {
        let mut maps: HashMap<EntityKind, IdMap> = HashMap::new();
        for rel in RelationshipType::ALL {
            let (from_kind, to_kind) = rel.endpoints();
            let mut writer = RelationshipWriter::create(&layout.relationships(rel))?;
            let mut missed = 0usize;
            for_each_pending(&layout.pending(rel), |link| {
                let start = lookup(&mut maps, layout, from_kind, &link.from)?;
                let end = lookup(&mut maps, layout, to_kind, &link.to)?;
                match (start, end) {
                    (Some(start), Some(end)) => {
                        writer.write(start, end)?;
                    }
                    _ => {
                        missed += 1;
                        debug!(rel = %rel, ?link, "relationship endpoint not resolved");
                    }
                }
                Ok(())
            })?;
            report.resolved.insert(rel, writer.finish()?);
            if missed > 0 {
                warn!(rel = %rel, missed, "dropped unresolved relationships");
                report.missed.insert(rel, missed);
            }
        }
        Ok(())
    }
}

fn lookup(
    maps: &mut HashMap<EntityKind, IdMap>,
    layout: &SourceLayout,
    kind: EntityKind,
    endpoint: &EndpointRef,
) -> Result<Option<ItemId>> {
    match endpoint {
        EndpointRef::Id(id) => Ok(Some(*id)),
        EndpointRef::Src(src) => {
            let map = match maps.entry(kind) {
                Entry::Occupied(e) => e.into_mut(),
                Entry::Vacant(e) => {
                    e.insert(IdMap::from_id_table(&layout.id_table(kind), kind)?)
                }
            };
            Ok(map.get(src))
        }
    }
}
