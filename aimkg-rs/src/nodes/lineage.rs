//! Lineage entities: Pipeline, Stage, Execution, Artifact, Metric.
//!
//! These have no name of their own in any source; their canonical keys are
//! composed from the entities they connect, so a `(task, model)` pair always
//! yields the same Pipeline and a `(pipeline, stage, dataset)` triple the same
//! Execution/Artifact pair.

use serde::{Deserialize, Serialize};

use crate::ids::item_id;
use crate::nodes::{EntityKind, GraphNode, NodeMeta, NONE_SENTINEL};
use crate::utils::canonical_name;

/// Source-native key of an execution or artifact: `"{model}|{dataset}"`.
pub fn run_src_id(model_src: &str, dataset_ref: Option<&str>) -> String {
    format!("{model_src}|{}", dataset_ref.unwrap_or(NONE_SENTINEL))
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PipelineNode {
    pub meta: NodeMeta,
    pub task: String,
    pub model: String,
}

impl PipelineNode {
    /// `task` and `model` are display names; the pipeline is named
    /// `"{task} using {model}"`.
    pub fn new(task: &str, model: &str, source: &str, model_src: &str) -> Self {
        let name = format!("{task} using {model}");
        let key = format!("pipeline:{}", canonical_name(&name));
        Self {
            meta: NodeMeta::new(item_id(&key), name, source, model_src),
            task: task.to_string(),
            model: model.to_string(),
        }
    }
}

impl GraphNode for PipelineNode {
    const KIND: EntityKind = EntityKind::Pipeline;

    fn meta(&self) -> &NodeMeta {
        &self.meta
    }

    fn extra_values(&self) -> Vec<String> {
        vec![self.task.clone(), self.model.clone()]
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StageNode {
    pub meta: NodeMeta,
    pub pipeline: String,
}

impl StageNode {
    pub fn new(pipeline: &PipelineNode, stage: &str) -> Self {
        let key = format!(
            "stage:{} stage {}",
            canonical_name(&pipeline.meta.name),
            canonical_name(stage)
        );
        Self {
            meta: NodeMeta::new(
                item_id(&key),
                stage,
                pipeline.meta.source.as_str(),
                pipeline.meta.src_id.as_str(),
            ),
            pipeline: pipeline.meta.name.clone(),
        }
    }

    /// Canonical key fragment shared by the stage's executions.
    fn execution_prefix(&self) -> String {
        format!(
            "{}-{}",
            canonical_name(&self.pipeline),
            canonical_name(&self.meta.name)
        )
    }
}

impl GraphNode for StageNode {
    const KIND: EntityKind = EntityKind::Stage;

    fn meta(&self) -> &NodeMeta {
        &self.meta
    }

    fn extra_values(&self) -> Vec<String> {
        vec![self.pipeline.clone()]
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutionNode {
    pub meta: NodeMeta,
    pub stage: String,
    pub dataset: String,
}

impl ExecutionNode {
    /// One run of `stage` against `dataset_ref`, or against the `"none"`
    /// sentinel when the model has no dataset association.
    pub fn new(stage: &StageNode, model_src: &str, dataset_ref: Option<&str>) -> Self {
        let dataset = dataset_ref.unwrap_or(NONE_SENTINEL);
        let name = format!("{}-{}", stage.execution_prefix(), canonical_name(dataset));
        Self {
            meta: NodeMeta::new(
                item_id(&format!("execution:{name}")),
                name,
                stage.meta.source.as_str(),
                run_src_id(model_src, dataset_ref),
            ),
            stage: stage.meta.name.clone(),
            dataset: dataset.to_string(),
        }
    }
}

impl GraphNode for ExecutionNode {
    const KIND: EntityKind = EntityKind::Execution;

    fn meta(&self) -> &NodeMeta {
        &self.meta
    }

    fn extra_values(&self) -> Vec<String> {
        vec![self.stage.clone(), self.dataset.clone()]
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArtifactNode {
    pub meta: NodeMeta,
    pub dataset: String,
    pub model: String,
}

impl ArtifactNode {
    /// The single artifact of `execution`.
    pub fn new(execution: &ExecutionNode, model: &str) -> Self {
        let key = format!("artifact:execution:{}", execution.meta.name);
        Self {
            meta: NodeMeta::new(
                item_id(&key),
                format!("{} artifacts", execution.meta.name),
                execution.meta.source.as_str(),
                execution.meta.src_id.as_str(),
            ),
            dataset: execution.dataset.clone(),
            model: model.to_string(),
        }
    }
}

impl GraphNode for ArtifactNode {
    const KIND: EntityKind = EntityKind::Artifact;

    fn meta(&self) -> &NodeMeta {
        &self.meta
    }

    fn extra_values(&self) -> Vec<String> {
        vec![self.dataset.clone(), self.model.clone()]
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetricNode {
    pub meta: NodeMeta,
    pub metric: String,
    pub value: String,
}

impl MetricNode {
    /// A reported `metric = value` of `model_src` on `dataset_ref`; named
    /// `"{metric}:{value}"`.
    pub fn new(
        source: &str,
        model_src: &str,
        dataset_ref: Option<&str>,
        metric: &str,
        value: &str,
    ) -> Self {
        let dataset = dataset_ref.unwrap_or(NONE_SENTINEL);
        let key = format!(
            "metric:{}|{}|{}|{}",
            canonical_name(model_src),
            canonical_name(dataset),
            canonical_name(metric),
            value.trim()
        );
        Self {
            meta: NodeMeta::new(
                item_id(&key),
                format!("{metric}:{value}"),
                source,
                format!("{}|{metric}", run_src_id(model_src, dataset_ref)),
            ),
            metric: metric.to_string(),
            value: value.to_string(),
        }
    }
}

impl GraphNode for MetricNode {
    const KIND: EntityKind = EntityKind::Metric;

    fn meta(&self) -> &NodeMeta {
        &self.meta
    }

    fn extra_values(&self) -> Vec<String> {
        vec![self.metric.clone(), self.value.clone()]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pipeline() -> PipelineNode {
        PipelineNode::new("Image classification", "resnet50", "huggingface", "microsoft/resnet-50")
    }

    #[test]
    fn pipeline_identity_is_task_and_model() {
        let a = pipeline();
        let b = PipelineNode::new("image  classification", "ResNet50", "pwc", "resnet50");
        assert_eq!(a.meta.item_id, b.meta.item_id);
        assert_eq!(a.meta.name, "Image classification using resnet50");

        let other = PipelineNode::new("Object detection", "resnet50", "huggingface", "x");
        assert_ne!(a.meta.item_id, other.meta.item_id);
    }

    #[test]
    fn executions_differ_per_dataset() {
        let stage = StageNode::new(&pipeline(), "evaluation");
        let on_imagenet = ExecutionNode::new(&stage, "microsoft/resnet-50", Some("imagenet"));
        let on_cifar = ExecutionNode::new(&stage, "microsoft/resnet-50", Some("cifar10"));
        let on_none = ExecutionNode::new(&stage, "microsoft/resnet-50", None);
        assert_ne!(on_imagenet.meta.item_id, on_cifar.meta.item_id);
        assert_eq!(on_none.dataset, "none");
        assert_eq!(on_none.meta.src_id, "microsoft/resnet-50|none");
    }

    #[test]
    fn artifact_follows_its_execution() {
        let stage = StageNode::new(&pipeline(), "evaluation");
        let exec = ExecutionNode::new(&stage, "microsoft/resnet-50", Some("imagenet"));
        let a = ArtifactNode::new(&exec, "resnet50");
        let b = ArtifactNode::new(&exec, "resnet50");
        assert_eq!(a.meta.item_id, b.meta.item_id);
        assert_ne!(a.meta.item_id, exec.meta.item_id);
        assert_eq!(a.meta.src_id, exec.meta.src_id);
    }

    #[test]
    fn metric_name_is_metric_colon_value() {
        let m = MetricNode::new("pwc", "resnet50", Some("imagenet"), "Top-1 Accuracy", "76.1");
        assert_eq!(m.meta.name, "Top-1 Accuracy:76.1");
        assert_eq!(m.to_row().get("value"), Some("76.1"));
    }
}
