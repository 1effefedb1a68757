//! Catalog entities: Task, Dataset, Model.
//!
//! Their `itemID` is derived from the kind and the normalized display name, so
//! the same task/dataset/model reported by different sources merges into one
//! node.

use serde::{Deserialize, Serialize};

use crate::ids::entity_id;
use crate::nodes::{or_none, EntityKind, GraphNode, NodeMeta};
use crate::taxonomy::{CategorySet, ModalitySet};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskNode {
    pub meta: NodeMeta,
    pub modality: ModalitySet,
    pub category: CategorySet,
    pub description: String,
}

impl TaskNode {
    pub fn new(
        name: &str,
        source: &str,
        src_id: &str,
        modality: ModalitySet,
        category: CategorySet,
        description: Option<&str>,
    ) -> Self {
        Self {
            meta: NodeMeta::new(entity_id(EntityKind::Task, name), name, source, src_id),
            modality,
            category,
            description: or_none(description),
        }
    }
}

impl GraphNode for TaskNode {
    const KIND: EntityKind = EntityKind::Task;

    fn meta(&self) -> &NodeMeta {
        &self.meta
    }

    fn extra_values(&self) -> Vec<String> {
        vec![
            self.modality.to_string(),
            self.category.to_string(),
            self.description.clone(),
        ]
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatasetNode {
    pub meta: NodeMeta,
    pub modality: ModalitySet,
    pub category: CategorySet,
    pub description: String,
    pub url: String,
}

impl DatasetNode {
    pub fn new(
        name: &str,
        source: &str,
        src_id: &str,
        modality: ModalitySet,
        category: CategorySet,
        description: Option<&str>,
        url: Option<&str>,
    ) -> Self {
        Self {
            meta: NodeMeta::new(entity_id(EntityKind::Dataset, name), name, source, src_id),
            modality,
            category,
            description: or_none(description),
            url: or_none(url),
        }
    }
}

impl GraphNode for DatasetNode {
    const KIND: EntityKind = EntityKind::Dataset;

    fn meta(&self) -> &NodeMeta {
        &self.meta
    }

    fn extra_values(&self) -> Vec<String> {
        vec![
            self.modality.to_string(),
            self.category.to_string(),
            self.description.clone(),
            self.url.clone(),
        ]
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelNode {
    pub meta: NodeMeta,
    pub model_class: String,
    pub description: String,
    pub url: String,
}

impl ModelNode {
    pub fn new(
        name: &str,
        source: &str,
        src_id: &str,
        model_class: Option<&str>,
        description: Option<&str>,
        url: Option<&str>,
    ) -> Self {
        Self {
            meta: NodeMeta::new(entity_id(EntityKind::Model, name), name, source, src_id),
            model_class: or_none(model_class),
            description: or_none(description),
            url: or_none(url),
        }
    }
}

impl GraphNode for ModelNode {
    const KIND: EntityKind = EntityKind::Model;

    fn meta(&self) -> &NodeMeta {
        &self.meta
    }

    fn extra_values(&self) -> Vec<String> {
        vec![
            self.model_class.clone(),
            self.description.clone(),
            self.url.clone(),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::taxonomy::Classifier;

    #[test]
    fn task_row_lines_up_with_fields() {
        let (modality, category) = Classifier::default().classify_text("image classification");
        let task = TaskNode::new(
            "Image classification",
            "pwc",
            "image-classification",
            modality,
            category,
            None,
        );
        let row = task.to_row();
        assert_eq!(row.values.len(), EntityKind::Task.fields().len());
        assert_eq!(row.get("modality"), Some("image"));
        assert_eq!(row.get("category"), Some("classification"));
        assert_eq!(row.get("description"), Some("none"));
        assert_eq!(row.src_id(), "image-classification");
    }

    #[test]
    fn datasets_merge_across_sources_by_name() {
        let a = DatasetNode::new(
            "ImageNet",
            "pwc",
            "imagenet",
            ModalitySet::new(),
            CategorySet::default(),
            None,
            None,
        );
        let b = DatasetNode::new(
            "imagenet",
            "huggingface",
            "ILSVRC/imagenet-1k",
            ModalitySet::new(),
            CategorySet::default(),
            Some("1000 classes"),
            None,
        );
        assert_eq!(a.meta.item_id, b.meta.item_id);
        assert_ne!(a.meta.source, b.meta.source);
    }

    #[test]
    fn model_defaults_to_sentinels() {
        let model = ModelNode::new("resnet50", "huggingface", "microsoft/resnet-50", None, None, None);
        let row = model.to_row();
        assert_eq!(row.get("modelClass"), Some("none"));
        assert_eq!(row.get("url"), Some("none"));
    }

    #[test]
    fn serde_roundtrip() {
        let model = ModelNode::new("bert", "huggingface", "bert-base", Some("bert"), None, None);
        let json = serde_json::to_string(&model).unwrap();
        let back: ModelNode = serde_json::from_str(&json).unwrap();
        assert_eq!(back, model);
    }
}
