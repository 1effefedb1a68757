//! Framework and Report nodes attached to pipelines.

use serde::{Deserialize, Serialize};

use crate::ids::entity_id;
use crate::nodes::{or_none, EntityKind, GraphNode, NodeMeta};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FrameworkNode {
    pub meta: NodeMeta,
}

impl FrameworkNode {
    pub fn new(name: &str, source: &str) -> Self {
        Self {
            meta: NodeMeta::new(entity_id(EntityKind::Framework, name), name, source, name),
        }
    }
}

impl GraphNode for FrameworkNode {
    const KIND: EntityKind = EntityKind::Framework;

    fn meta(&self) -> &NodeMeta {
        &self.meta
    }

    fn extra_values(&self) -> Vec<String> {
        Vec::new()
    }
}

/// A paper or report describing a pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportNode {
    pub meta: NodeMeta,
    pub url: String,
    pub summary: String,
}

impl ReportNode {
    pub fn new(
        title: &str,
        source: &str,
        src_id: &str,
        url: Option<&str>,
        summary: Option<&str>,
    ) -> Self {
        Self {
            meta: NodeMeta::new(entity_id(EntityKind::Report, title), title, source, src_id),
            url: or_none(url),
            summary: or_none(summary),
        }
    }
}

impl GraphNode for ReportNode {
    const KIND: EntityKind = EntityKind::Report;

    fn meta(&self) -> &NodeMeta {
        &self.meta
    }

    fn extra_values(&self) -> Vec<String> {
        vec![self.url.clone(), self.summary.clone()]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn framework_has_only_common_fields() {
        let row = FrameworkNode::new("pytorch", "huggingface").to_row();
        assert_eq!(row.values.len(), 4);
        assert_eq!(row.src_id(), "pytorch");
    }

    #[test]
    fn report_abstract_column() {
        let row = ReportNode::new(
            "Deep Residual Learning",
            "pwc",
            "deep-residual-learning",
            Some("https://arxiv.org/abs/1512.03385"),
            None,
        )
        .to_row();
        assert_eq!(row.get("abstract"), Some("none"));
        assert_eq!(row.get("url"), Some("https://arxiv.org/abs/1512.03385"));
    }
}
