//! Post-Enrichment Passes.
//!
//! Both passes read the assembled graph and only overwrite `modality` and
//! `description` properties; they never add or remove nodes or relationships.
//! They must run in order: the dataset pass reads task modalities the
//! taxonomy pass may have just filled in.

use std::collections::BTreeMap;

use tracing::{debug, info};

use crate::driver::{GraphStore, PropertyUpdate};
use crate::errors::Result;
use crate::nodes::{EntityKind, NONE_SENTINEL};
use crate::source::TaskTaxonomy;
use crate::taxonomy::{Classifier, ModalitySet};
use crate::utils::strip_interchange_chars;

fn is_unset(value: Option<&str>) -> bool {
    match value.map(str::trim) {
        None => true,
        Some(v) => v.is_empty() || v == NONE_SENTINEL,
    }
}

/// Pass 1: fill empty Task modality/description from the external taxonomy,
/// keyed by the task's `srcID`. The modality comes from classifying the
/// task's research area name. Returns the number of tasks updated.
pub async fn task_taxonomy_pass<S: GraphStore>(
    store: &S,
    classifier: &Classifier,
    taxonomy: &TaskTaxonomy,
) -> Result<usize> {
    if taxonomy.is_empty() {
        info!("task taxonomy empty, skipping enrichment");
        return Ok(0);
    }
    let tasks = store.nodes(EntityKind::Task, None).await?;
    let mut updates = Vec::new();
    for task in &tasks {
        let (Some(item_id), Some(entry)) = (
            task.item_id(),
            task.property("srcID").and_then(|src| taxonomy.get(src)),
        ) else {
            continue;
        };
        let mut properties = BTreeMap::new();
        if is_unset(task.property("modality")) {
            if let Some(area) = entry.area.as_deref() {
                let (modality, _) = classifier.classify_text(area);
                if !modality.is_empty() {
                    properties.insert("modality".to_string(), modality.to_string());
                }
            }
        }
        if is_unset(task.property("description")) {
            if let Some(description) = entry.description.as_deref().filter(|d| !d.trim().is_empty())
            {
                properties.insert(
                    "description".to_string(),
                    strip_interchange_chars(description.trim()),
                );
            }
        }
        if !properties.is_empty() {
            debug!(task = task.name(), ?properties, "taxonomy fills task");
            updates.push(PropertyUpdate {
                item_id,
                properties,
            });
        }
    }
    let updated = store.update_properties(EntityKind::Task, &updates).await?;
    info!(candidates = tasks.len(), updated, "task taxonomy pass done");
    Ok(updated)
}

/// Pass 2: set every Dataset's modality to the union of the modalities of the
/// Tasks reachable from it, then apply the multimodal rule. Datasets whose
/// tasks carry no modality keep their own. Returns the number updated.
pub async fn dataset_modality_pass<S: GraphStore>(
    store: &S,
    classifier: &Classifier,
) -> Result<usize> {
    let reachable = store.task_modalities_by_dataset().await?;
    let mut updates = Vec::new();
    for (dataset, modalities) in reachable {
        let mut union = ModalitySet::new();
        for m in &modalities {
            union.extend(&ModalitySet::parse_lenient(m));
        }
        if union.is_empty() {
            continue;
        }
        union.apply_rule(classifier.rule());
        updates.push(PropertyUpdate {
            item_id: dataset,
            properties: BTreeMap::from([("modality".to_string(), union.to_string())]),
        });
    }
    let updated = store.update_properties(EntityKind::Dataset, &updates).await?;
    info!(updated, "dataset modality pass done");
    Ok(updated)
}
