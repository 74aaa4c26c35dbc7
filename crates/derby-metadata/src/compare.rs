//! Side-by-side comparison of two projects' common metadata.

use std::collections::BTreeMap;

use derby_core::{BlankField, ComputeClient, CoreResult, MetadataItem, MetadataStore, ValidationError};
use serde::Serialize;
use tracing::warn;

use crate::sync::read_project;

/// Values of one key in project A and project B.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CompareEntry {
    pub a: Option<String>,
    pub b: Option<String>,
}

impl CompareEntry {
    pub fn is_equal(&self) -> bool {
        self.a == self.b
    }
}

/// Read both projects and line their metadata up by key.
pub fn compare_projects(
    client: &dyn ComputeClient,
    project_a: &str,
    project_b: &str,
) -> CoreResult<BTreeMap<String, CompareEntry>> {
    ValidationError::new()
        .require(BlankField::ProjectId, project_a)
        .require(BlankField::CompareProjectId, project_b)
        .into_result()?;

    let a = read_project(client, project_a)?;
    let b = read_project(client, project_b)?;
    Ok(diff_stores(&a.common_instance_metadata, &b.common_instance_metadata))
}

/// Key-ordered union of both stores.
pub fn diff_stores(a: &MetadataStore, b: &MetadataStore) -> BTreeMap<String, CompareEntry> {
    let mut keys: BTreeMap<String, CompareEntry> = BTreeMap::new();
    for item in &a.items {
        let previous = keys.insert(
            item.key.clone(),
            CompareEntry {
                a: Some(item.value.clone()),
                b: None,
            },
        );
        if previous.is_some() {
            warn!(key = %item.key, "duplicate key in first project's metadata");
        }
    }
    for item in &b.items {
        keys.entry(item.key.clone()).or_default().b = Some(item.value.clone());
    }
    keys
}

/// Items ordered by key, for listing.
pub fn sorted_items(store: &MetadataStore) -> Vec<&MetadataItem> {
    let mut items: Vec<&MetadataItem> = store.items.iter().collect();
    items.sort_by(|x, y| x.key.cmp(&y.key));
    items
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn diff_lines_up_keys_from_both_sides() {
        let a = MetadataStore::new(
            "A",
            vec![MetadataItem::new("image", "v7"), MetadataItem::new("only-a", "x")],
        );
        let b = MetadataStore::new(
            "B",
            vec![MetadataItem::new("image", "v7"), MetadataItem::new("only-b", "y")],
        );

        let diff = diff_stores(&a, &b);
        let keys: Vec<&str> = diff.keys().map(String::as_str).collect();
        assert_eq!(keys, ["image", "only-a", "only-b"]);
        assert!(diff["image"].is_equal());
        assert_eq!(diff["only-a"], CompareEntry { a: Some("x".into()), b: None });
        assert!(!diff["only-b"].is_equal());
    }

    #[test]
    fn duplicate_in_first_project_keeps_last_value() {
        let a = MetadataStore::new(
            "A",
            vec![MetadataItem::new("k", "1"), MetadataItem::new("k", "2")],
        );
        let diff = diff_stores(&a, &MetadataStore::default());
        assert_eq!(diff["k"].a.as_deref(), Some("2"));
    }

    #[test]
    fn sorted_items_orders_by_key() {
        let store = MetadataStore::new(
            "F",
            vec![MetadataItem::new("b", "2"), MetadataItem::new("a", "1")],
        );
        let keys: Vec<&str> = sorted_items(&store).iter().map(|i| i.key.as_str()).collect();
        assert_eq!(keys, ["a", "b"]);
        assert_eq!(store.items[0].key, "b");
    }
}
