//! Domain types for the compute resources rollerderby reads and writes.
//!
//! Field names follow the provider's camelCase JSON. Resources that are
//! read, patched, and written back keep the fields this tool does not
//! interpret in a flattened `extra` map, so a read-modify-write never drops
//! provider state.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{BlankField, CoreError, CoreResult, ValidationError};

// ── Project metadata ───────────────────────────────────────────────

/// One key/value pair of a project's common instance metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetadataItem {
    pub key: String,
    #[serde(default)]
    pub value: String,
}

impl MetadataItem {
    pub fn new(key: &str, value: &str) -> Self {
        Self {
            key: key.to_string(),
            value: value.to_string(),
        }
    }
}

/// A project's common instance metadata: ordered items plus the
/// fingerprint that identifies this exact version of the store.
///
/// Writes must carry the fingerprint observed by the read they are based on.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetadataStore {
    #[serde(default)]
    pub fingerprint: String,
    #[serde(default)]
    pub items: Vec<MetadataItem>,
}

impl MetadataStore {
    pub fn new(fingerprint: &str, items: Vec<MetadataItem>) -> Self {
        Self {
            fingerprint: fingerprint.to_string(),
            items,
        }
    }

    /// Index of `key`. Keys are unique; should the remote ever hand back a
    /// duplicate, the last occurrence is the one that counts.
    pub fn position(&self, key: &str) -> Option<usize> {
        self.items.iter().rposition(|item| item.key == key)
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.position(key).map(|i| self.items[i].value.as_str())
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// A compute project as far as this tool cares about it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    pub name: String,
    #[serde(default)]
    pub common_instance_metadata: MetadataStore,
}

// ── Managed instance groups ────────────────────────────────────────

/// Lowest-impact action the orchestrator may take to move an instance onto
/// a new version.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MinimalAction {
    None,
    Refresh,
    Restart,
    Replace,
}

impl fmt::Display for MinimalAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::None => "NONE",
            Self::Refresh => "REFRESH",
            Self::Restart => "RESTART",
            Self::Replace => "REPLACE",
        };
        f.write_str(s)
    }
}

/// One template version tracked by a managed instance group.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InstanceGroupVersion {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub instance_template: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl InstanceGroupVersion {
    pub fn new(name: &str, instance_template: &str) -> Self {
        Self {
            name: name.to_string(),
            instance_template: instance_template.to_string(),
            extra: Map::new(),
        }
    }
}

/// How the orchestrator rolls a group onto its target version.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdatePolicy {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub minimal_action: Option<MinimalAction>,
    /// Seconds an instance must be observed healthy before the rollout
    /// moves on to the next one.
    #[serde(default)]
    pub min_ready_sec: u32,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// The rollout-relevant view of a managed instance group.
///
/// `versions` is expected to be non-empty; index 0 is the primary version.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InstanceGroupPolicy {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub instance_template: String,
    #[serde(default)]
    pub versions: Vec<InstanceGroupVersion>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub update_policy: Option<UpdatePolicy>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Entry of the project-wide instance group listing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstanceGroupSummary {
    pub name: String,
    /// Zone URL as returned by the provider.
    #[serde(default)]
    pub zone: String,
}

impl InstanceGroupSummary {
    /// Bare zone name, e.g. `europe-west1-b`.
    pub fn zone_name(&self) -> &str {
        last_segment(&self.zone)
    }
}

/// Last path segment of a resource URL.
pub fn last_segment(url: &str) -> &str {
    url.rsplit('/').next().unwrap_or(url)
}

/// Shorten an instance URL to its last four segments
/// (`zones/{zone}/instances/{name}`). Shorter inputs are returned whole.
pub fn short_instance_ref(url: &str) -> String {
    let segments: Vec<&str> = url.split('/').collect();
    let start = segments.len().saturating_sub(4);
    segments[start..].join("/")
}

// ── Operations ─────────────────────────────────────────────────────

/// One structured failure reported inside an operation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OperationErrorEntry {
    #[serde(default)]
    pub code: String,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub location: String,
}

impl OperationErrorEntry {
    pub fn new(code: &str, message: &str, location: &str) -> Self {
        Self {
            code: code.to_string(),
            message: message.to_string(),
            location: location.to_string(),
        }
    }
}

impl fmt::Display for OperationErrorEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.code, self.message)?;
        if !self.location.is_empty() {
            write!(f, " ({})", self.location)?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OperationErrors {
    #[serde(default)]
    pub errors: Vec<OperationErrorEntry>,
}

/// Result of a mutating call.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Operation {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub status: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<OperationErrors>,
}

impl Operation {
    /// Turn a transport-level success into a failure when the operation
    /// carries any error entries.
    pub fn into_result(self) -> CoreResult<Operation> {
        match self.error {
            Some(OperationErrors { errors }) if !errors.is_empty() => {
                Err(CoreError::Operation { errors })
            }
            _ => Ok(self),
        }
    }
}

// ── Rollout request ────────────────────────────────────────────────

/// Inputs of one rolling replacement. Built per invocation, never stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RolloutRequest {
    pub project_id: String,
    pub zone: String,
    pub group_name: String,
    pub min_ready_sec: u32,
}

impl RolloutRequest {
    pub fn new(project_id: &str, zone: &str, group_name: &str, min_ready_sec: u32) -> Self {
        Self {
            project_id: project_id.to_string(),
            zone: zone.to_string(),
            group_name: group_name.to_string(),
            min_ready_sec,
        }
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        ValidationError::new()
            .require(BlankField::ProjectId, &self.project_id)
            .require(BlankField::Zone, &self.zone)
            .require(BlankField::GroupName, &self.group_name)
            .into_result()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn project_decodes_provider_json() {
        let json = r#"{
            "kind": "compute#project",
            "name": "prod-eu",
            "commonInstanceMetadata": {
                "kind": "compute#metadata",
                "fingerprint": "F1",
                "items": [{"key": "a", "value": "1"}, {"key": "b"}]
            }
        }"#;
        let project: Project = serde_json::from_str(json).unwrap();
        assert_eq!(project.name, "prod-eu");
        assert_eq!(project.common_instance_metadata.fingerprint, "F1");
        assert_eq!(project.common_instance_metadata.get("a"), Some("1"));
        assert_eq!(project.common_instance_metadata.get("b"), Some(""));
    }

    #[test]
    fn metadata_store_serializes_fingerprint_and_items_only() {
        let store = MetadataStore::new("F1", vec![MetadataItem::new("a", "1")]);
        let json = serde_json::to_string(&store).unwrap();
        assert_eq!(json, r#"{"fingerprint":"F1","items":[{"key":"a","value":"1"}]}"#);
    }

    #[test]
    fn position_prefers_last_duplicate() {
        let store = MetadataStore::new(
            "F",
            vec![
                MetadataItem::new("a", "1"),
                MetadataItem::new("b", "2"),
                MetadataItem::new("a", "3"),
            ],
        );
        assert_eq!(store.position("a"), Some(2));
        assert_eq!(store.get("a"), Some("3"));
        assert_eq!(store.position("missing"), None);
    }

    #[test]
    fn group_policy_keeps_unknown_fields() {
        let json = r#"{
            "name": "web",
            "instanceTemplate": "global/instanceTemplates/web-7",
            "fingerprint": "abc=",
            "targetSize": 3,
            "versions": [{"name": "v0", "instanceTemplate": "global/instanceTemplates/web-6", "targetSize": {"fixed": 1}}],
            "updatePolicy": {"type": "PROACTIVE", "minimalAction": "NONE", "minReadySec": 0, "maxSurge": {"fixed": 1}}
        }"#;
        let policy: InstanceGroupPolicy = serde_json::from_str(json).unwrap();
        assert_eq!(policy.extra.get("fingerprint"), Some(&Value::from("abc=")));
        assert_eq!(policy.versions[0].extra.len(), 1);
        let update = policy.update_policy.as_ref().unwrap();
        assert_eq!(update.minimal_action, Some(MinimalAction::None));
        assert_eq!(update.extra.get("type"), Some(&Value::from("PROACTIVE")));

        let back = serde_json::to_value(&policy).unwrap();
        assert_eq!(back["targetSize"], 3);
        assert_eq!(back["updatePolicy"]["maxSurge"]["fixed"], 1);
        assert_eq!(back["updatePolicy"]["minimalAction"], "NONE");
    }

    #[test]
    fn operation_with_errors_is_failure() {
        let op: Operation = serde_json::from_str(
            r#"{"name": "op-1", "status": "DONE", "error": {"errors": [
                {"code": "RESOURCE_NOT_READY", "message": "busy", "location": "web"}
            ]}}"#,
        )
        .unwrap();
        match op.into_result() {
            Err(CoreError::Operation { errors }) => {
                assert_eq!(errors, vec![OperationErrorEntry::new("RESOURCE_NOT_READY", "busy", "web")]);
            }
            other => panic!("expected operation error, got {other:?}"),
        }
    }

    #[test]
    fn operation_without_errors_is_success() {
        let op = Operation {
            name: "op-2".to_string(),
            status: "RUNNING".to_string(),
            error: Some(OperationErrors::default()),
        };
        assert!(op.into_result().is_ok());
    }

    #[test]
    fn instance_refs_are_shortened() {
        let url = "https://www.googleapis.com/compute/v1/projects/p/zones/europe-west1-b/instances/web-x1z2";
        assert_eq!(short_instance_ref(url), "zones/europe-west1-b/instances/web-x1z2");
        assert_eq!(short_instance_ref("a/b"), "a/b");
        assert_eq!(last_segment(url), "web-x1z2");
    }

    #[test]
    fn rollout_request_reports_all_blank_fields() {
        let err = RolloutRequest::new("", "", "web", 30).validate().unwrap_err();
        assert_eq!(err.blank_fields(), &[BlankField::ProjectId, BlankField::Zone]);
    }
}
