//! Response envelopes that only exist on the wire.

use std::collections::BTreeMap;

use derby_core::InstanceGroupSummary;
use serde::Deserialize;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ManagedInstancesPage {
    #[serde(default)]
    pub managed_instances: Vec<ManagedInstance>,
    pub next_page_token: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ManagedInstance {
    #[serde(default)]
    pub instance: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct AggregatedGroupsPage {
    #[serde(default)]
    pub items: BTreeMap<String, ScopedGroups>,
    pub next_page_token: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ScopedGroups {
    #[serde(default)]
    pub instance_group_managers: Vec<InstanceGroupSummary>,
}

/// `{"error": {"code": 404, "message": "..."}}`
#[derive(Debug, Deserialize)]
pub(crate) struct ErrorEnvelope {
    pub error: ErrorBody,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ErrorBody {
    #[serde(default)]
    pub message: String,
}

/// Human-readable message of an error response, falling back to the raw body.
pub(crate) fn error_message(body: &str) -> String {
    match serde_json::from_str::<ErrorEnvelope>(body) {
        Ok(envelope) if !envelope.error.message.is_empty() => envelope.error.message,
        _ => body.trim().to_string(),
    }
}
