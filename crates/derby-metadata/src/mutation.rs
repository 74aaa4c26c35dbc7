//! Single-key mutation of a metadata store.
//!
//! The remote API only accepts whole-store replacement, so one key update
//! is a read-modify-write of the complete item list. The write carries the
//! fingerprint captured at read time; a concurrent external writer makes
//! the remote side reject it.

use derby_core::{
    BlankField, ClientError, ComputeClient, CoreError, CoreResult, MetadataItem, MetadataStore,
    Operation, ValidationError,
};
use tracing::info;

/// What `apply_key` did to the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeyChange {
    /// The key existed; its value was replaced in place.
    Updated { previous: String },
    /// The key was absent and has been appended.
    Inserted,
}

/// Reject blank inputs, naming every blank field at once.
pub fn validate_update(project_id: &str, key: &str, value: &str) -> Result<(), ValidationError> {
    ValidationError::new()
        .require(BlankField::ProjectId, project_id)
        .require(BlankField::Key, key)
        .require(BlankField::Value, value)
        .into_result()
}

/// Set `key` to `value` in place. Order is insertion order: an existing key
/// keeps its position, a new key goes to the end.
pub fn apply_key(store: &mut MetadataStore, key: &str, value: &str) -> KeyChange {
    match store.position(key) {
        Some(i) => {
            let previous = std::mem::replace(&mut store.items[i].value, value.to_string());
            KeyChange::Updated { previous }
        }
        None => {
            store.items.push(MetadataItem::new(key, value));
            KeyChange::Inserted
        }
    }
}

/// Apply one key change to a copy of `store` and submit the full item list
/// bound to `store.fingerprint`.
pub fn set_key(
    client: &dyn ComputeClient,
    project: &str,
    store: &MetadataStore,
    key: &str,
    value: &str,
) -> CoreResult<(KeyChange, Operation)> {
    validate_update(project, key, value)?;

    let mut next = store.clone();
    let change = apply_key(&mut next, key, value);
    match &change {
        KeyChange::Updated { previous } => {
            info!(%project, %key, from = %previous, to = %value, "updating metadata key");
        }
        KeyChange::Inserted => {
            info!(%project, %key, from = "<EMPTY>", to = %value, "adding metadata key");
        }
    }

    let op = client
        .set_common_metadata(project, &next)
        .map_err(|err| match err {
            ClientError::PreconditionFailed(message) => CoreError::OptimisticConcurrency {
                project: project.to_string(),
                fingerprint: next.fingerprint.clone(),
                message,
            },
            source => CoreError::RemoteWrite {
                resource: format!("common metadata of project {project}"),
                source,
            },
        })?;

    let op = op.into_result()?;
    Ok((change, op))
}
