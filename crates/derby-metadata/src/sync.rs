//! The metadata update pipeline.
//!
//! validate → read project → snapshot → apply key → submit → check operation.
//! Each step either succeeds or ends the pipeline with a typed error.

use derby_core::{Clock, ComputeClient, CoreError, CoreResult, Operation, Project};
use tracing::info;

use crate::mutation::{KeyChange, set_key, validate_update};
use crate::snapshot::{SnapshotArtifact, SnapshotSink, snapshot_name};

/// Everything a successful `update_key` did.
#[derive(Debug, Clone, PartialEq)]
pub struct UpdateOutcome {
    pub project: String,
    pub snapshot: SnapshotArtifact,
    pub change: KeyChange,
    pub operation: Operation,
}

/// Sets one project metadata key at a time, snapshotting the store first.
pub struct MetadataSynchronizer<'a> {
    client: &'a dyn ComputeClient,
    sink: &'a dyn SnapshotSink,
    clock: &'a dyn Clock,
}

impl<'a> MetadataSynchronizer<'a> {
    pub fn new(
        client: &'a dyn ComputeClient,
        sink: &'a dyn SnapshotSink,
        clock: &'a dyn Clock,
    ) -> Self {
        Self {
            client,
            sink,
            clock,
        }
    }

    /// Set `key` to `value` in the project's common metadata.
    ///
    /// No remote call is made if validation fails, and no mutation is
    /// submitted unless the snapshot was durably written.
    pub fn update_key(&self, project_id: &str, key: &str, value: &str) -> CoreResult<UpdateOutcome> {
        validate_update(project_id, key, value)?;

        let project = read_project(self.client, project_id)?;
        let store = &project.common_instance_metadata;
        info!(
            project = %project.name,
            fingerprint = %store.fingerprint,
            items = store.len(),
            "read project metadata"
        );

        let name = snapshot_name(&project.name, self.clock.unix_seconds());
        let snapshot = self.sink.persist(&name, store)?;
        info!(path = %snapshot.path.display(), "wrote current metadata snapshot");

        let (change, operation) = set_key(self.client, &project.name, store, key, value)?;
        info!(
            project = %project.name,
            operation = %operation.name,
            status = %operation.status,
            "metadata update submitted"
        );

        Ok(UpdateOutcome {
            project: project.name,
            snapshot,
            change,
            operation,
        })
    }
}

/// Fetch a project, mapping transport failures to `RemoteRead`.
pub(crate) fn read_project(client: &dyn ComputeClient, project_id: &str) -> CoreResult<Project> {
    client
        .get_project(project_id)
        .map_err(|source| CoreError::RemoteRead {
            resource: format!("project {project_id}"),
            source,
        })
}
