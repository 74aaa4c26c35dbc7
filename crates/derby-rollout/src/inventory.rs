//! Read-only view of a project's managed instance groups.

use derby_core::{BlankField, ComputeClient, CoreError, CoreResult, ValidationError};
use serde::Serialize;
use tracing::debug;

/// One managed instance group and its current members.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GroupInventory {
    /// Aggregation scope the group was listed under, e.g. `zones/europe-west1-b`.
    pub scope: String,
    pub group: String,
    pub zone: String,
    /// Short instance references (`zones/{zone}/instances/{name}`).
    pub instances: Vec<String>,
}

/// List every managed instance group in the project with its instances,
/// ordered by scope.
pub fn group_inventory(client: &dyn ComputeClient, project_id: &str) -> CoreResult<Vec<GroupInventory>> {
    ValidationError::new()
        .require(BlankField::ProjectId, project_id)
        .into_result()?;

    let scopes = client
        .aggregated_list_instance_groups(project_id)
        .map_err(|source| CoreError::RemoteRead {
            resource: format!("instance groups of project {project_id}"),
            source,
        })?;

    let mut inventory = Vec::new();
    for (scope, groups) in scopes {
        for summary in groups {
            let zone = summary.zone_name().to_string();
            let instances = client
                .list_managed_instances(project_id, &zone, &summary.name)
                .map_err(|source| CoreError::RemoteRead {
                    resource: format!("instances of group {} in {zone}", summary.name),
                    source,
                })?;
            debug!(%scope, group = %summary.name, count = instances.len(), "listed managed instances");
            inventory.push(GroupInventory {
                scope: scope.clone(),
                group: summary.name,
                zone,
                instances,
            });
        }
    }
    Ok(inventory)
}
