//! Rollout controller: stamps a new version and triggers replacement.
//!
//! A rollout is one read-patch round trip: read the group, overwrite
//! `versions[0]` with a fresh version of the current template, force the
//! `REPLACE` minimal action with the caller's min-ready duration, and submit.
//! The group always tracks exactly one target version, so version history
//! never grows. Completion is left to the provider's orchestrator.

use derby_core::{
    Clock, ComputeClient, CoreError, CoreResult, InstanceGroupPolicy, InstanceGroupVersion,
    MinimalAction, Operation, RolloutRequest, UpdatePolicy,
};
use tracing::{debug, info, warn};

use crate::version::next_version;

/// What an accepted rollout looks like from the caller's side.
#[derive(Debug, Clone, PartialEq)]
pub struct RolloutReceipt {
    pub group: String,
    pub zone: String,
    pub version: InstanceGroupVersion,
    pub min_ready_sec: u32,
    pub operation: Operation,
}

/// Point the primary version slot at `version` and force a replace rollout.
///
/// The versions list keeps its length. Prior update-policy values are
/// overwritten; an absent update policy is created.
pub fn apply_rollout(
    group: &str,
    policy: &mut InstanceGroupPolicy,
    version: InstanceGroupVersion,
    min_ready_sec: u32,
) -> CoreResult<()> {
    let Some(primary) = policy.versions.first_mut() else {
        return Err(CoreError::EmptyVersions {
            group: group.to_string(),
        });
    };
    *primary = version;

    let update = policy.update_policy.get_or_insert_with(UpdatePolicy::default);
    update.minimal_action = Some(MinimalAction::Replace);
    update.min_ready_sec = min_ready_sec;
    Ok(())
}

/// Initiates rolling replacements of managed instance groups.
pub struct RolloutController<'a> {
    client: &'a dyn ComputeClient,
    clock: &'a dyn Clock,
}

impl<'a> RolloutController<'a> {
    pub fn new(client: &'a dyn ComputeClient, clock: &'a dyn Clock) -> Self {
        Self { client, clock }
    }

    /// Move the group onto a new version of its current template and ask
    /// the provider to replace every instance.
    ///
    /// Returns once the patch is accepted. Does not wait for the rollout.
    pub fn rolling_replace(&self, request: &RolloutRequest) -> CoreResult<RolloutReceipt> {
        request.validate()?;
        let RolloutRequest {
            project_id,
            zone,
            group_name,
            min_ready_sec,
        } = request;

        let mut policy = self
            .client
            .get_instance_group_policy(project_id, zone, group_name)
            .map_err(|source| CoreError::RemoteRead {
                resource: format!("instance group {group_name} in {zone}"),
                source,
            })?;
        debug!(
            group = %group_name,
            template = %policy.instance_template,
            versions = policy.versions.len(),
            "read instance group policy"
        );

        let previous = policy.versions.first().map(|v| v.name.clone());
        let version = next_version(&policy, self.clock.unix_seconds());
        apply_rollout(group_name, &mut policy, version.clone(), *min_ready_sec)?;
        info!(
            project = %project_id,
            %zone,
            group = %group_name,
            version = %version.name,
            template = %version.instance_template,
            ?previous,
            min_ready_sec,
            "starting rolling replace"
        );

        let operation = self
            .client
            .patch_instance_group_policy(project_id, zone, group_name, &policy)
            .map_err(|source| CoreError::RemoteWrite {
                resource: format!("instance group {group_name} in {zone}"),
                source,
            })?
            .into_result()
            .inspect_err(|err| {
                if let CoreError::Operation { errors } = err {
                    for e in errors {
                        warn!(
                            code = %e.code,
                            message = %e.message,
                            location = %e.location,
                            "rollout operation error"
                        );
                    }
                }
            })?;

        info!(group = %group_name, operation = %operation.name, "replacing group");
        Ok(RolloutReceipt {
            group: group_name.clone(),
            zone: zone.clone(),
            version,
            min_ready_sec: *min_ready_sec,
            operation,
        })
    }
}
