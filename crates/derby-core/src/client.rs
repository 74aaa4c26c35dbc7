//! The compute-management client seam.
//!
//! Every remote round trip the tool makes goes through [`ComputeClient`].
//! Calls are blocking and the core never issues more than one at a time.
//! The REST implementation lives in `derby-compute`. Tests use
//! [`crate::testing::MockCompute`].

use std::collections::BTreeMap;

use crate::error::ClientResult;
use crate::types::{InstanceGroupPolicy, InstanceGroupSummary, MetadataStore, Operation, Project};

pub trait ComputeClient {
    /// Fetch a project together with its common instance metadata.
    fn get_project(&self, project_id: &str) -> ClientResult<Project>;

    /// Replace the project's common instance metadata.
    ///
    /// The remote side rejects the write with
    /// [`crate::ClientError::PreconditionFailed`] when `metadata.fingerprint`
    /// is not the store's current fingerprint.
    fn set_common_metadata(&self, project_id: &str, metadata: &MetadataStore)
    -> ClientResult<Operation>;

    /// Fetch a managed instance group's template, versions, and update policy.
    fn get_instance_group_policy(
        &self,
        project_id: &str,
        zone: &str,
        group: &str,
    ) -> ClientResult<InstanceGroupPolicy>;

    /// Patch a managed instance group. The provider starts the rollout
    /// asynchronously. The returned operation only reports acceptance.
    fn patch_instance_group_policy(
        &self,
        project_id: &str,
        zone: &str,
        group: &str,
        policy: &InstanceGroupPolicy,
    ) -> ClientResult<Operation>;

    /// Short references (`zones/{zone}/instances/{name}`) of a group's members.
    fn list_managed_instances(
        &self,
        project_id: &str,
        zone: &str,
        group: &str,
    ) -> ClientResult<Vec<String>>;

    /// All managed instance groups in the project, keyed by scope
    /// (for example `zones/europe-west1-b`). Scopes without groups are omitted.
    fn aggregated_list_instance_groups(
        &self,
        project_id: &str,
    ) -> ClientResult<BTreeMap<String, Vec<InstanceGroupSummary>>>;
}
