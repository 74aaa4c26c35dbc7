//! In-memory test doubles for the compute client and the clock.
//!
//! `MockCompute` behaves like the remote service where it matters: metadata
//! writes are fingerprint-checked and bump the fingerprint on success. Every
//! call is recorded so tests can assert what did (and did not) reach the
//! remote side.

use std::collections::{BTreeMap, HashMap};
use std::sync::{Mutex, MutexGuard, PoisonError};

use crate::client::ComputeClient;
use crate::clock::Clock;
use crate::error::{ClientError, ClientResult};
use crate::types::*;

/// A clock pinned to one instant.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub u64);

impl Clock for FixedClock {
    fn unix_seconds(&self) -> u64 {
        self.0
    }
}

/// A call observed by [`MockCompute`].
#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    GetProject {
        project: String,
    },
    SetCommonMetadata {
        project: String,
        metadata: MetadataStore,
    },
    GetInstanceGroupPolicy {
        project: String,
        zone: String,
        group: String,
    },
    PatchInstanceGroupPolicy {
        project: String,
        zone: String,
        group: String,
        policy: InstanceGroupPolicy,
    },
    ListManagedInstances {
        project: String,
        zone: String,
        group: String,
    },
    AggregatedListInstanceGroups {
        project: String,
    },
}

impl Call {
    /// Whether this call changes remote state.
    pub fn is_mutation(&self) -> bool {
        matches!(
            self,
            Self::SetCommonMetadata { .. } | Self::PatchInstanceGroupPolicy { .. }
        )
    }
}

type GroupKey = (String, String, String);

#[derive(Default)]
pub struct MockCompute {
    projects: Mutex<HashMap<String, Project>>,
    groups: Mutex<HashMap<GroupKey, InstanceGroupPolicy>>,
    instances: Mutex<HashMap<GroupKey, Vec<String>>>,
    operation_errors: Mutex<Vec<OperationErrorEntry>>,
    read_failure: Mutex<Option<ClientError>>,
    write_failure: Mutex<Option<ClientError>>,
    concurrent_writer: Mutex<bool>,
    writes: Mutex<u64>,
    calls: Mutex<Vec<Call>>,
}

fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(PoisonError::into_inner)
}

fn group_key(project: &str, zone: &str, group: &str) -> GroupKey {
    (project.to_string(), zone.to_string(), group.to_string())
}

impl MockCompute {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_project(self, project: Project) -> Self {
        lock(&self.projects).insert(project.name.clone(), project);
        self
    }

    pub fn with_group(self, project: &str, zone: &str, policy: InstanceGroupPolicy) -> Self {
        let key = group_key(project, zone, &policy.name);
        lock(&self.groups).insert(key, policy);
        self
    }

    pub fn with_instances(self, project: &str, zone: &str, group: &str, refs: &[&str]) -> Self {
        let refs = refs.iter().map(|r| r.to_string()).collect();
        lock(&self.instances).insert(group_key(project, zone, group), refs);
        self
    }

    /// Make every read fail with `err`.
    pub fn fail_reads(self, err: ClientError) -> Self {
        *lock(&self.read_failure) = Some(err);
        self
    }

    /// Make every mutating call fail at the transport level with `err`.
    pub fn fail_writes(self, err: ClientError) -> Self {
        *lock(&self.write_failure) = Some(err);
        self
    }

    /// Mutating calls are accepted but the returned operation carries `errors`.
    pub fn fail_operations_with(self, errors: Vec<OperationErrorEntry>) -> Self {
        *lock(&self.operation_errors) = errors;
        self
    }

    /// Simulate an external writer that changes project metadata right after
    /// each `get_project` returns.
    pub fn with_concurrent_writer(self) -> Self {
        *lock(&self.concurrent_writer) = true;
        self
    }

    pub fn calls(&self) -> Vec<Call> {
        lock(&self.calls).clone()
    }

    pub fn mutations(&self) -> Vec<Call> {
        self.calls().into_iter().filter(Call::is_mutation).collect()
    }

    pub fn project(&self, name: &str) -> Option<Project> {
        lock(&self.projects).get(name).cloned()
    }

    pub fn group(&self, project: &str, zone: &str, group: &str) -> Option<InstanceGroupPolicy> {
        lock(&self.groups).get(&group_key(project, zone, group)).cloned()
    }

    fn record(&self, call: Call) {
        lock(&self.calls).push(call);
    }

    fn check_read(&self) -> ClientResult<()> {
        match lock(&self.read_failure).clone() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    fn check_write(&self) -> ClientResult<()> {
        match lock(&self.write_failure).clone() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    fn next_fingerprint(&self) -> String {
        let mut writes = lock(&self.writes);
        *writes += 1;
        format!("fp-{}", *writes)
    }

    fn operation(&self, name: &str) -> Operation {
        let errors = lock(&self.operation_errors).clone();
        Operation {
            name: name.to_string(),
            status: "DONE".to_string(),
            error: (!errors.is_empty()).then_some(OperationErrors { errors }),
        }
    }

    fn project_not_found(project_id: &str) -> ClientError {
        ClientError::Status {
            status: 404,
            message: format!("project {project_id} not found"),
        }
    }
}

impl ComputeClient for MockCompute {
    fn get_project(&self, project_id: &str) -> ClientResult<Project> {
        self.record(Call::GetProject {
            project: project_id.to_string(),
        });
        self.check_read()?;
        let project = self
            .project(project_id)
            .ok_or_else(|| Self::project_not_found(project_id))?;

        if *lock(&self.concurrent_writer) {
            let fingerprint = self.next_fingerprint();
            if let Some(stored) = lock(&self.projects).get_mut(project_id) {
                stored.common_instance_metadata.fingerprint = fingerprint;
            }
        }
        Ok(project)
    }

    fn set_common_metadata(
        &self,
        project_id: &str,
        metadata: &MetadataStore,
    ) -> ClientResult<Operation> {
        self.record(Call::SetCommonMetadata {
            project: project_id.to_string(),
            metadata: metadata.clone(),
        });
        self.check_write()?;

        let current = self
            .project(project_id)
            .ok_or_else(|| Self::project_not_found(project_id))?;
        if current.common_instance_metadata.fingerprint != metadata.fingerprint {
            return Err(ClientError::PreconditionFailed(
                "Supplied fingerprint does not match current metadata fingerprint.".to_string(),
            ));
        }

        let op = self.operation("operation-set-metadata");
        if op.error.is_none() {
            let fingerprint = self.next_fingerprint();
            if let Some(stored) = lock(&self.projects).get_mut(project_id) {
                stored.common_instance_metadata = MetadataStore {
                    fingerprint,
                    items: metadata.items.clone(),
                };
            }
        }
        Ok(op)
    }

    fn get_instance_group_policy(
        &self,
        project_id: &str,
        zone: &str,
        group: &str,
    ) -> ClientResult<InstanceGroupPolicy> {
        self.record(Call::GetInstanceGroupPolicy {
            project: project_id.to_string(),
            zone: zone.to_string(),
            group: group.to_string(),
        });
        self.check_read()?;
        self.group(project_id, zone, group)
            .ok_or_else(|| ClientError::Status {
                status: 404,
                message: format!("instance group {group} not found in {zone}"),
            })
    }

    fn patch_instance_group_policy(
        &self,
        project_id: &str,
        zone: &str,
        group: &str,
        policy: &InstanceGroupPolicy,
    ) -> ClientResult<Operation> {
        self.record(Call::PatchInstanceGroupPolicy {
            project: project_id.to_string(),
            zone: zone.to_string(),
            group: group.to_string(),
            policy: policy.clone(),
        });
        self.check_write()?;

        let op = self.operation("operation-patch-group");
        if op.error.is_none() {
            lock(&self.groups).insert(group_key(project_id, zone, group), policy.clone());
        }
        Ok(op)
    }

    fn list_managed_instances(
        &self,
        project_id: &str,
        zone: &str,
        group: &str,
    ) -> ClientResult<Vec<String>> {
        self.record(Call::ListManagedInstances {
            project: project_id.to_string(),
            zone: zone.to_string(),
            group: group.to_string(),
        });
        self.check_read()?;
        Ok(lock(&self.instances)
            .get(&group_key(project_id, zone, group))
            .cloned()
            .unwrap_or_default())
    }

    fn aggregated_list_instance_groups(
        &self,
        project_id: &str,
    ) -> ClientResult<BTreeMap<String, Vec<InstanceGroupSummary>>> {
        self.record(Call::AggregatedListInstanceGroups {
            project: project_id.to_string(),
        });
        self.check_read()?;

        let mut scopes: BTreeMap<String, Vec<InstanceGroupSummary>> = BTreeMap::new();
        for ((project, zone, group), _) in lock(&self.groups).iter() {
            if project != project_id {
                continue;
            }
            scopes
                .entry(format!("zones/{zone}"))
                .or_default()
                .push(InstanceGroupSummary {
                    name: group.clone(),
                    zone: format!("https://compute.googleapis.com/compute/beta/projects/{project}/zones/{zone}"),
                });
        }
        for groups in scopes.values_mut() {
            groups.sort_by(|a, b| a.name.cmp(&b.name));
        }
        Ok(scopes)
    }
}
