//! Version stamping for rollouts.
//!
//! Every rollout writes a version named `0-{unix_seconds}`. The prefix is
//! the slot index the version occupies; the suffix makes successive
//! rollouts distinguishable without a separate counter.

use derby_core::{InstanceGroupPolicy, InstanceGroupVersion};

/// Name of the version created by a rollout started at `unix_seconds`.
pub fn version_name(unix_seconds: u64) -> String {
    format!("0-{unix_seconds}")
}

/// The version record a rollout installs: a new name pointing at the
/// group's *current* instance template.
pub fn next_version(policy: &InstanceGroupPolicy, unix_seconds: u64) -> InstanceGroupVersion {
    InstanceGroupVersion::new(&version_name(unix_seconds), &policy.instance_template)
}
