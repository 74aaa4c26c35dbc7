//! Rolling replace against the mock compute client.

use derby_core::testing::{Call, FixedClock, MockCompute};
use derby_core::{
    BlankField, ClientError, CoreError, InstanceGroupPolicy, InstanceGroupVersion, MinimalAction,
    OperationErrorEntry, RolloutRequest, UpdatePolicy,
};
use derby_rollout::{RolloutController, group_inventory};

const T: u64 = 1_700_000_123;
const CLOCK: FixedClock = FixedClock(T);

fn web_policy() -> InstanceGroupPolicy {
    InstanceGroupPolicy {
        name: "web".to_string(),
        instance_template: "T1".to_string(),
        versions: vec![InstanceGroupVersion::new("v0", "T1")],
        update_policy: Some(UpdatePolicy {
            minimal_action: Some(MinimalAction::None),
            min_ready_sec: 0,
            ..Default::default()
        }),
        ..Default::default()
    }
}

fn patched(mock: &MockCompute) -> Vec<InstanceGroupPolicy> {
    mock.mutations()
        .into_iter()
        .filter_map(|call| match call {
            Call::PatchInstanceGroupPolicy { policy, .. } => Some(policy),
            _ => None,
        })
        .collect()
}

#[test]
fn rolling_replace_patches_version_and_policy() {
    let mock = MockCompute::new().with_group("p", "europe-west1-b", web_policy());
    let controller = RolloutController::new(&mock, &CLOCK);

    let receipt = controller
        .rolling_replace(&RolloutRequest::new("p", "europe-west1-b", "web", 90))
        .unwrap();
    assert_eq!(receipt.version, InstanceGroupVersion::new("0-1700000123", "T1"));
    assert_eq!(receipt.min_ready_sec, 90);

    let sent = patched(&mock);
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].versions, vec![InstanceGroupVersion::new("0-1700000123", "T1")]);
    let update = sent[0].update_policy.as_ref().unwrap();
    assert_eq!(update.minimal_action, Some(MinimalAction::Replace));
    assert_eq!(update.min_ready_sec, 90);
}

#[test]
fn rolling_replace_reads_before_patching_once() {
    let mock = MockCompute::new().with_group("p", "z", web_policy());
    let controller = RolloutController::new(&mock, &CLOCK);
    controller
        .rolling_replace(&RolloutRequest::new("p", "z", "web", 30))
        .unwrap();

    let calls = mock.calls();
    assert_eq!(calls.len(), 2);
    assert!(matches!(calls[0], Call::GetInstanceGroupPolicy { .. }));
    assert!(matches!(calls[1], Call::PatchInstanceGroupPolicy { .. }));
}

#[test]
fn rolling_replace_uses_current_template_not_old_version() {
    let mut policy = web_policy();
    policy.instance_template = "T2".to_string();
    let mock = MockCompute::new().with_group("p", "z", policy);
    let controller = RolloutController::new(&mock, &CLOCK);

    controller
        .rolling_replace(&RolloutRequest::new("p", "z", "web", 30))
        .unwrap();
    let stored = mock.group("p", "z", "web").unwrap();
    assert_eq!(stored.versions[0].instance_template, "T2");
}

#[test]
fn blank_request_fields_fail_before_any_call() {
    let mock = MockCompute::new();
    let controller = RolloutController::new(&mock, &CLOCK);

    match controller.rolling_replace(&RolloutRequest::new("p", "", "", 30)) {
        Err(CoreError::Validation(err)) => {
            assert_eq!(err.blank_fields(), &[BlankField::Zone, BlankField::GroupName]);
        }
        other => panic!("expected validation error, got {other:?}"),
    }
    assert!(mock.calls().is_empty());
}

#[test]
fn missing_group_is_remote_read_error() {
    let mock = MockCompute::new();
    let controller = RolloutController::new(&mock, &CLOCK);

    let err = controller
        .rolling_replace(&RolloutRequest::new("p", "z", "web", 30))
        .unwrap_err();
    assert!(matches!(
        err,
        CoreError::RemoteRead { source: ClientError::Status { status: 404, .. }, .. }
    ));
    assert!(mock.mutations().is_empty());
}

#[test]
fn group_without_versions_is_not_patched() {
    let mut policy = web_policy();
    policy.versions.clear();
    let mock = MockCompute::new().with_group("p", "z", policy);
    let controller = RolloutController::new(&mock, &CLOCK);

    let err = controller
        .rolling_replace(&RolloutRequest::new("p", "z", "web", 30))
        .unwrap_err();
    assert!(matches!(err, CoreError::EmptyVersions { .. }));
    assert!(mock.mutations().is_empty());
}

#[test]
fn operation_error_is_surfaced_with_every_entry() {
    let entries = vec![
        OperationErrorEntry::new("RESOURCE_NOT_READY", "group is being updated", "web"),
        OperationErrorEntry::new("QUOTA_EXCEEDED", "CPUS exceeded", "europe-west1"),
    ];
    let mock = MockCompute::new()
        .with_group("p", "z", web_policy())
        .fail_operations_with(entries.clone());
    let controller = RolloutController::new(&mock, &CLOCK);

    let err = controller
        .rolling_replace(&RolloutRequest::new("p", "z", "web", 30))
        .unwrap_err();
    let msg = err.to_string();
    assert!(msg.contains("RESOURCE_NOT_READY: group is being updated (web)"));
    assert!(msg.contains("QUOTA_EXCEEDED: CPUS exceeded (europe-west1)"));
    match err {
        CoreError::Operation { errors } => assert_eq!(errors, entries),
        other => panic!("expected operation error, got {other:?}"),
    }
}

#[test]
fn transport_failure_on_patch_is_remote_write_error() {
    let mock = MockCompute::new()
        .with_group("p", "z", web_policy())
        .fail_writes(ClientError::Transport("connection reset".to_string()));
    let controller = RolloutController::new(&mock, &CLOCK);

    let err = controller
        .rolling_replace(&RolloutRequest::new("p", "z", "web", 30))
        .unwrap_err();
    assert!(matches!(err, CoreError::RemoteWrite { .. }));
}

#[test]
fn inventory_lists_groups_with_instances() {
    let mut api = web_policy();
    api.name = "api".to_string();
    let mock = MockCompute::new()
        .with_group("p", "europe-west1-b", web_policy())
        .with_group("p", "europe-west1-c", api)
        .with_instances("p", "europe-west1-b", "web", &["zones/europe-west1-b/instances/web-1"]);

    let inventory = group_inventory(&mock, "p").unwrap();
    assert_eq!(inventory.len(), 2);
    assert_eq!(inventory[0].scope, "zones/europe-west1-b");
    assert_eq!(inventory[0].group, "web");
    assert_eq!(inventory[0].zone, "europe-west1-b");
    assert_eq!(inventory[0].instances, vec!["zones/europe-west1-b/instances/web-1"]);
    assert_eq!(inventory[1].group, "api");
    assert!(inventory[1].instances.is_empty());
}
