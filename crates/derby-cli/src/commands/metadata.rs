use std::collections::BTreeMap;

use anyhow::Context;
use derby_core::{BlankField, ComputeClient, MetadataItem, SystemClock, ValidationError};
use derby_metadata::{CompareEntry, FsSnapshotSink, KeyChange, MetadataSynchronizer};
use tracing::info;

use crate::KeyArgs;
use crate::settings::Settings;

pub fn set_key(settings: &Settings, args: &KeyArgs) -> anyhow::Result<()> {
    let client = settings.client()?;
    let sink = FsSnapshotSink::new(settings.snapshot_dir(args.snapshot_dir.as_deref()));
    let sync = MetadataSynchronizer::new(&client, &sink, &SystemClock);

    let outcome = sync.update_key(&settings.project, &args.key, &args.value)?;
    let previous = match &outcome.change {
        KeyChange::Updated { previous } => previous.as_str(),
        KeyChange::Inserted => "<EMPTY>",
    };
    info!(
        project = %outcome.project,
        key = %args.key,
        from = %previous,
        to = %args.value,
        snapshot = %outcome.snapshot.path.display(),
        "metadata key set"
    );
    Ok(())
}

pub fn list_keys(settings: &Settings, format: &str) -> anyhow::Result<()> {
    ValidationError::new()
        .require(BlankField::ProjectId, &settings.project)
        .into_result()?;
    let client = settings.client()?;
    let project = client
        .get_project(&settings.project)
        .with_context(|| format!("failed to read project {}", settings.project))?;
    let items = derby_metadata::sorted_items(&project.common_instance_metadata);

    match format {
        "json" => println!("{}", serde_json::to_string_pretty(&items)?),
        _ => {
            for line in key_table(&settings.project, &items) {
                println!("{line}");
            }
        }
    }
    Ok(())
}

pub fn compare(settings: &Settings, other: &str, format: &str) -> anyhow::Result<()> {
    let client = settings.client()?;
    let keys = derby_metadata::compare_projects(&client, &settings.project, other)?;

    match format {
        "json" => println!("{}", serde_json::to_string_pretty(&keys)?),
        _ => {
            for line in compare_table(&settings.project, other, &keys) {
                println!("{line}");
            }
        }
    }
    Ok(())
}

fn key_table(project: &str, items: &[&MetadataItem]) -> Vec<String> {
    let mut lines = vec![
        format!("{:<45.45} | {:<30.30}", "key", project),
        "=".repeat(45 + 30 + 3),
    ];
    lines.extend(
        items
            .iter()
            .map(|item| format!("{:<45.45} | {:<30.30}", item.key, item.value)),
    );
    lines
}

fn compare_table(
    project_a: &str,
    project_b: &str,
    keys: &BTreeMap<String, CompareEntry>,
) -> Vec<String> {
    let mut lines = vec![
        format!(
            "{:<45.45} | {:<5.5} | {:<25.25} | {:<25.25}",
            "key", "equal", project_a, project_b
        ),
        "=".repeat(45 + 5 + 2 * 25 + 3 * 3),
    ];
    for (key, entry) in keys {
        lines.push(format!(
            "{:<45.45} | {:>5} | {:<25.25} | {:<25.25}",
            key,
            entry.is_equal(),
            entry.a.as_deref().unwrap_or(""),
            entry.b.as_deref().unwrap_or(""),
        ));
    }
    lines
}
