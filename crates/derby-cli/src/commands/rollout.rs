use derby_core::SystemClock;
use derby_rollout::{GroupInventory, RolloutController, group_inventory};
use tracing::info;

use crate::RolloutArgs;
use crate::settings::Settings;

pub fn replace(settings: &Settings, args: &RolloutArgs) -> anyhow::Result<()> {
    let request = settings.rollout_request(args);
    let client = settings.client()?;
    let controller = RolloutController::new(&client, &SystemClock);

    let receipt = controller.rolling_replace(&request)?;
    info!(
        group = %receipt.group,
        zone = %receipt.zone,
        version = %receipt.version.name,
        template = %receipt.version.instance_template,
        min_ready_sec = receipt.min_ready_sec,
        operation = %receipt.operation.name,
        "rolling replace started"
    );
    Ok(())
}

pub fn list_groups(settings: &Settings, format: &str) -> anyhow::Result<()> {
    let client = settings.client()?;
    let inventory = group_inventory(&client, &settings.project)?;

    match format {
        "json" => println!("{}", serde_json::to_string_pretty(&inventory)?),
        _ => {
            for line in inventory_lines(&inventory) {
                println!("{line}");
            }
        }
    }
    Ok(())
}

/// Scope, then indented groups, then further indented instances.
fn inventory_lines(inventory: &[GroupInventory]) -> Vec<String> {
    let mut lines = Vec::new();
    let mut last_scope: Option<&str> = None;
    for entry in inventory {
        if last_scope != Some(entry.scope.as_str()) {
            lines.push(entry.scope.clone());
            last_scope = Some(entry.scope.as_str());
        }
        lines.push(format!("    {}", entry.group));
        for instance in &entry.instances {
            lines.push(format!("        {instance}"));
        }
    }
    lines
}
