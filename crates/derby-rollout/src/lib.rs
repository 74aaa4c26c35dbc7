//! rollerderby rolling updates: versioned rollout of managed instance groups.
//!
//! This crate moves a managed instance group onto a freshly stamped version
//! of its current instance template and asks the provider to replace every
//! member, one at a time, honouring a minimum-ready duration. The provider
//! performs the replacement asynchronously; this crate only initiates it.
//!
//! # Components
//!
//! - **`version`**: version naming (`0-{unix_seconds}`)
//! - **`controller`**: policy patch and the `rolling_replace` round trip
//! - **`inventory`**: read-only view of groups and their instances

pub mod controller;
pub mod inventory;
pub mod version;

pub use controller::{RolloutController, RolloutReceipt, apply_rollout};
pub use inventory::{GroupInventory, group_inventory};
pub use version::{next_version, version_name};
