//! derby-core: shared types for the rollerderby fleet control tool.
//!
//! Holds the data model of the compute resources the tool touches
//! (project metadata, managed instance group policies, operations), the
//! error taxonomy, and the [`ComputeClient`] seam behind which the remote
//! compute-management API lives.
//!
//! Nothing in here holds global state. Callers pass the client, the clock,
//! and build information explicitly.

pub mod build_info;
pub mod client;
pub mod clock;
pub mod config;
pub mod error;
pub mod types;

#[cfg(any(test, feature = "testing"))]
pub mod testing;

pub use build_info::BuildInfo;
pub use client::ComputeClient;
pub use clock::{Clock, SystemClock};
pub use config::DerbyConfig;
pub use error::{BlankField, ClientError, ClientResult, CoreError, CoreResult, ValidationError};
pub use types::*;
