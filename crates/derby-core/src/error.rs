//! Error types for rollerderby.
//!
//! [`ClientError`] is what a [`crate::ComputeClient`] reports about a single
//! round trip. [`CoreError`] is what the synchronizer and the rollout
//! controller report to their caller. Nothing is retried or downgraded on the
//! way up.

use std::fmt;
use std::io;
use std::path::PathBuf;

use thiserror::Error;

use crate::types::OperationErrorEntry;

/// Result type alias for compute client calls.
pub type ClientResult<T> = Result<T, ClientError>;

/// Result type alias for core operations.
pub type CoreResult<T> = Result<T, CoreError>;

/// Failure of a single compute-management round trip.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ClientError {
    #[error("transport error: {0}")]
    Transport(String),

    #[error("remote returned HTTP {status}: {message}")]
    Status { status: u16, message: String },

    /// The remote store's version did not match the one presented.
    #[error("precondition failed: {0}")]
    PreconditionFailed(String),

    #[error("failed to decode response: {0}")]
    Decode(String),
}

/// Errors surfaced by the metadata synchronizer and the rollout controller.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("invalid input: {0}")]
    Validation(#[from] ValidationError),

    #[error("failed to read {resource}")]
    RemoteRead {
        resource: String,
        #[source]
        source: ClientError,
    },

    #[error("failed to write metadata snapshot {}", .path.display())]
    SnapshotWrite {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error(
        "metadata of project {project} changed concurrently, fingerprint {fingerprint} is stale: {message}"
    )]
    OptimisticConcurrency {
        project: String,
        fingerprint: String,
        message: String,
    },

    #[error("remote operation failed: {}", join_entries(.errors))]
    Operation { errors: Vec<OperationErrorEntry> },

    #[error("failed to submit {resource}")]
    RemoteWrite {
        resource: String,
        #[source]
        source: ClientError,
    },

    #[error("instance group {group} has no versions")]
    EmptyVersions { group: String },
}

fn join_entries(entries: &[OperationErrorEntry]) -> String {
    entries
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

/// A required string input that was left empty.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum BlankField {
    ProjectId,
    Key,
    Value,
    Zone,
    GroupName,
    CompareProjectId,
}

impl fmt::Display for BlankField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let msg = match self {
            Self::ProjectId => "project id cannot be blank",
            Self::Key => "key cannot be blank",
            Self::Value => "value cannot be blank",
            Self::Zone => "zone cannot be blank",
            Self::GroupName => "instance group name cannot be blank",
            Self::CompareProjectId => "compare project id cannot be blank",
        };
        f.write_str(msg)
    }
}

/// Every blank required input of one request, in the order checked.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationError {
    blank: Vec<BlankField>,
}

impl ValidationError {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `field` as blank when `value` is empty.
    pub fn require(mut self, field: BlankField, value: &str) -> Self {
        if value.is_empty() {
            self.blank.push(field);
        }
        self
    }

    pub fn blank_fields(&self) -> &[BlankField] {
        &self.blank
    }

    pub fn is_empty(&self) -> bool {
        self.blank.is_empty()
    }

    /// `Ok(())` when nothing was blank, otherwise the aggregate error.
    pub fn into_result(self) -> Result<(), ValidationError> {
        if self.is_empty() { Ok(()) } else { Err(self) }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for field in &self.blank {
            if !first {
                f.write_str("; ")?;
            }
            write!(f, "{field}")?;
            first = false;
        }
        Ok(())
    }
}

impl std::error::Error for ValidationError {}
