//! rollerderby metadata synchronizer.
//!
//! Mutates exactly one key of a project's common instance metadata while
//! keeping an audit copy of the prior state. The pipeline is strictly
//! linear: validate, read, snapshot, mutate, submit. A failed snapshot
//! stops the pipeline before anything is written remotely, and a stale
//! fingerprint is reported to the caller rather than retried.
//!
//! # Components
//!
//! - **`snapshot`**: durable JSON snapshots of a metadata store
//! - **`mutation`**: pure key replacement/append and the fingerprint-bound submit
//! - **`sync`**: the end-to-end `update_key` pipeline
//! - **`compare`**: side-by-side view of two projects' metadata

pub mod compare;
pub mod mutation;
pub mod snapshot;
pub mod sync;

pub use compare::{CompareEntry, compare_projects, diff_stores, sorted_items};
pub use mutation::{KeyChange, apply_key, set_key, validate_update};
pub use snapshot::{FsSnapshotSink, SnapshotArtifact, SnapshotSink, snapshot_name};
pub use sync::{MetadataSynchronizer, UpdateOutcome};
