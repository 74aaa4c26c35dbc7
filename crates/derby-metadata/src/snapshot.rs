//! Metadata snapshots: the audit copy written before every mutation.
//!
//! A snapshot is the full store (fingerprint and every item) as a single
//! line of JSON, named `{project}-{unix_seconds}.json`. Snapshots are created
//! with create-new semantics and never rewritten: a name collision is a
//! write failure, which in turn stops the update.

use std::fs::{File, OpenOptions};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use derby_core::{CoreError, CoreResult, MetadataStore};
use tracing::debug;

/// A snapshot that has been durably written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SnapshotArtifact {
    pub path: PathBuf,
    pub bytes: u64,
}

/// Durable destination for metadata snapshots.
///
/// `persist` must not return `Ok` until the snapshot is flushed to storage.
pub trait SnapshotSink {
    fn persist(&self, name: &str, store: &MetadataStore) -> CoreResult<SnapshotArtifact>;
}

/// Deterministic snapshot file name for a project at a point in time.
pub fn snapshot_name(project: &str, unix_seconds: u64) -> String {
    format!("{project}-{unix_seconds}.json")
}

/// Writes snapshots as files inside one directory.
#[derive(Debug, Clone)]
pub struct FsSnapshotSink {
    dir: PathBuf,
}

impl FsSnapshotSink {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

impl SnapshotSink for FsSnapshotSink {
    fn persist(&self, name: &str, store: &MetadataStore) -> CoreResult<SnapshotArtifact> {
        let path = self.dir.join(name);
        let bytes = write_snapshot(&path, store).map_err(|source| CoreError::SnapshotWrite {
            path: path.clone(),
            source,
        })?;
        debug!(path = %path.display(), bytes, "metadata snapshot written");
        Ok(SnapshotArtifact { path, bytes })
    }
}

fn write_snapshot(path: &Path, store: &MetadataStore) -> io::Result<u64> {
    let file = OpenOptions::new().write(true).create_new(true).open(path)?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer(&mut writer, store)?;
    writer.flush()?;
    let file: File = writer.into_inner().map_err(io::IntoInnerError::into_error)?;
    file.sync_all()?;
    Ok(file.metadata()?.len())
}
