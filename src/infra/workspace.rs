//! Ephemeral per-job working directories.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

use time::OffsetDateTime;
use tracing::{debug, warn};

use crate::domain::types::RequesterId;

const SOURCE: &str = "infra::workspace";

/// Root under which every job gets its own directory.
#[derive(Debug)]
pub struct Workspace {
    root: PathBuf,
    sequence: AtomicU64,
}

impl Workspace {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            sequence: AtomicU64::new(0),
        }
    }

    /// Create a fresh directory named `{requester}_{unix_ms}_{seq}` from the
    /// job's submission time.
    ///
    /// The sequence number is process-wide, so two jobs for the same requester
    /// within one millisecond still get disjoint directories.
    pub fn create(
        &self,
        requester: &RequesterId,
        submitted_at: OffsetDateTime,
    ) -> io::Result<WorkDir> {
        let millis = submitted_at.unix_timestamp_nanos() / 1_000_000;
        let seq = self.sequence.fetch_add(1, Ordering::Relaxed);
        let name = format!("{}_{millis}_{seq}", requester.path_component());
        let path = self.root.join(&name);
        fs::create_dir_all(&path)?;

        debug!(
            target = SOURCE,
            op = "create",
            path = %path.display(),
            "Working directory created"
        );

        Ok(WorkDir {
            archive: self.root.join(format!("{name}.zip")),
            path,
            name,
            removed: false,
        })
    }
}

/// A job's working directory plus its sibling archive path.
///
/// Both are removed when the guard is dropped.
#[derive(Debug)]
pub struct WorkDir {
    path: PathBuf,
    name: String,
    archive: PathBuf,
    removed: bool,
}

impl WorkDir {
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn archive_path(&self) -> &Path {
        &self.archive
    }

    /// Path of the `index`-th raster, counted from zero.
    pub fn raster_path(&self, index: usize) -> PathBuf {
        self.path.join(format!("{}_{index:03}.png", self.name))
    }

    /// Delete the directory and archive. Safe to call repeatedly.
    pub fn cleanup(&mut self) {
        if self.removed {
            return;
        }
        self.removed = true;

        if let Err(err) = fs::remove_dir_all(&self.path) {
            log_removal_failure(&self.path, &err);
        }
        if let Err(err) = fs::remove_file(&self.archive) {
            log_removal_failure(&self.archive, &err);
        }
    }
}

impl Drop for WorkDir {
    fn drop(&mut self) {
        self.cleanup();
    }
}

fn log_removal_failure(path: &Path, err: &io::Error) {
    if err.kind() == io::ErrorKind::NotFound {
        return;
    }
    warn!(
        target = SOURCE,
        op = "cleanup",
        result = "error",
        path = %path.display(),
        error = %err,
        "Failed to remove job artifact"
    );
}
