//! Executes a patch against the output directory.
//!
//! Operations run strictly in patch order. Each removal undoes whatever the
//! matching addition created: a linked directory is unlinked, a real directory
//! is removed (it is empty by then, its children having been removed first),
//! a file is unlinked. A `Change` is a removal of the previous entry followed
//! by an addition of the new one.

use std::path::Path;

use mergetree_diff::{Operation, Patch, PatchOp};
use mergetree_fs::FileSystem;
use mergetree_types::{Entry, EntryKind};
use serde::Serialize;
use tracing::trace;

use crate::error::MergeResult;

/// Counts of the operations applied by one patch.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct ApplyStats {
    pub mkdir: usize,
    pub rmdir: usize,
    pub unlink: usize,
    pub create: usize,
    pub change: usize,
    /// Directories materialized as links (by `mkdir` or `change`).
    pub linked: usize,
}

impl ApplyStats {
    /// Total number of operations applied.
    pub fn total(&self) -> usize {
        self.mkdir + self.rmdir + self.unlink + self.create + self.change
    }

    fn record(&mut self, operation: Operation) {
        match operation {
            Operation::Mkdir => self.mkdir += 1,
            Operation::Rmdir => self.rmdir += 1,
            Operation::Unlink => self.unlink += 1,
            Operation::Create => self.create += 1,
            Operation::Change => self.change += 1,
        }
    }
}

/// Applies patches to one output directory.
pub struct PatchApplier<'a> {
    fs: &'a dyn FileSystem,
    output: &'a Path,
}

impl<'a> PatchApplier<'a> {
    pub fn new(fs: &'a dyn FileSystem, output: &'a Path) -> Self {
        Self { fs, output }
    }

    /// Apply every operation in order.
    ///
    /// The output root is created first if it is missing. On error the output
    /// is left as far as the patch got; cleaning up is the caller's job.
    pub fn apply(&self, patch: &Patch) -> MergeResult<ApplyStats> {
        self.fs.create_dir_all(self.output)?;

        let mut stats = ApplyStats::default();
        for op in patch {
            trace!(op = %op.operation(), path = op.relative_path(), "apply");
            match op {
                PatchOp::Mkdir(entry) | PatchOp::Create(entry) => {
                    stats.linked += self.add(entry)?;
                }
                PatchOp::Rmdir(entry) | PatchOp::Unlink(entry) => self.remove(entry)?,
                PatchOp::Change { previous, next } => {
                    self.remove(previous)?;
                    stats.linked += self.add(next)?;
                }
            }
            stats.record(op.operation());
        }
        Ok(stats)
    }

    /// Create the output for `entry`; returns 1 if a directory was linked.
    fn add(&self, entry: &Entry) -> MergeResult<usize> {
        let dest = entry.path_under(self.output);
        match entry.kind {
            EntryKind::Directory { linked: true } => {
                self.fs.materialize(&entry.source_path(), &dest)?;
                return Ok(1);
            }
            EntryKind::Directory { linked: false } => self.fs.create_dir(&dest)?,
            EntryKind::File => self.fs.materialize(&entry.source_path(), &dest)?,
        }
        Ok(0)
    }

    fn remove(&self, entry: &Entry) -> MergeResult<()> {
        let dest = entry.path_under(self.output);
        match entry.kind {
            EntryKind::Directory { linked: true } => self.fs.remove_link(&dest)?,
            EntryKind::Directory { linked: false } => self.fs.remove_dir(&dest)?,
            EntryKind::File => self.fs.remove_file(&dest)?,
        }
        Ok(())
    }
}
