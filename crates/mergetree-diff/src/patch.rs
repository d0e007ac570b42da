//! Patch computation: compare two sorted entry lists and produce the ordered
//! operations that turn the first into the second.
//!
//! Removals come first, deepest path first, so children are gone before
//! their parent directory is removed. Additions and changes follow in
//! ascending path order, so a directory exists before anything inside it is
//! created.

use std::cmp::Ordering;
use std::fmt;

use mergetree_types::{compare_paths, Entry, EntryKind};
use serde::Serialize;

use crate::error::{DiffError, DiffResult};

/// The kind of a patch operation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Operation {
    Mkdir,
    Rmdir,
    Unlink,
    Create,
    Change,
}

impl Operation {
    /// Short lowercase name, as printed in plans.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Mkdir => "mkdir",
            Self::Rmdir => "rmdir",
            Self::Unlink => "unlink",
            Self::Create => "create",
            Self::Change => "change",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single operation in a patch.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "op", rename_all = "lowercase")]
pub enum PatchOp {
    /// A directory appears.
    Mkdir(Entry),
    /// A directory disappears. Carries the previous entry.
    Rmdir(Entry),
    /// A file disappears. Carries the previous entry.
    Unlink(Entry),
    /// A file appears.
    Create(Entry),
    /// An entry of the same kind persists but differs.
    Change { previous: Entry, next: Entry },
}

impl PatchOp {
    /// The kind of this operation.
    pub fn operation(&self) -> Operation {
        match self {
            Self::Mkdir(_) => Operation::Mkdir,
            Self::Rmdir(_) => Operation::Rmdir,
            Self::Unlink(_) => Operation::Unlink,
            Self::Create(_) => Operation::Create,
            Self::Change { .. } => Operation::Change,
        }
    }

    /// The entry the operation acts on: the new entry for additions and
    /// changes, the old one for removals.
    pub fn entry(&self) -> &Entry {
        match self {
            Self::Mkdir(entry) | Self::Rmdir(entry) | Self::Unlink(entry) | Self::Create(entry) => {
                entry
            }
            Self::Change { next, .. } => next,
        }
    }

    /// Relative path the operation acts on.
    pub fn relative_path(&self) -> &str {
        &self.entry().relative_path
    }

    fn removal(entry: &Entry) -> Self {
        match entry.kind {
            EntryKind::Directory { .. } => Self::Rmdir(entry.clone()),
            EntryKind::File => Self::Unlink(entry.clone()),
        }
    }

    fn addition(entry: &Entry) -> Self {
        match entry.kind {
            EntryKind::Directory { .. } => Self::Mkdir(entry.clone()),
            EntryKind::File => Self::Create(entry.clone()),
        }
    }
}

impl fmt::Display for PatchOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:<6} {}", self.operation(), self.relative_path())
    }
}

/// An ordered list of operations.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Patch {
    /// Operations, in the order they must be applied.
    pub ops: Vec<PatchOp>,
}

impl Patch {
    /// Create an empty patch.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `true` if there are no operations.
    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    /// Number of operations.
    pub fn len(&self) -> usize {
        self.ops.len()
    }

    /// Iterate operations in application order.
    pub fn iter(&self) -> std::slice::Iter<'_, PatchOp> {
        self.ops.iter()
    }

    /// Number of operations of one kind.
    pub fn count(&self, operation: Operation) -> usize {
        self.ops.iter().filter(|op| op.operation() == operation).count()
    }
}

impl IntoIterator for Patch {
    type Item = PatchOp;
    type IntoIter = std::vec::IntoIter<PatchOp>;

    fn into_iter(self) -> Self::IntoIter {
        self.ops.into_iter()
    }
}

impl<'a> IntoIterator for &'a Patch {
    type Item = &'a PatchOp;
    type IntoIter = std::slice::Iter<'a, PatchOp>;

    fn into_iter(self) -> Self::IntoIter {
        self.ops.iter()
    }
}

/// Equality used to decide whether a persisting entry needs a `Change`.
///
/// - Directories are equal when their link state matches, and linked
///   directories must also point at the same source tree.
/// - Files are equal when size, mtime and source tree all match.
/// - A file never equals a directory.
pub fn default_is_equal(a: &Entry, b: &Entry) -> bool {
    match (a.kind, b.kind) {
        (EntryKind::Directory { linked: la }, EntryKind::Directory { linked: lb }) => {
            la == lb && (!la || a.base_path == b.base_path)
        }
        (EntryKind::File, EntryKind::File) => {
            a.size == b.size && a.mtime == b.mtime && a.base_path == b.base_path
        }
        _ => false,
    }
}

/// Compute the patch that turns `previous` into `next`.
///
/// Both lists must be strictly ascending under [`compare_paths`]. A path
/// present in both whose kind changed between file and directory is removed
/// and re-added rather than changed.
pub fn calculate_patch<F>(previous: &[Entry], next: &[Entry], is_equal: F) -> DiffResult<Patch>
where
    F: Fn(&Entry, &Entry) -> bool,
{
    check_sorted(previous)?;
    check_sorted(next)?;

    let mut removals = Vec::new();
    let mut additions = Vec::new();
    let (mut i, mut j) = (0, 0);

    loop {
        match (previous.get(i), next.get(j)) {
            (Some(old), Some(new)) => match compare_paths(&old.relative_path, &new.relative_path) {
                Ordering::Less => {
                    removals.push(PatchOp::removal(old));
                    i += 1;
                }
                Ordering::Greater => {
                    additions.push(PatchOp::addition(new));
                    j += 1;
                }
                Ordering::Equal => {
                    if old.is_directory() != new.is_directory() {
                        removals.push(PatchOp::removal(old));
                        additions.push(PatchOp::addition(new));
                    } else if !is_equal(old, new) {
                        additions.push(PatchOp::Change {
                            previous: old.clone(),
                            next: new.clone(),
                        });
                    }
                    i += 1;
                    j += 1;
                }
            },
            (Some(old), None) => {
                removals.push(PatchOp::removal(old));
                i += 1;
            }
            (None, Some(new)) => {
                additions.push(PatchOp::addition(new));
                j += 1;
            }
            (None, None) => break,
        }
    }

    removals.reverse();
    removals.append(&mut additions);
    Ok(Patch { ops: removals })
}

fn check_sorted(entries: &[Entry]) -> DiffResult<()> {
    for pair in entries.windows(2) {
        let (first, second) = (&pair[0].relative_path, &pair[1].relative_path);
        match compare_paths(first, second) {
            Ordering::Less => {}
            Ordering::Equal => return Err(DiffError::DuplicatePath(first.clone())),
            Ordering::Greater => {
                return Err(DiffError::Unsorted {
                    first: first.clone(),
                    second: second.clone(),
                })
            }
        }
    }
    Ok(())
}
