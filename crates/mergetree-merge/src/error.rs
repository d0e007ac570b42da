//! Error types for the merge crate.

use std::path::PathBuf;

use mergetree_types::EntryKind;

/// Errors that can occur during a merge.
///
/// Conflicts are raised while computing the merged tree, before the output
/// directory is touched.
#[derive(Debug, thiserror::Error)]
pub enum MergeError {
    /// Two names at the same level differ only in letter case.
    #[error(
        "Merge error: conflicting capitalizations:\n{first_path} in {}\n{second_path} in {}\n\
         Remove one of the files and re-add it with matching capitalization.\n\
         We are strict about this to avoid divergent behavior between \
         case-insensitive Mac/Windows and case-sensitive Linux.",
        .first_input.display(),
        .second_input.display()
    )]
    CapitalizationConflict {
        first_path: String,
        first_input: PathBuf,
        second_path: String,
        second_input: PathBuf,
    },

    /// A path is a directory in one input and a file in another.
    #[error(
        "Merge error: conflicting file types: {path} is a {} in {} but a {} in {}\n\
         Remove or rename either of those.",
        .first_kind.describe(),
        .first_input.display(),
        .second_kind.describe(),
        .second_input.display()
    )]
    TypeConflict {
        path: String,
        first_kind: EntryKind,
        first_input: PathBuf,
        second_kind: EntryKind,
        second_input: PathBuf,
    },

    /// Two inputs define the same file and overwriting is disabled.
    #[error(
        "Merge error: file {path} exists in {} and {}\n\
         Pass option {{ overwrite: true }} in order to have the latter file win.",
        .first_input.display(),
        .second_input.display()
    )]
    OverwriteConflict {
        path: String,
        first_input: PathBuf,
        second_input: PathBuf,
    },

    /// A session with no previous tree found content in its output directory.
    ///
    /// Nothing is written or deleted when this is returned.
    #[error(
        "output directory {} is not empty; clear it before the first merge of a session",
        .0.display()
    )]
    OutputNotEmpty(PathBuf),

    /// The input or output paths are unusable.
    #[error("invalid merge inputs: {0}")]
    InputShape(String),

    /// A filesystem primitive failed.
    #[error(transparent)]
    Fs(#[from] mergetree_fs::FsError),

    /// The merged tree violated the differ's ordering precondition.
    #[error("patch computation failed: {0}")]
    Diff(#[from] mergetree_diff::DiffError),
}

impl MergeError {
    /// Returns `true` for the three conflict kinds.
    pub fn is_conflict(&self) -> bool {
        matches!(
            self,
            Self::CapitalizationConflict { .. } | Self::TypeConflict { .. } | Self::OverwriteConflict { .. }
        )
    }
}

/// Convenience alias for merge results.
pub type MergeResult<T> = Result<T, MergeError>;
