//! Merge engine for mergetree.
//!
//! Merges N ordered input directory trees into one output directory and, on
//! every later call, re-applies only the filesystem operations needed to
//! bring the output up to date with the inputs.
//!
//! # Key Types
//!
//! - [`MergeSession`] -- Owns the previous merged tree; one per output directory
//! - [`TreeMerger`] -- Walks all inputs in lock-step into one sorted entry list
//! - [`PatchApplier`] / [`ApplyStats`] -- Executes a patch against the output
//! - [`MergeOptions`] -- Overwrite policy, annotation, symlink override
//! - [`MergeError`] -- Conflicts, invalid inputs, and I/O failures

pub mod applier;
pub mod error;
pub mod merger;
pub mod options;
pub mod session;

#[cfg(test)]
mod fixtures;

pub use applier::{ApplyStats, PatchApplier};
pub use error::{MergeError, MergeResult};
pub use merger::TreeMerger;
pub use options::MergeOptions;
pub use session::MergeSession;
