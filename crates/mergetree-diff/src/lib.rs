//! Structural differ for mergetree.
//!
//! Turns the previous merged tree and the new merged tree, both sorted by
//! [`mergetree_types::compare_paths`], into an ordered [`Patch`] of
//! filesystem operations.
//!
//! # Key Types
//!
//! - [`Patch`] / [`PatchOp`] / [`Operation`] -- The ordered operation list
//! - [`calculate_patch`] -- Two-pointer diff with a caller-supplied equality
//! - [`default_is_equal`] -- Equality that also compares directory link state

pub mod error;
pub mod patch;

pub use error::{DiffError, DiffResult};
pub use patch::{calculate_patch, default_is_equal, Operation, Patch, PatchOp};
