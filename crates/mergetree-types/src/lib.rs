//! Core types for mergetree.
//!
//! A merged tree is a flat, strictly ordered list of [`Entry`] values, one per
//! file or directory, each pointing at the input tree that supplies its
//! content.
//!
//! # Key Types
//!
//! - [`Entry`] -- One filesystem object at a relative path
//! - [`EntryKind`] -- File or directory (with link state)
//! - [`Stat`] -- Metadata returned by a stat lookup
//! - [`compare_paths`] -- The ordering every merged tree is sorted by

pub mod entry;
pub mod path;

pub use entry::{Entry, EntryKind, Stat};
pub use path::{compare_paths, fold_case, join_relative};
