//! Filesystem primitives for mergetree.
//!
//! The merge engine never touches `std::fs` directly; everything goes through
//! the [`FileSystem`] trait so that listing, metadata lookup, and the
//! symlink-or-copy decision live in one place.
//!
//! # Key Types
//!
//! - [`FileSystem`] -- The primitive operations the merge engine consumes
//! - [`OsFileSystem`] -- Implementation backed by the host filesystem
//! - [`FsError`] -- I/O failure tagged with the operation and path

pub mod error;
pub mod os;
pub mod traits;

pub use error::{FsError, FsResult};
pub use os::{probe_symlink_support, resolve_path, OsFileSystem};
pub use traits::FileSystem;
