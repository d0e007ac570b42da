use std::path::Path;

use mergetree_types::Stat;

use crate::error::FsResult;

/// Filesystem primitives consumed by the merge engine.
///
/// All implementations must satisfy these invariants:
/// - Every call blocks until the operation is complete.
/// - `stat` and `read_dir` follow symbolic links transparently.
/// - `supports_symlinks` is fixed for the lifetime of the value; callers may
///   query it once and cache the answer.
/// - All I/O errors are propagated, never silently ignored (except a missing
///   path in `remove_dir_all`).
pub trait FileSystem: Send + Sync {
    /// List the names in a directory, in no particular order.
    fn read_dir(&self, path: &Path) -> FsResult<Vec<String>>;

    /// Fetch kind, size and modification time for a path.
    fn stat(&self, path: &Path) -> FsResult<Stat>;

    /// Whether symbolic links can be created on this filesystem.
    fn supports_symlinks(&self) -> bool;

    /// Make `dest` present the content of `source`.
    ///
    /// Creates a symbolic link when supported, otherwise copies the file (or
    /// the whole directory tree) byte for byte.
    fn materialize(&self, source: &Path, dest: &Path) -> FsResult<()>;

    /// Create a single empty directory. The parent must exist.
    fn create_dir(&self, path: &Path) -> FsResult<()>;

    /// Create a directory and any missing parents.
    fn create_dir_all(&self, path: &Path) -> FsResult<()>;

    /// Remove a file (or a symbolic link to a file).
    fn remove_file(&self, path: &Path) -> FsResult<()>;

    /// Remove an empty real directory.
    fn remove_dir(&self, path: &Path) -> FsResult<()>;

    /// Remove something previously created by [`FileSystem::materialize`]
    /// for a directory source.
    ///
    /// Unlinks the symbolic link when links are supported; otherwise the
    /// output is a copied tree and is removed recursively.
    fn remove_link(&self, path: &Path) -> FsResult<()>;

    /// Remove a path and everything below it. A missing path is not an error.
    fn remove_dir_all(&self, path: &Path) -> FsResult<()>;
}
