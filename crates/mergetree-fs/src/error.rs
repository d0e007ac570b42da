//! Error types for the filesystem crate.

use std::io;
use std::path::PathBuf;

/// Errors produced by filesystem primitives.
#[derive(Debug, thiserror::Error)]
pub enum FsError {
    /// An underlying I/O call failed.
    #[error("{op} {path}: {source}")]
    Io {
        /// The primitive that failed (e.g. `readdir`, `symlink`).
        op: &'static str,
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// A directory listing returned a name that is not valid UTF-8.
    #[error("non UTF-8 file name in {dir}: {name:?}")]
    NonUtf8Name { dir: PathBuf, name: std::ffi::OsString },

    /// Walking a directory for a recursive copy failed.
    #[error("walk {path}: {source}")]
    Walk {
        path: PathBuf,
        #[source]
        source: walkdir::Error,
    },
}

impl FsError {
    /// Wrap an `io::Error` with the failing operation and path.
    pub fn io(op: &'static str, path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Io {
            op,
            path: path.into(),
            source,
        }
    }

    /// The `io::ErrorKind` of the underlying failure, if any.
    pub fn io_kind(&self) -> Option<io::ErrorKind> {
        match self {
            Self::Io { source, .. } => Some(source.kind()),
            Self::Walk { source, .. } => source.io_error().map(io::Error::kind),
            Self::NonUtf8Name { .. } => None,
        }
    }
}

/// Convenience alias for filesystem results.
pub type FsResult<T> = Result<T, FsError>;
