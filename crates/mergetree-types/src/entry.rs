//! Entry types describing one object in a merged tree.

use std::path::{Path, PathBuf};
use std::time::SystemTime;

use serde::{Deserialize, Serialize};

/// File type mask of a raw `st_mode`.
const S_IFMT: u32 = 0o170000;
/// Directory bits of a raw `st_mode`.
const S_IFDIR: u32 = 0o040000;

/// The kind of a filesystem object.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EntryKind {
    /// A regular file (or anything that is not a directory).
    File,
    /// A directory.
    Directory {
        /// Whether the directory is represented in the output as a symbolic
        /// link into its single source tree rather than a real directory.
        linked: bool,
    },
}

impl EntryKind {
    /// Derive the kind from raw mode bits as returned by `stat(2)`.
    ///
    /// Directories always start out unlinked; the merger decides link state.
    pub fn from_mode(mode: u32) -> Self {
        if mode & S_IFMT == S_IFDIR {
            Self::Directory { linked: false }
        } else {
            Self::File
        }
    }

    /// Returns `true` for directories, linked or not.
    pub fn is_directory(&self) -> bool {
        matches!(self, Self::Directory { .. })
    }

    /// Human-readable name used in conflict messages.
    pub fn describe(&self) -> &'static str {
        match self {
            Self::File => "file",
            Self::Directory { .. } => "directory",
        }
    }
}

/// Metadata for one path, as returned by a stat lookup.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Stat {
    /// File or directory. Directories are reported unlinked.
    pub kind: EntryKind,
    /// Size in bytes.
    pub size: u64,
    /// Last modification time, when the platform reports one.
    pub mtime: Option<SystemTime>,
}

/// One file or directory in a merged tree.
///
/// `size` and `mtime` are only ever compared for change detection.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entry {
    /// Path relative to every tree root, `/`-separated, no trailing slash.
    pub relative_path: String,
    /// Root of the input tree that supplies this entry's content.
    pub base_path: PathBuf,
    /// File or directory (with link state).
    pub kind: EntryKind,
    /// Size in bytes.
    pub size: u64,
    /// Last modification time.
    pub mtime: Option<SystemTime>,
}

impl Entry {
    /// Create an entry from stat metadata.
    pub fn new(relative_path: impl Into<String>, base_path: impl Into<PathBuf>, stat: Stat) -> Self {
        Self {
            relative_path: relative_path.into(),
            base_path: base_path.into(),
            kind: stat.kind,
            size: stat.size,
            mtime: stat.mtime,
        }
    }

    /// Returns `true` if this entry is a directory.
    pub fn is_directory(&self) -> bool {
        self.kind.is_directory()
    }

    /// Returns `true` if this entry is a directory that should be a link.
    pub fn is_linked_directory(&self) -> bool {
        matches!(self.kind, EntryKind::Directory { linked: true })
    }

    /// Return a copy with the given directory link state.
    ///
    /// Files are returned unchanged.
    pub fn with_linked(mut self, linked: bool) -> Self {
        if let EntryKind::Directory { .. } = self.kind {
            self.kind = EntryKind::Directory { linked };
        }
        self
    }

    /// Absolute path of the content this entry refers to.
    pub fn source_path(&self) -> PathBuf {
        self.base_path.join(&self.relative_path)
    }

    /// Resolve this entry's relative path under another root.
    pub fn path_under(&self, root: &Path) -> PathBuf {
        root.join(&self.relative_path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stat(kind: EntryKind) -> Stat {
        Stat {
            kind,
            size: 3,
            mtime: None,
        }
    }

    #[test]
    fn kind_from_mode_bits() {
        assert_eq!(
            EntryKind::from_mode(0o040755),
            EntryKind::Directory { linked: false }
        );
        assert_eq!(EntryKind::from_mode(0o100644), EntryKind::File);
        // Symlinks and sockets count as files.
        assert_eq!(EntryKind::from_mode(0o120777), EntryKind::File);
        assert_eq!(EntryKind::from_mode(0o140777), EntryKind::File);
    }

    #[test]
    fn with_linked_only_touches_directories() {
        let dir = Entry::new("lib", "/in/a", stat(EntryKind::Directory { linked: false }));
        assert!(!dir.is_linked_directory());
        assert!(dir.clone().with_linked(true).is_linked_directory());

        let file = Entry::new("lib.rs", "/in/a", stat(EntryKind::File));
        let file = file.with_linked(true);
        assert_eq!(file.kind, EntryKind::File);
        assert!(!file.is_linked_directory());
    }

    #[test]
    fn source_path_joins_base_and_relative() {
        let entry = Entry::new("foo/bar.txt", "/in/a", stat(EntryKind::File));
        assert_eq!(entry.source_path(), PathBuf::from("/in/a/foo/bar.txt"));
        assert_eq!(
            entry.path_under(Path::new("/out")),
            PathBuf::from("/out/foo/bar.txt")
        );
    }

    #[test]
    fn entry_serializes_kind_with_link_state() {
        let entry = Entry::new("foo", "/in/a", stat(EntryKind::Directory { linked: true }));
        let json = serde_json::to_string(&entry).unwrap();
        assert!(json.contains("\"linked\":true"));

        let back: Entry = serde_json::from_str(&json).unwrap();
        assert_eq!(back, entry);
    }
}
