//! [`FileSystem`] implementation backed by `std::fs`.

use std::fs;
use std::io;
use std::path::{Component, Path, PathBuf};

use mergetree_types::{EntryKind, Stat};
use tracing::{debug, trace};
use walkdir::WalkDir;

use crate::error::{FsError, FsResult};
use crate::traits::FileSystem;

/// The host filesystem.
///
/// Symlink capability is decided once at construction, either by probing
/// ([`OsFileSystem::new`]) or explicitly ([`OsFileSystem::with_symlinks`]).
#[derive(Clone, Debug)]
pub struct OsFileSystem {
    symlinks: bool,
}

impl OsFileSystem {
    /// Create a filesystem handle, probing whether symlinks work.
    pub fn new() -> Self {
        Self::with_symlinks(probe_symlink_support())
    }

    /// Create a filesystem handle with a fixed symlink capability.
    ///
    /// Passing `false` forces every materialization to copy, which is how the
    /// copy path is exercised on platforms that do support links.
    pub fn with_symlinks(symlinks: bool) -> Self {
        Self { symlinks }
    }
}

impl Default for OsFileSystem {
    fn default() -> Self {
        Self::new()
    }
}

/// Check whether this process can create symbolic links.
///
/// Creates a link inside a scratch temporary directory and reports whether
/// that succeeded. Any failure (including failing to create the scratch
/// directory) counts as "unsupported".
pub fn probe_symlink_support() -> bool {
    let Ok(scratch) = tempfile::tempdir() else {
        return false;
    };
    let target = scratch.path().join("target");
    let link = scratch.path().join("link");
    let supported = fs::write(&target, b"").is_ok() && symlink_file(&target, &link).is_ok();
    debug!(supported, "probed symlink support");
    supported
}

fn stat_from_metadata(metadata: &fs::Metadata) -> Stat {
    Stat {
        kind: kind_of(metadata),
        size: metadata.len(),
        mtime: metadata.modified().ok(),
    }
}

#[cfg(unix)]
fn kind_of(metadata: &fs::Metadata) -> EntryKind {
    use std::os::unix::fs::MetadataExt;
    EntryKind::from_mode(metadata.mode())
}

#[cfg(not(unix))]
fn kind_of(metadata: &fs::Metadata) -> EntryKind {
    if metadata.is_dir() {
        EntryKind::Directory { linked: false }
    } else {
        EntryKind::File
    }
}

#[cfg(unix)]
fn symlink_file(source: &Path, dest: &Path) -> io::Result<()> {
    std::os::unix::fs::symlink(source, dest)
}

#[cfg(unix)]
fn symlink_dir(source: &Path, dest: &Path) -> io::Result<()> {
    std::os::unix::fs::symlink(source, dest)
}

#[cfg(windows)]
fn symlink_file(source: &Path, dest: &Path) -> io::Result<()> {
    std::os::windows::fs::symlink_file(source, dest)
}

#[cfg(windows)]
fn symlink_dir(source: &Path, dest: &Path) -> io::Result<()> {
    std::os::windows::fs::symlink_dir(source, dest)
}

#[cfg(not(any(unix, windows)))]
fn symlink_file(_source: &Path, _dest: &Path) -> io::Result<()> {
    Err(io::Error::new(io::ErrorKind::Unsupported, "symlinks unsupported"))
}

#[cfg(not(any(unix, windows)))]
fn symlink_dir(_source: &Path, _dest: &Path) -> io::Result<()> {
    Err(io::Error::new(io::ErrorKind::Unsupported, "symlinks unsupported"))
}

/// Copy one file's contents and permissions. An existing `dest` is an error,
/// matching `symlink`.
fn copy_file(source: &Path, dest: &Path) -> FsResult<()> {
    let mut reader = fs::File::open(source).map_err(|e| FsError::io("copy", source, e))?;
    let mut writer = fs::OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(dest)
        .map_err(|e| FsError::io("copy", dest, e))?;
    io::copy(&mut reader, &mut writer).map_err(|e| FsError::io("copy", source, e))?;
    let permissions = reader
        .metadata()
        .map_err(|e| FsError::io("stat", source, e))?
        .permissions();
    fs::set_permissions(dest, permissions).map_err(|e| FsError::io("chmod", dest, e))
}

/// Resolve `path` to an absolute path with `.` and `..` removed and symlinks
/// in its longest existing prefix resolved.
///
/// The missing tail is appended lexically, so paths that do not exist yet
/// still compare correctly against existing ones.
pub fn resolve_path(path: &Path) -> PathBuf {
    let absolute = std::path::absolute(path).unwrap_or_else(|_| path.to_path_buf());
    let mut existing = absolute.as_path();
    let mut tail = Vec::new();
    let mut resolved = loop {
        if let Ok(real) = fs::canonicalize(existing) {
            break real;
        }
        match (existing.components().next_back(), existing.parent()) {
            (Some(last), Some(parent)) => {
                tail.push(last);
                existing = parent;
            }
            _ => break PathBuf::new(),
        }
    };
    if resolved.as_os_str().is_empty() {
        // Nothing on the path exists; normalize it purely lexically.
        tail.clear();
        tail.extend(absolute.components().rev());
    }
    for component in tail.into_iter().rev() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                resolved.pop();
            }
            other => resolved.push(other),
        }
    }
    resolved
}

/// Copy a directory tree, following links in the source.
fn copy_tree(source: &Path, dest: &Path) -> FsResult<()> {
    for entry in WalkDir::new(source).follow_links(true) {
        let entry = entry.map_err(|e| FsError::Walk {
            path: source.to_path_buf(),
            source: e,
        })?;
        // WalkDir only yields paths below `source`.
        let Ok(relative) = entry.path().strip_prefix(source) else {
            continue;
        };
        let target = dest.join(relative);
        if entry.file_type().is_dir() {
            fs::create_dir(&target).map_err(|e| FsError::io("mkdir", &target, e))?;
        } else {
            copy_file(entry.path(), &target)?;
        }
    }
    Ok(())
}

impl FileSystem for OsFileSystem {
    fn read_dir(&self, path: &Path) -> FsResult<Vec<String>> {
        let reader = fs::read_dir(path).map_err(|e| FsError::io("readdir", path, e))?;
        let mut names = Vec::new();
        for item in reader {
            let item = item.map_err(|e| FsError::io("readdir", path, e))?;
            let name = item.file_name().into_string().map_err(|name| FsError::NonUtf8Name {
                dir: path.to_path_buf(),
                name,
            })?;
            names.push(name);
        }
        Ok(names)
    }

    fn stat(&self, path: &Path) -> FsResult<Stat> {
        let metadata = fs::metadata(path).map_err(|e| FsError::io("stat", path, e))?;
        Ok(stat_from_metadata(&metadata))
    }

    fn supports_symlinks(&self) -> bool {
        self.symlinks
    }

    fn materialize(&self, source: &Path, dest: &Path) -> FsResult<()> {
        let is_dir = fs::metadata(source)
            .map_err(|e| FsError::io("stat", source, e))?
            .is_dir();
        if self.symlinks {
            // Point at the resolved target, not at a link inside the input.
            let target = fs::canonicalize(source).map_err(|e| FsError::io("realpath", source, e))?;
            trace!(target = %target.display(), dest = %dest.display(), "symlink");
            let linked = if is_dir {
                symlink_dir(&target, dest)
            } else {
                symlink_file(&target, dest)
            };
            return linked.map_err(|e| FsError::io("symlink", dest, e));
        }

        trace!(source = %source.display(), dest = %dest.display(), "copy");
        if is_dir {
            copy_tree(source, dest)
        } else {
            copy_file(source, dest)
        }
    }

    fn create_dir(&self, path: &Path) -> FsResult<()> {
        fs::create_dir(path).map_err(|e| FsError::io("mkdir", path, e))
    }

    fn create_dir_all(&self, path: &Path) -> FsResult<()> {
        fs::create_dir_all(path).map_err(|e| FsError::io("mkdir", path, e))
    }

    fn remove_file(&self, path: &Path) -> FsResult<()> {
        fs::remove_file(path).map_err(|e| FsError::io("unlink", path, e))
    }

    fn remove_dir(&self, path: &Path) -> FsResult<()> {
        fs::remove_dir(path).map_err(|e| FsError::io("rmdir", path, e))
    }

    fn remove_link(&self, path: &Path) -> FsResult<()> {
        if !self.symlinks {
            return fs::remove_dir_all(path).map_err(|e| FsError::io("rmrf", path, e));
        }
        // Windows directory links are removed as directories.
        #[cfg(windows)]
        let removed = fs::remove_dir(path);
        #[cfg(not(windows))]
        let removed = fs::remove_file(path);
        removed.map_err(|e| FsError::io("unlink", path, e))
    }

    fn remove_dir_all(&self, path: &Path) -> FsResult<()> {
        match fs::remove_dir_all(path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(FsError::io("rmrf", path, e)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn read_dir_lists_names() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("a.txt"), b"a").unwrap();
        fs::create_dir(dir.path().join("sub")).unwrap();

        let mut names = OsFileSystem::with_symlinks(false)
            .read_dir(dir.path())
            .unwrap();
        names.sort();
        assert_eq!(names, vec!["a.txt".to_string(), "sub".to_string()]);
    }

    #[test]
    fn read_dir_missing_path_reports_path() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope");
        let err = OsFileSystem::with_symlinks(false)
            .read_dir(&missing)
            .unwrap_err();
        assert_eq!(err.io_kind(), Some(io::ErrorKind::NotFound));
        assert!(err.to_string().contains("readdir"));
        assert!(err.to_string().contains("nope"));
    }

    #[test]
    fn stat_reports_kind_and_size() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("five"), b"12345").unwrap();
        let fs_impl = OsFileSystem::with_symlinks(false);

        let file = fs_impl.stat(&dir.path().join("five")).unwrap();
        assert_eq!(file.kind, EntryKind::File);
        assert_eq!(file.size, 5);
        assert!(file.mtime.is_some());

        let root = fs_impl.stat(dir.path()).unwrap();
        assert_eq!(root.kind, EntryKind::Directory { linked: false });
    }

    #[test]
    fn materialize_copies_files_without_symlinks() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("src.txt");
        let dest = dir.path().join("dest.txt");
        fs::write(&source, b"payload").unwrap();

        OsFileSystem::with_symlinks(false)
            .materialize(&source, &dest)
            .unwrap();

        assert!(!fs::symlink_metadata(&dest).unwrap().file_type().is_symlink());
        assert_eq!(fs::read(&dest).unwrap(), b"payload");
    }

    #[test]
    fn materialize_copies_directory_trees_without_symlinks() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("src");
        fs::create_dir_all(source.join("nested")).unwrap();
        fs::write(source.join("nested/leaf"), b"leaf").unwrap();
        let dest = dir.path().join("dest");

        let fs_impl = OsFileSystem::with_symlinks(false);
        fs_impl.materialize(&source, &dest).unwrap();
        assert_eq!(fs::read(dest.join("nested/leaf")).unwrap(), b"leaf");

        fs_impl.remove_link(&dest).unwrap();
        assert!(!dest.exists());
        assert!(source.join("nested/leaf").exists());
    }

    #[cfg(unix)]
    #[test]
    fn materialize_links_when_supported() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("src");
        fs::create_dir(&source).unwrap();
        fs::write(source.join("inner"), b"x").unwrap();
        let dest = dir.path().join("dest");

        let fs_impl = OsFileSystem::with_symlinks(true);
        fs_impl.materialize(&source, &dest).unwrap();
        assert!(fs::symlink_metadata(&dest).unwrap().file_type().is_symlink());
        assert_eq!(fs::read(dest.join("inner")).unwrap(), b"x");

        fs_impl.remove_link(&dest).unwrap();
        assert!(fs::symlink_metadata(&dest).is_err());
        assert!(source.join("inner").exists());
    }

    #[test]
    fn copy_refuses_to_overwrite_existing_destination() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("src.txt");
        let dest = dir.path().join("dest.txt");
        fs::write(&source, b"new").unwrap();
        fs::write(&dest, b"user data").unwrap();

        let err = OsFileSystem::with_symlinks(false)
            .materialize(&source, &dest)
            .unwrap_err();
        assert_eq!(err.io_kind(), Some(io::ErrorKind::AlreadyExists));
        assert_eq!(fs::read(&dest).unwrap(), b"user data");
    }

    #[test]
    fn copy_tree_refuses_existing_destination() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("src");
        fs::create_dir(&source).unwrap();
        fs::write(source.join("leaf"), b"new").unwrap();
        let dest = dir.path().join("dest");
        fs::create_dir(&dest).unwrap();

        let err = OsFileSystem::with_symlinks(false)
            .materialize(&source, &dest)
            .unwrap_err();
        assert_eq!(err.io_kind(), Some(io::ErrorKind::AlreadyExists));
        assert!(!dest.join("leaf").exists());
    }

    #[cfg(unix)]
    #[test]
    fn copy_keeps_permissions() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("run.sh");
        fs::write(&source, b"#!/bin/sh\n").unwrap();
        fs::set_permissions(&source, fs::Permissions::from_mode(0o755)).unwrap();
        let dest = dir.path().join("copy.sh");

        OsFileSystem::with_symlinks(false)
            .materialize(&source, &dest)
            .unwrap();
        let mode = fs::metadata(&dest).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o755);
    }

    #[cfg(unix)]
    #[test]
    fn links_point_at_the_resolved_target() {
        let dir = tempfile::tempdir().unwrap();
        let real = dir.path().join("real.txt");
        fs::write(&real, b"x").unwrap();
        let input = dir.path().join("in");
        fs::create_dir(&input).unwrap();
        std::os::unix::fs::symlink(&real, input.join("alias")).unwrap();
        let dest = dir.path().join("out");

        OsFileSystem::with_symlinks(true)
            .materialize(&input.join("alias"), &dest)
            .unwrap();
        assert_eq!(fs::read_link(&dest).unwrap(), fs::canonicalize(&real).unwrap());
    }

    #[test]
    fn resolve_path_normalizes_dots_and_missing_tails() {
        let dir = tempfile::tempdir().unwrap();
        let root = fs::canonicalize(dir.path()).unwrap();
        fs::create_dir(root.join("in")).unwrap();

        assert_eq!(resolve_path(&root.join("in/./sub/../out")), root.join("in/out"));
        assert_eq!(resolve_path(&root.join("x/../in/new/deeper")), root.join("in/new/deeper"));
        assert_eq!(resolve_path(&root.join("in")), root.join("in"));
    }

    #[cfg(unix)]
    #[test]
    fn resolve_path_follows_links_in_existing_prefix() {
        let dir = tempfile::tempdir().unwrap();
        let root = fs::canonicalize(dir.path()).unwrap();
        fs::create_dir(root.join("in")).unwrap();
        std::os::unix::fs::symlink(root.join("in"), root.join("alias")).unwrap();

        assert_eq!(resolve_path(&root.join("alias/out")), root.join("in/out"));
    }

    #[cfg(unix)]
    #[test]
    fn probe_detects_symlinks_on_unix() {
        assert!(probe_symlink_support());
        assert!(OsFileSystem::new().supports_symlinks());
    }

    #[test]
    fn remove_dir_only_removes_empty_directories() {
        let dir = tempfile::tempdir().unwrap();
        let sub = dir.path().join("sub");
        fs::create_dir(&sub).unwrap();
        fs::write(sub.join("f"), b"").unwrap();
        let fs_impl = OsFileSystem::with_symlinks(false);

        assert!(fs_impl.remove_dir(&sub).is_err());
        fs_impl.remove_file(&sub.join("f")).unwrap();
        fs_impl.remove_dir(&sub).unwrap();
        assert!(!sub.exists());
    }

    #[test]
    fn remove_dir_all_tolerates_missing_path() {
        let dir = tempfile::tempdir().unwrap();
        let fs_impl = OsFileSystem::with_symlinks(false);
        fs_impl.remove_dir_all(&dir.path().join("missing")).unwrap();

        let out = dir.path().join("out");
        fs_impl.create_dir_all(&out.join("a/b")).unwrap();
        fs_impl.remove_dir_all(&out).unwrap();
        assert!(!out.exists());
    }
}
