//! Nested directory fixtures for tests.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use crate::{ApplyStats, MergeOptions, MergeResult, MergeSession};

/// A file's contents or a directory's children.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Fixture {
    File(String),
    Dir(BTreeMap<String, Fixture>),
}

pub fn file(contents: &str) -> Fixture {
    Fixture::File(contents.to_string())
}

pub fn dir<const N: usize>(children: [(&str, Fixture); N]) -> Fixture {
    Fixture::Dir(
        children
            .into_iter()
            .map(|(name, child)| (name.to_string(), child))
            .collect(),
    )
}

/// Write the children of a `Fixture::Dir` into an existing directory.
pub fn write_fixture(root: &Path, fixture: &Fixture) {
    let Fixture::Dir(children) = fixture else {
        panic!("fixture root must be a directory");
    };
    for (name, child) in children {
        let path = root.join(name);
        match child {
            Fixture::File(contents) => fs::write(&path, contents).unwrap(),
            Fixture::Dir(_) => {
                fs::create_dir(&path).unwrap();
                write_fixture(&path, child);
            }
        }
    }
}

/// Read a directory back into a fixture, following symlinks.
pub fn read_fixture(root: &Path) -> Fixture {
    let mut tree = BTreeMap::new();
    for entry in WalkDir::new(root).follow_links(true).min_depth(1) {
        let entry = entry.unwrap();
        let relative = entry.path().strip_prefix(root).unwrap();
        let names: Vec<String> = relative
            .components()
            .map(|c| c.as_os_str().to_string_lossy().into_owned())
            .collect();
        let (leaf, parents) = names.split_last().unwrap();

        let mut level = &mut tree;
        for parent in parents {
            level = match level.get_mut(parent) {
                Some(Fixture::Dir(children)) => children,
                other => panic!("{parent} is not a directory: {other:?}"),
            };
        }
        let node = if entry.file_type().is_dir() {
            Fixture::Dir(BTreeMap::new())
        } else {
            Fixture::File(fs::read_to_string(entry.path()).unwrap())
        };
        level.insert(leaf.clone(), node);
    }
    Fixture::Dir(tree)
}

/// A session over `n` scratch inputs whose contents are replaced on every
/// merge.
pub struct MergeFixtures {
    root: tempfile::TempDir,
    inputs: Vec<PathBuf>,
    output: PathBuf,
    pub session: MergeSession,
}

impl MergeFixtures {
    pub fn new(n: usize, options: MergeOptions) -> Self {
        let root = tempfile::tempdir().unwrap();
        let output = root.path().join("out");
        fs::create_dir(&output).unwrap();
        let inputs: Vec<PathBuf> = (0..n).map(|i| root.path().join(i.to_string())).collect();
        for input in &inputs {
            fs::create_dir(input).unwrap();
        }
        let session = MergeSession::new(inputs.clone(), output.clone(), options).unwrap();
        Self {
            root,
            inputs,
            output,
            session,
        }
    }

    pub fn output(&self) -> &Path {
        &self.output
    }

    pub fn scratch(&self) -> &Path {
        self.root.path()
    }

    /// Replace every input with the given fixture and merge.
    pub fn merge_stats(&mut self, fixtures: Vec<Fixture>) -> MergeResult<ApplyStats> {
        assert_eq!(fixtures.len(), self.inputs.len(), "one fixture per input");
        for (input, fixture) in self.inputs.iter().zip(&fixtures) {
            fs::remove_dir_all(input).unwrap();
            fs::create_dir(input).unwrap();
            write_fixture(input, fixture);
        }
        self.session.merge()
    }

    /// Replace every input, merge, and read the output back.
    pub fn merge(&mut self, fixtures: Vec<Fixture>) -> MergeResult<Fixture> {
        self.merge_stats(fixtures)?;
        Ok(read_fixture(&self.output))
    }
}

/// Merge fixtures once into a fresh output.
pub fn merge_fix(fixtures: Vec<Fixture>, options: MergeOptions) -> MergeResult<Fixture> {
    MergeFixtures::new(fixtures.len(), options).merge(fixtures)
}
