//! Lock-step merge of several input trees into one sorted entry list.
//!
//! Each directory level is listed in every input that defines it, checked for
//! conflicts, and resolved into entries. A directory owned by a single input
//! becomes a linked directory (when symlinks are available) and is not
//! descended into; its whole subtree is represented by the one entry.
//!
//! This phase only reads from the inputs.

use std::collections::btree_map::Entry as MapEntry;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use mergetree_fs::FileSystem;
use mergetree_types::{compare_paths, fold_case, join_relative, Entry, Stat};
use tracing::trace;

use crate::error::{MergeError, MergeResult};

/// Merges the listings of all input trees.
pub struct TreeMerger<'a> {
    inputs: &'a [PathBuf],
    fs: &'a dyn FileSystem,
    overwrite: bool,
    symlinks: bool,
}

/// One name at one directory level, accumulated across inputs.
struct Candidate {
    /// Metadata from the latest input defining the name.
    stat: Stat,
    /// Indices of the inputs defining the name, ascending.
    sources: Vec<usize>,
}

impl Candidate {
    fn last_source(&self) -> usize {
        // `sources` is never empty: candidates are created with one index.
        self.sources[self.sources.len() - 1]
    }
}

impl<'a> TreeMerger<'a> {
    /// Create a merger over `inputs`, in priority order (later wins).
    ///
    /// `symlinks` says whether single-source directories may be linked.
    pub fn new(inputs: &'a [PathBuf], fs: &'a dyn FileSystem, overwrite: bool, symlinks: bool) -> Self {
        Self {
            inputs,
            fs,
            overwrite,
            symlinks,
        }
    }

    /// Merge the whole input union, sorted by [`compare_paths`].
    pub fn merge(&self) -> MergeResult<Vec<Entry>> {
        let all: Vec<usize> = (0..self.inputs.len()).collect();
        self.merge_at("", &all)
    }

    /// Merge everything below `relative_dir` across the given inputs.
    ///
    /// Returns the entries for every descendant (not `relative_dir` itself),
    /// flattened and sorted by [`compare_paths`].
    pub fn merge_at(&self, relative_dir: &str, candidates: &[usize]) -> MergeResult<Vec<Entry>> {
        let mut result = Vec::new();
        let mut pending = vec![(relative_dir.to_string(), candidates.to_vec())];

        while let Some((dir, sources)) = pending.pop() {
            self.merge_level(&dir, &sources, &mut result, &mut pending)?;
        }

        result.sort_by(|a, b| compare_paths(&a.relative_path, &b.relative_path));
        Ok(result)
    }

    fn input_path(&self, index: usize, relative: &str) -> PathBuf {
        let root = &self.inputs[index];
        if relative.is_empty() {
            root.clone()
        } else {
            root.join(relative)
        }
    }

    fn input_root(&self, index: usize) -> &Path {
        &self.inputs[index]
    }

    /// Resolve one directory level, pushing entries into `result` and the
    /// subdirectories that need merging into `pending`.
    fn merge_level(
        &self,
        dir: &str,
        sources: &[usize],
        result: &mut Vec<Entry>,
        pending: &mut Vec<(String, Vec<usize>)>,
    ) -> MergeResult<()> {
        let mut listings = Vec::with_capacity(sources.len());
        for &index in sources {
            let mut names = self.fs.read_dir(&self.input_path(index, dir))?;
            names.sort_by(|a, b| compare_paths(a, b));
            listings.push((index, names));
        }
        trace!(dir, inputs = sources.len(), "merging level");

        self.check_capitalization(dir, &listings)?;

        // Past this point equal names are byte-identical.
        let mut candidates: BTreeMap<&str, Candidate> = BTreeMap::new();
        for (index, names) in &listings {
            for name in names {
                let path = join_relative(dir, name);
                let stat = self.fs.stat(&self.input_path(*index, &path))?;
                match candidates.entry(name.as_str()) {
                    MapEntry::Vacant(slot) => {
                        slot.insert(Candidate {
                            stat,
                            sources: vec![*index],
                        });
                    }
                    MapEntry::Occupied(mut slot) => {
                        let candidate = slot.get_mut();
                        let first = candidate.sources[0];
                        if candidate.stat.kind.is_directory() != stat.kind.is_directory() {
                            return Err(MergeError::TypeConflict {
                                path,
                                first_kind: candidate.stat.kind,
                                first_input: self.input_root(first).to_path_buf(),
                                second_kind: stat.kind,
                                second_input: self.input_root(*index).to_path_buf(),
                            });
                        }
                        if !stat.kind.is_directory() && !self.overwrite {
                            return Err(MergeError::OverwriteConflict {
                                path,
                                first_input: self.input_root(first).to_path_buf(),
                                second_input: self.input_root(*index).to_path_buf(),
                            });
                        }
                        candidate.stat = stat;
                        candidate.sources.push(*index);
                    }
                }
            }
        }

        for (name, candidate) in candidates {
            let path = join_relative(dir, name);
            let base = self.input_root(candidate.last_source()).to_path_buf();
            let entry = Entry::new(path.clone(), base, candidate.stat);

            if !entry.is_directory() {
                result.push(entry);
            } else if candidate.sources.len() == 1 && self.symlinks {
                result.push(entry.with_linked(true));
            } else {
                result.push(entry.with_linked(false));
                pending.push((path, candidate.sources));
            }
        }
        Ok(())
    }

    /// Fail if two names at this level fold to the same case but differ.
    fn check_capitalization(&self, dir: &str, listings: &[(usize, Vec<String>)]) -> MergeResult<()> {
        let mut seen: BTreeMap<String, (usize, &str)> = BTreeMap::new();
        for (index, names) in listings {
            for name in names {
                match seen.entry(fold_case(name)) {
                    MapEntry::Vacant(slot) => {
                        slot.insert((*index, name.as_str()));
                    }
                    MapEntry::Occupied(slot) => {
                        let (first_index, first_name) = *slot.get();
                        if first_name != name {
                            return Err(MergeError::CapitalizationConflict {
                                first_path: join_relative(dir, first_name),
                                first_input: self.input_root(first_index).to_path_buf(),
                                second_path: join_relative(dir, name),
                                second_input: self.input_root(*index).to_path_buf(),
                            });
                        }
                    }
                }
            }
        }
        Ok(())
    }
}
