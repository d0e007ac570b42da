//! The merge session: owns the previous merged tree across calls.
//!
//! A session is either empty (no previous tree, the next merge is a full
//! build) or converged (the previous tree matches the output directory). Any
//! failure drops the previous tree and deletes the output, so the next merge
//! always rebuilds from scratch instead of patching a half-applied output.
//!
//! A full build only starts on a missing or empty output directory, so the
//! failure cleanup never deletes anything the session did not create.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use mergetree_diff::{calculate_patch, default_is_equal, Patch};
use mergetree_fs::{resolve_path, FileSystem, OsFileSystem};
use mergetree_types::Entry;
use tracing::{debug, info_span, warn};

use crate::applier::{ApplyStats, PatchApplier};
use crate::error::{MergeError, MergeResult};
use crate::merger::TreeMerger;
use crate::options::MergeOptions;

/// Incrementally merges an ordered list of input trees into one output.
///
/// `merge` takes `&mut self`, so one session cannot run two merges at once.
/// Sessions on disjoint outputs share nothing and may run in parallel.
pub struct MergeSession {
    inputs: Vec<PathBuf>,
    output: PathBuf,
    options: MergeOptions,
    fs: Arc<dyn FileSystem>,
    symlinks: bool,
    /// Last successfully applied tree; empty before the first merge and
    /// after a failure.
    previous_tree: Vec<Entry>,
}

impl std::fmt::Debug for MergeSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MergeSession")
            .field("inputs", &self.inputs)
            .field("output", &self.output)
            .field("options", &self.options)
            .field("symlinks", &self.symlinks)
            .field("previous_tree", &self.previous_tree.len())
            .finish()
    }
}

impl MergeSession {
    /// Create a session on the host filesystem.
    ///
    /// Symlink support is probed once here unless `options.symlinks` forces
    /// it.
    pub fn new<I, P>(inputs: I, output: impl Into<PathBuf>, options: MergeOptions) -> MergeResult<Self>
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        let fs = match options.symlinks {
            Some(symlinks) => OsFileSystem::with_symlinks(symlinks),
            None => OsFileSystem::new(),
        };
        Self::with_file_system(inputs, output, options, Arc::new(fs))
    }

    /// Create a session over a custom filesystem.
    ///
    /// The filesystem's symlink capability is queried once, here.
    pub fn with_file_system<I, P>(
        inputs: I,
        output: impl Into<PathBuf>,
        options: MergeOptions,
        fs: Arc<dyn FileSystem>,
    ) -> MergeResult<Self>
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        let inputs: Vec<PathBuf> = inputs.into_iter().map(Into::into).collect();
        let output = output.into();
        validate_paths(&inputs, &output)?;

        let symlinks = fs.supports_symlinks();
        Ok(Self {
            inputs,
            output,
            options,
            fs,
            symlinks,
            previous_tree: Vec::new(),
        })
    }

    /// Input roots, in priority order.
    pub fn inputs(&self) -> &[PathBuf] {
        &self.inputs
    }

    /// Output root.
    pub fn output(&self) -> &Path {
        &self.output
    }

    pub fn options(&self) -> &MergeOptions {
        &self.options
    }

    /// Whether single-source directories are linked rather than walked.
    pub fn supports_symlinks(&self) -> bool {
        self.symlinks
    }

    /// Run one merge cycle: merge the inputs, diff against the previous
    /// tree, apply the patch.
    ///
    /// On success the new tree becomes the previous tree. On any error the
    /// previous tree is discarded, the output directory is deleted, and the
    /// original error is returned.
    ///
    /// A session without a previous tree first checks that the output is
    /// missing or empty and returns [`MergeError::OutputNotEmpty`] otherwise,
    /// leaving the output untouched. Use [`reset`](Self::reset) to clear it.
    pub fn merge(&mut self) -> MergeResult<ApplyStats> {
        let span = info_span!(
            "merge",
            name = %self.options.display_name(),
            output = %self.output.display()
        );
        let _guard = span.enter();

        if self.previous_tree.is_empty() {
            self.check_output_empty()?;
        }

        match self.try_merge() {
            Ok((tree, stats)) => {
                debug!(
                    mkdir = stats.mkdir,
                    rmdir = stats.rmdir,
                    unlink = stats.unlink,
                    create = stats.create,
                    change = stats.change,
                    linked = stats.linked,
                    "patches applied"
                );
                self.previous_tree = tree;
                Ok(stats)
            }
            Err(err) => {
                warn!(error = %err, "merge failed, starting from scratch next time");
                self.previous_tree = Vec::new();
                if let Err(cleanup) = self.fs.remove_dir_all(&self.output) {
                    warn!(error = %cleanup, "failed to remove output after merge failure");
                }
                Err(err)
            }
        }
    }

    /// Forget the previous tree and delete the output directory, so the next
    /// merge is a full build into a fresh output.
    pub fn reset(&mut self) -> MergeResult<()> {
        debug!(output = %self.output.display(), "resetting session");
        self.previous_tree.clear();
        self.fs.remove_dir_all(&self.output)?;
        Ok(())
    }

    fn check_output_empty(&self) -> MergeResult<()> {
        match self.fs.read_dir(&self.output) {
            Ok(names) if names.is_empty() => Ok(()),
            Ok(_) => Err(MergeError::OutputNotEmpty(self.output.clone())),
            Err(err) if err.io_kind() == Some(std::io::ErrorKind::NotFound) => Ok(()),
            Err(err) => Err(err.into()),
        }
    }

    /// Compute the patch the next [`merge`](Self::merge) would apply,
    /// without touching the output or the session state.
    pub fn plan(&self) -> MergeResult<Patch> {
        let tree = self.merged_tree()?;
        Ok(calculate_patch(&self.previous_tree, &tree, default_is_equal)?)
    }

    fn merged_tree(&self) -> MergeResult<Vec<Entry>> {
        TreeMerger::new(&self.inputs, self.fs.as_ref(), self.options.overwrite, self.symlinks).merge()
    }

    fn try_merge(&self) -> MergeResult<(Vec<Entry>, ApplyStats)> {
        debug!("deriving patches");
        let tree = self.merged_tree()?;
        let patch = calculate_patch(&self.previous_tree, &tree, default_is_equal)?;
        debug!(entries = tree.len(), patches = patch.len(), "derived patches");

        debug!("applying patches");
        let stats = PatchApplier::new(self.fs.as_ref(), &self.output).apply(&patch)?;
        Ok((tree, stats))
    }
}

/// Reject paths the session cannot safely work with.
///
/// The output is deleted wholesale on failure, so it must not overlap any
/// input. Both sides are compared after [`resolve_path`], so `.`, `..` and
/// symlinked prefixes cannot hide an overlap.
fn validate_paths(inputs: &[PathBuf], output: &Path) -> MergeResult<()> {
    if output.as_os_str().is_empty() {
        return Err(MergeError::InputShape("output path is empty".to_string()));
    }
    let resolved_output = resolve_path(output);
    for (index, input) in inputs.iter().enumerate() {
        if input.as_os_str().is_empty() {
            return Err(MergeError::InputShape(format!("input path #{index} is empty")));
        }
        let resolved_input = resolve_path(input);
        if resolved_output.starts_with(&resolved_input) || resolved_input.starts_with(&resolved_output) {
            return Err(MergeError::InputShape(format!(
                "output path {} overlaps input path {}",
                output.display(),
                input.display()
            )));
        }
    }
    Ok(())
}
