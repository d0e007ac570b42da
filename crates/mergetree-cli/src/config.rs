use std::path::{Path, PathBuf};

use anyhow::Context;
use mergetree_merge::MergeOptions;
use serde::{Deserialize, Serialize};

use crate::cli::MergeArgs;

/// Contents of a merge config file.
///
/// ```toml
/// inputs = ["vendor", "app"]
/// output = "dist"
/// overwrite = true
/// annotation = "assets"
/// ```
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MergeConfig {
    pub inputs: Vec<PathBuf>,
    pub output: Option<PathBuf>,
    #[serde(flatten)]
    pub options: MergeOptions,
}

impl MergeConfig {
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        toml::from_str(&text).with_context(|| format!("parsing config {}", path.display()))
    }

    /// Build the effective configuration: the config file (if any) with
    /// command-line arguments layered on top.
    pub fn resolve(args: &MergeArgs) -> anyhow::Result<Self> {
        let mut config = match &args.config {
            Some(path) => Self::load(path)?,
            None => Self::default(),
        };
        if !args.inputs.is_empty() {
            config.inputs = args.inputs.clone();
        }
        if args.output.is_some() {
            config.output = args.output.clone();
        }
        if args.overwrite {
            config.options.overwrite = true;
        }
        if args.annotation.is_some() {
            config.options.annotation = args.annotation.clone();
        }
        if args.no_symlinks {
            config.options.symlinks = Some(false);
        }
        Ok(config)
    }
}
