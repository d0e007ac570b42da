use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "mergetree",
    about = "Merge several directory trees into one output directory",
    version,
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[arg(long, global = true, default_value = "text")]
    pub format: OutputFormat,
}

#[derive(Clone, Debug, clap::ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
pub enum Command {
    /// Merge the inputs into the output directory
    Merge(MergeArgs),
    /// Show the operations a merge into an empty output would perform
    Plan(MergeArgs),
}

#[derive(Args, Clone, Debug, Default)]
pub struct MergeArgs {
    /// Input directories, lowest priority first
    pub inputs: Vec<PathBuf>,
    /// Output directory
    #[arg(short, long)]
    pub output: Option<PathBuf>,
    /// Let later inputs overwrite files from earlier ones
    #[arg(long)]
    pub overwrite: bool,
    /// Label shown in log output
    #[arg(long)]
    pub annotation: Option<String>,
    /// Always copy instead of creating symlinks
    #[arg(long)]
    pub no_symlinks: bool,
    /// TOML file with inputs, output, and options
    #[arg(short, long)]
    pub config: Option<PathBuf>,
    /// Delete the output directory before merging
    #[arg(long)]
    pub clean: bool,
}
