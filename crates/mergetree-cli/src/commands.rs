use colored::Colorize;
use mergetree_diff::{Operation, Patch};
use mergetree_merge::{ApplyStats, MergeOptions, MergeSession};
use tracing::debug;

use crate::cli::*;
use crate::config::MergeConfig;

pub fn run_command(cli: Cli) -> anyhow::Result<()> {
    match cli.command {
        Command::Merge(args) => cmd_merge(&args, &cli.format),
        Command::Plan(args) => cmd_plan(&args, &cli.format),
    }
}

fn open_session(args: &MergeArgs) -> anyhow::Result<MergeSession> {
    let MergeConfig { inputs, output, options } = MergeConfig::resolve(args)?;
    let Some(output) = output else {
        anyhow::bail!("no output directory given (use --output or set `output` in the config file)");
    };
    debug!(inputs = inputs.len(), output = %output.display(), overwrite = options.overwrite, "resolved merge config");
    Ok(MergeSession::new(inputs, output, options)?)
}

fn cmd_merge(args: &MergeArgs, format: &OutputFormat) -> anyhow::Result<()> {
    let mut session = open_session(args)?;
    if args.clean {
        session.reset()?;
    }
    let stats = session.merge()?;
    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&stats)?),
        OutputFormat::Text => print_stats(&session, &stats),
    }
    Ok(())
}

fn cmd_plan(args: &MergeArgs, format: &OutputFormat) -> anyhow::Result<()> {
    let session = open_session(args)?;
    let patch = session.plan()?;
    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&patch)?),
        OutputFormat::Text => print_plan(&patch, session.options()),
    }
    Ok(())
}

fn print_stats(session: &MergeSession, stats: &ApplyStats) {
    println!(
        "{} Merged {} inputs into {}",
        "✓".green().bold(),
        session.inputs().len().to_string().bold(),
        session.output().display().to_string().bold()
    );
    println!(
        "  mkdir {}  rmdir {}  unlink {}  create {}  change {}",
        stats.mkdir, stats.rmdir, stats.unlink, stats.create, stats.change
    );
    if stats.linked > 0 {
        println!("  {} directories linked", stats.linked.to_string().cyan());
    }
}

fn print_plan(patch: &Patch, options: &MergeOptions) {
    if patch.is_empty() {
        println!("Nothing to do.");
        return;
    }
    if let Some(annotation) = &options.annotation {
        println!("Plan for {}:", annotation.yellow());
    }
    for op in patch {
        let name = match op.operation() {
            Operation::Mkdir | Operation::Create => op.operation().as_str().green(),
            Operation::Rmdir | Operation::Unlink => op.operation().as_str().red(),
            Operation::Change => op.operation().as_str().yellow(),
        };
        let suffix = if op.entry().is_linked_directory() { " (link)".dimmed() } else { "".normal() };
        println!("  {:<6} {}{}", name, op.relative_path(), suffix);
    }
    println!("{} operations", patch.len().to_string().bold());
}
