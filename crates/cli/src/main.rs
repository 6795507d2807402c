use std::{io, path::PathBuf, process::ExitCode};

use anyhow::{Context, Result};
use clap::Parser;
use opsblade_engine::Workflow;
use tracing::debug;
use tracing_subscriber::EnvFilter;

/// Execute an OpsBlade workflow from a YAML file or stdin.
#[derive(Parser, Debug)]
#[command(name = "opsblade", version, about)]
struct Args {
    /// Path to the workflow YAML
    #[arg(required_unless_present = "stdin", conflicts_with = "stdin")]
    file: Option<PathBuf>,

    /// Read the workflow from stdin
    #[arg(long, short = 's')]
    stdin: bool,

    /// Print notifications as JSON
    #[arg(long, short = 'j')]
    json: bool,

    /// Simulate side effects instead of performing them
    #[arg(long, short = 'd')]
    dryrun: bool,

    /// Include instructions in start notifications and enable debug logs
    #[arg(long, short = 'v')]
    debug: bool,

    /// Print the loaded workflow and exit without running it
    #[arg(long)]
    dump: bool,
}

fn main() -> Result<ExitCode> {
    let args = Args::parse();
    init_tracing(args.debug);

    println!("OpsBlade v{}\n", env!("CARGO_PKG_VERSION"));

    let mut workflow = Workflow::new()
        .with_json(args.json)
        .with_dry_run(args.dryrun)
        .with_debug(args.debug);

    match &args.file {
        Some(path) => workflow
            .load_file(path)
            .with_context(|| format!("Unable to load tasks from {}", path.display()))?,
        None => workflow
            .load_reader(io::stdin().lock())
            .context("Unable to load tasks from stdin")?,
    }
    debug!(tasks = workflow.tasks().len(), dry_run = workflow.dry_run(), "workflow loaded");

    if args.dump {
        print!("{}", workflow.dump());
        return Ok(ExitCode::SUCCESS);
    }

    if workflow.execute() {
        println!("All tasks complete. Exiting with code 0.");
        Ok(ExitCode::SUCCESS)
    } else {
        println!("Terminating due to failed task. Exiting with code 1.");
        Ok(ExitCode::FAILURE)
    }
}

/// Logs go to stderr so they never interleave with task output on stdout.
fn init_tracing(debug: bool) {
    let default = if debug { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .try_init();
}
