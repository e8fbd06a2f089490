#![forbid(unsafe_code)]

//! `stepwise <TARGET> <INPUT> [ASSIGNMENT...]`
//!
//! TARGET is a registered step type or a TOML configuration file naming one.
//! Assignments are `[--]key=value` for the root and
//! `[--]steps.<name>[.<name>...].key=value` for its steps.

mod builtin;
mod telemetry;

use std::path::PathBuf;
use std::process;

use anyhow::Context;
use clap::Parser;
use stepwise::{FileStore, Invocation};

// Tracing target constants
pub const TRACING_TARGET_RUN: &str = "stepwise_cli::run";

#[derive(Debug, Parser)]
#[command(name = "stepwise", version, about = "Run a step or pipeline on an input file")]
struct Cli {
  /// Step type name, or path to a configuration file with a `class` entry.
  #[arg(required_unless_present = "list")]
  target: Option<String>,

  /// Input file.
  #[arg(required_unless_present = "list")]
  input: Option<PathBuf>,

  /// Parameter overrides: `key=value` or `steps.<path>.key=value`, with or
  /// without a leading `--`.
  #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
  assignments: Vec<String>,

  /// List the registered step types and exit.
  #[arg(long)]
  list: bool,
}

#[tokio::main]
async fn main() {
  let Err(error) = run().await else {
    process::exit(0);
  };

  if tracing::enabled!(tracing::Level::ERROR) {
    tracing::error!(target: TRACING_TARGET_RUN, error = %format!("{error:#}"), "run failed");
  } else {
    eprintln!("Error: {error:#}");
  }

  process::exit(1);
}

async fn run() -> anyhow::Result<()> {
  let cli = Cli::parse();
  telemetry::init_tracing()?;

  let registry = builtin::registry();
  if cli.list {
    for name in registry.type_names() {
      println!("{name}");
    }
    return Ok(());
  }

  let (Some(target), Some(input)) = (cli.target, cli.input) else {
    anyhow::bail!("a target and an input are required");
  };

  let invocation = Invocation::new(target, input, &cli.assignments).context("invalid command line")?;
  tracing::info!(
    target: TRACING_TARGET_RUN,
    step = %invocation.target,
    input = %invocation.input.display(),
    working_dir = %invocation.working_dir.display(),
    "starting run"
  );

  let report = registry.run(&invocation, &FileStore).await?;
  for artifact in &report.artifacts {
    tracing::info!(
      target: TRACING_TARGET_RUN,
      step = %artifact.step_path,
      path = %artifact.path.display(),
      "saved"
    );
  }
  Ok(())
}
