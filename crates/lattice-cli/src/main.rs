// SPDX-License-Identifier: MIT
//! `lattice` — the CLI front end over `lattice-storage`'s write pipeline
//! and read API (spec §6).

mod commands;
mod output;

use std::path::PathBuf;

use anyhow::{Context as _, Result};
use clap::Parser;
use lattice_core::clock::SystemClock;
use lattice_core::id::UlidIdGen;
use lattice_core::Context;
use lattice_storage::{find_root, load_config, LockManager, Paths, ROOT_OVERRIDE_VAR};
use std::sync::Arc;

use commands::Command;
use output::OutputFormat;

#[derive(Parser)]
#[command(
    name = "lattice",
    version,
    about = "An event-sourced, file-based task tracker for agents and humans"
)]
struct Cli {
    /// Run as though started in this directory (default: current directory).
    #[arg(short = 'C', long = "directory", global = true, value_name = "DIR")]
    directory: Option<PathBuf>,

    /// Actor performing this action, as `kind:identifier` (e.g. `human:alice`,
    /// `agent:claude-1`). Falls back to $LATTICE_ACTOR. Required for any
    /// command that writes an event.
    #[arg(long = "actor", global = true)]
    actor: Option<String>,

    /// Output format.
    #[arg(short = 'o', long = "output", value_enum, default_value_t, global = true)]
    output: OutputFormat,

    #[command(subcommand)]
    command: Command,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    if let Err(err) = run() {
        eprintln!("Error: {err:#}");
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();

    let start_dir = match &cli.directory {
        Some(dir) => std::fs::canonicalize(dir)
            .with_context(|| format!("cannot access directory '{}'", dir.display()))?,
        None => std::env::current_dir()?,
    };

    let root = if matches!(cli.command, Command::Init) {
        start_dir.clone()
    } else {
        find_root(Some(&start_dir))?.with_context(|| {
            format!(
                "no .lattice/ project found starting from '{}' (run `lattice init`, or set ${ROOT_OVERRIDE_VAR})",
                start_dir.display()
            )
        })?
    };

    let paths = Paths::new(&root);
    let locks = LockManager::new(paths.locks_dir());
    let config = load_config(&paths).unwrap_or_default();
    let ctx = Context::new(
        root.clone(),
        config,
        Arc::new(SystemClock),
        Arc::new(UlidIdGen),
    );

    let actor = cli
        .actor
        .or_else(|| std::env::var("LATTICE_ACTOR").ok());

    commands::run(
        cli.command,
        &root,
        &ctx,
        &paths,
        &locks,
        actor.as_deref(),
        cli.output,
    )
}

#[cfg(test)]
#[path = "main_tests.rs"]
mod tests;
