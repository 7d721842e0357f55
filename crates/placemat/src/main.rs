//! Placemat: deterministic weighted placement over migration groups.
//!
//! Reads a line-oriented action script, threads a placement device through
//! every action, and writes a per-step report.

use std::fs;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

mod action;
mod cli;
mod engine;
mod report;

use cli::Cli;
use engine::ActionEngine;

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging();

    let script = fs::read_to_string(&cli.actions)
        .with_context(|| format!("cannot open actions file {}", cli.actions.display()))?;
    let actions = action::parse_script(&script)
        .with_context(|| format!("cannot parse actions file {}", cli.actions.display()))?;
    info!(actions = actions.len(), "script parsed");

    let (_, report) = ActionEngine::new(actions).run()?;

    fs::write(&cli.output, report)
        .with_context(|| format!("cannot write result file {}", cli.output.display()))?;
    Ok(())
}

fn init_logging() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

    tracing_subscriber::registry().with(filter).with(tracing_subscriber::fmt::layer()).init();
}
