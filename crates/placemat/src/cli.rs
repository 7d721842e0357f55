//! Command line interface definition.

use std::path::PathBuf;

use clap::Parser;

/// Placemat: deterministic weighted placement over migration groups.
#[derive(Debug, Parser)]
#[command(name = "placemat")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Path to the action script to execute.
    #[arg(long, default_value = "actions.cfg")]
    pub actions: PathBuf,

    /// Path the run report is written to.
    #[arg(long, default_value = "result.txt")]
    pub output: PathBuf,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_defaults() {
        let cli = Cli::parse_from(["placemat"]);
        assert_eq!(cli.actions, PathBuf::from("actions.cfg"));
        assert_eq!(cli.output, PathBuf::from("result.txt"));
    }

    #[test]
    fn test_cli_overrides() {
        let cli =
            Cli::parse_from(["placemat", "--actions", "plan.cfg", "--output", "/tmp/out.txt"]);
        assert_eq!(cli.actions, PathBuf::from("plan.cfg"));
        assert_eq!(cli.output, PathBuf::from("/tmp/out.txt"));
    }
}
