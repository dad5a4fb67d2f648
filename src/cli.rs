// src/cli.rs

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::suite::ExecutionMode;

/// Replay-first UI automation runner (web and macOS).
///
/// `automate.yaml` holds the defaults.
/// CLI flags only override settings values.
#[derive(Parser, Debug)]
#[command(name = "uiautomate", version, disable_help_subcommand = true)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run every executable of a suite.
    ///
    /// Exit status is 0 only when every executable succeeded.
    Run {
        /// Path to settings file
        #[arg(short, long, default_value = "automate.yaml")]
        settings: PathBuf,

        /// Override suite file
        #[arg(long)]
        suite: Option<PathBuf>,

        /// Override arguments file (KEY=VALUE lines)
        #[arg(long)]
        arguments: Option<PathBuf>,

        /// Override screenshot root folder
        #[arg(long)]
        recordings: Option<PathBuf>,

        /// Override the suite's execution mode
        #[arg(long, value_enum)]
        mode: Option<ExecutionMode>,
    },

    /// Run a single executable in this process (used by parallel mode).
    #[command(hide = true)]
    Worker {
        #[arg(short, long, default_value = "automate.yaml")]
        settings: PathBuf,

        #[arg(long)]
        arguments: Option<PathBuf>,

        #[arg(long)]
        recordings: Option<PathBuf>,

        /// Runnable file declaring the executable
        #[arg(long)]
        runnable: PathBuf,

        /// Position of the executable inside the runnable
        #[arg(long)]
        index: usize,
    },

    /// Check suite and runnable files without running anything.
    ///
    /// Prints a JSON report.
    Validate {
        #[arg(short, long, default_value = "automate.yaml")]
        settings: PathBuf,

        #[arg(long)]
        suite: Option<PathBuf>,
    },

    /// Initialise a project scaffold.
    ///
    /// Creates:
    /// - automate.yaml
    /// - run.json
    /// - runnables/smoke.json
    /// - tests/smoke.json
    /// - arguments.txt
    Init,
}
