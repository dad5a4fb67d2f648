// src/main.rs

//! uiautomate
//!
//! Entry point for the uiautomate CLI.
//!
//! Runs suites of UI test programs against web browsers and macOS apps,
//! resolving each step's element once and replaying it from a lock file on
//! later runs. All real work happens in the `runner` module.

mod actions;
mod cli;
mod config;
mod engine;
mod lock;
mod orchestrator;
mod platform;
mod program;
mod recording;
mod report;
mod run_id;
mod runner;
mod suite;
mod translate;
mod util;
mod validate;

#[cfg(test)]
mod sinks;

use anyhow::Result;
use clap::Parser;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<ExitCode> {
    // Logs go to stderr; stdout carries reports and status lines.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = cli::Cli::parse();

    let code = runner::run(cli).await?;
    Ok(if code == 0 {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}
