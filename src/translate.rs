// src/translate.rs

//! English-to-JSON translation.
//!
//! The runner does NOT parse English itself. It either:
//! - spawns the configured translator as `<command...> <input> <output>`
//! - or, with no translator configured, accepts scripts that are already
//!   JSON programs
//!
//! Either way the output is a program file next to the script, with the
//! script's extension replaced by `.json`.

use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::process::Command as TokioCommand;

use crate::config::TranslatorConfig;

#[async_trait]
pub trait Translator: Send + Sync {
    async fn translate(&self, input: &Path, output: &Path) -> Result<()>;
}

/// Translated program path for a script: `tests/login.txt` → `tests/login.json`.
pub fn translated_path(script: &Path) -> PathBuf {
    script.with_extension("json")
}

/// Build the translator described by the settings.
pub fn from_config(cfg: &TranslatorConfig) -> Box<dyn Translator> {
    match cfg.command.split_first() {
        Some((program, args)) => Box::new(ExternalTranslator {
            program: program.clone(),
            args: args.to_vec(),
        }),
        None => Box::new(PassthroughTranslator),
    }
}

/// Runs an external translator process.
#[derive(Debug, Clone)]
pub struct ExternalTranslator {
    pub program: String,
    pub args: Vec<String>,
}

#[async_trait]
impl Translator for ExternalTranslator {
    async fn translate(&self, input: &Path, output: &Path) -> Result<()> {
        let out = TokioCommand::new(&self.program)
            .args(&self.args)
            .arg(input)
            .arg(output)
            .stdout(Stdio::inherit())
            .stderr(Stdio::piped())
            .output()
            .await
            .with_context(|| format!("Failed to spawn translator {:?}", self.program))?;

        if !out.status.success() {
            bail!(
                "Translator failed on {:?} ({}): {}",
                input,
                out.status,
                String::from_utf8_lossy(&out.stderr).trim()
            );
        }

        if !output.is_file() {
            bail!("Translator did not produce {:?}", output);
        }

        Ok(())
    }
}

/// Used when no translator is configured: the script must already be JSON.
#[derive(Debug, Clone, Copy, Default)]
pub struct PassthroughTranslator;

#[async_trait]
impl Translator for PassthroughTranslator {
    async fn translate(&self, input: &Path, output: &Path) -> Result<()> {
        let is_json = input
            .extension()
            .and_then(|s| s.to_str())
            .map(|e| e.eq_ignore_ascii_case("json"))
            .unwrap_or(false);

        if !is_json {
            bail!(
                "No translator configured and {:?} is not a JSON program \
                 (set translator.command in automate.yaml)",
                input
            );
        }

        if input == output {
            return Ok(());
        }

        tokio::fs::copy(input, output)
            .await
            .with_context(|| format!("Failed to copy {:?} to {:?}", input, output))?;

        Ok(())
    }
}
