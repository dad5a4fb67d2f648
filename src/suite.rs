// src/suite.rs

//! Suite, runnable and arguments files.
//!
//! A suite names the runnables to execute and how to dispatch them.
//! Each runnable pins a platform and lists its executables.
//!
//! All paths are taken as written, relative to the working directory.

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use crate::util::read_to_string;

/// Read-only KEY=VALUE mapping passed to every executable.
pub type Arguments = BTreeMap<String, String>;

/// Top-level suite file.
///
/// {
///   "execution-mode": "parallel" | "serial",
///   "runnables": ["runnables/web.json", ...]
/// }
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Suite {
    #[serde(rename = "execution-mode")]
    pub execution_mode: ExecutionMode,

    pub runnables: Vec<PathBuf>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum ExecutionMode {
    Parallel,
    Serial,
}

/// A runnable file: one platform + ordered executables.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Runnable {
    /// Platform identifier, resolved with [`PlatformKind::from_str`].
    ///
    /// Kept as a string so an unsupported value fails the runnable's
    /// executables one by one instead of the whole suite.
    pub platform: String,

    pub executables: Vec<ExecutableDescriptor>,
}

/// One test program to run end-to-end.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct ExecutableDescriptor {
    pub name: String,

    #[serde(rename = "type")]
    pub kind: ExecutableKind,

    pub location: PathBuf,
}

/// Where an executable's instructions come from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ExecutableKind {
    /// English script on disk, translated next to itself as `.json`.
    File,

    /// Anything this runner does not know how to load.
    #[serde(other)]
    Unsupported,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum PlatformKind {
    Web,
    Mac,
}

impl FromStr for PlatformKind {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "web" => Ok(Self::Web),
            "mac" => Ok(Self::Mac),
            other => bail!("Unsupported platform: {:?}", other),
        }
    }
}

impl fmt::Display for PlatformKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Web => f.write_str("web"),
            Self::Mac => f.write_str("mac"),
        }
    }
}

impl Suite {
    pub fn load(path: &Path) -> Result<Self> {
        let raw = read_to_string(path)?;
        serde_json::from_str(&raw)
            .with_context(|| format!("Suite file is not valid: {:?}", path))
    }
}

impl Runnable {
    pub fn load(path: &Path) -> Result<Self> {
        let raw = read_to_string(path)?;
        serde_json::from_str(&raw)
            .with_context(|| format!("Runnable file is not valid: {:?}", path))
    }
}

/// Load the arguments file.
///
/// Each non-empty line is `KEY=VALUE`; lines starting with `#` are ignored.
/// Values are kept exactly as written after the first `=`: no quoting,
/// no inline comments, no `$VAR` substitution.
/// A missing file yields an empty mapping.
pub fn load_arguments(path: &Path) -> Result<Arguments> {
    let mut arguments = Arguments::new();

    if !path.is_file() {
        return Ok(arguments);
    }

    let raw = read_to_string(path)?;

    for (n, line) in raw.lines().enumerate() {
        if line.trim().is_empty() || line.trim_start().starts_with('#') {
            continue;
        }

        let Some((key, value)) = line.split_once('=') else {
            bail!(
                "Malformed line {} in arguments file {:?}: expected KEY=VALUE",
                n + 1,
                path
            );
        };
        arguments.insert(key.trim().to_string(), value.to_string());
    }

    Ok(arguments)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn missing_arguments_file_is_empty_mapping() {
        let dir = tempfile::tempdir().unwrap();
        let args = load_arguments(&dir.path().join("arguments.txt")).unwrap();
        assert!(args.is_empty());
    }

    #[test]
    fn arguments_file_is_parsed_line_by_line() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("arguments.txt");
        fs::write(&path, "USERNAME=alice\n\n# comment\nBASE_URL=http://x/login\n").unwrap();

        let args = load_arguments(&path).unwrap();
        assert_eq!(args.len(), 2);
        assert_eq!(args["USERNAME"], "alice");
        assert_eq!(args["BASE_URL"], "http://x/login");
    }

    #[test]
    fn argument_values_are_kept_verbatim() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("arguments.txt");
        fs::write(&path, "PASSWORD=pa$HOME9\nNOTE=a #b\nQUERY=q=1&r=${X}\r\n").unwrap();

        let args = load_arguments(&path).unwrap();
        assert_eq!(args["PASSWORD"], "pa$HOME9");
        assert_eq!(args["NOTE"], "a #b");
        assert_eq!(args["QUERY"], "q=1&r=${X}");
    }

    #[test]
    fn line_without_separator_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("arguments.txt");
        fs::write(&path, "USERNAME=alice\njust text\n").unwrap();

        let err = load_arguments(&path).unwrap_err();
        assert!(err.to_string().contains("line 2"));
    }

    #[test]
    fn suite_and_runnable_parse() {
        let suite: Suite = serde_json::from_str(
            r#"{"execution-mode":"serial","runnables":["r.json"]}"#,
        )
        .unwrap();
        assert_eq!(suite.execution_mode, ExecutionMode::Serial);
        assert_eq!(suite.runnables, vec![PathBuf::from("r.json")]);

        let runnable: Runnable = serde_json::from_str(
            r#"{"platform":"web","executables":[
                {"name":"t1","type":"file","location":"t1.txt"},
                {"name":"t2","type":"jira","location":"PROJ-1"}
            ]}"#,
        )
        .unwrap();
        assert_eq!(runnable.executables[0].kind, ExecutableKind::File);
        assert_eq!(runnable.executables[1].kind, ExecutableKind::Unsupported);
    }

    #[test]
    fn unknown_execution_mode_is_rejected() {
        let res: std::result::Result<Suite, _> =
            serde_json::from_str(r#"{"execution-mode":"sometimes","runnables":[]}"#);
        assert!(res.is_err());
    }

    #[test]
    fn platform_identifiers() {
        assert_eq!("web".parse::<PlatformKind>().unwrap(), PlatformKind::Web);
        assert_eq!("mac".parse::<PlatformKind>().unwrap(), PlatformKind::Mac);
        assert!("windows".parse::<PlatformKind>().is_err());
    }
}
