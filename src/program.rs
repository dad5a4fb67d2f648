// src/program.rs

//! Translated programs and their commands.
//!
//! A program is what the translator emits:
//!
//! {
//!   "open": "https://example.com/login",
//!   "commands": [ { "action": "click", "target": "Login" }, ... ]
//! }
//!
//! Commands are opaque JSON objects. Once executed, each one gains a
//! `mode` (the element resolution strategy that was used), which turns the
//! program into a locked program.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use sha2::{Digest, Sha256};
use std::path::Path;
use std::sync::OnceLock;

use crate::suite::Arguments;
use crate::util::read_to_string;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Program {
    /// Application target: a URL for web, a bundle id for mac.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub open: Option<String>,

    #[serde(default)]
    pub commands: Vec<Command>,

    /// Hash of the unlocked program this lock was produced from.
    ///
    /// Only present on lock artifacts.
    #[serde(
        rename = "source-hash",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub source_hash: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Command {
    #[serde(flatten)]
    pub fields: Map<String, Value>,

    /// Resolution mode, written once per command per run.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mode: Option<String>,
}

impl Program {
    /// Load and parse a program (or lock artifact) from disk.
    pub fn load(path: &Path) -> Result<Self> {
        let raw = read_to_string(path)?;
        serde_json::from_str(&raw)
            .with_context(|| format!("Program file is not valid JSON: {:?}", path))
    }

    /// SHA-256 over `open` + commands with every `mode` stripped.
    ///
    /// Two programs hash equal iff a lock made from one is valid for the other.
    pub fn source_hash(&self) -> Result<String> {
        let commands: Vec<&Map<String, Value>> =
            self.commands.iter().map(|c| &c.fields).collect();
        let canonical = serde_json::json!({
            "open": self.open,
            "commands": commands,
        });
        let bytes = serde_json::to_vec(&canonical).context("Failed to serialise program")?;

        let mut hasher = Sha256::new();
        hasher.update(&bytes);
        Ok(hex::encode(hasher.finalize()))
    }

    /// Copy of this program with all modes cleared.
    pub fn unlocked(&self) -> Self {
        Self {
            open: self.open.clone(),
            commands: self
                .commands
                .iter()
                .map(|c| Command {
                    fields: c.fields.clone(),
                    mode: None,
                })
                .collect(),
            source_hash: None,
        }
    }
}

impl Command {
    pub fn action(&self) -> Option<&str> {
        self.str_param("action")
    }

    pub fn target(&self) -> Option<&str> {
        self.str_param("target")
    }

    pub fn str_param(&self, key: &str) -> Option<&str> {
        self.fields.get(key).and_then(Value::as_str)
    }

    /// Numeric parameter; numeric strings are accepted too.
    pub fn f64_param(&self, key: &str) -> Option<f64> {
        match self.fields.get(key)? {
            Value::Number(n) => n.as_f64(),
            Value::String(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    pub fn bool_param(&self, key: &str) -> bool {
        self.fields
            .get(key)
            .and_then(Value::as_bool)
            .unwrap_or(false)
    }

    /// Recorded resolution mode, if any and non-empty.
    pub fn recorded_mode(&self) -> Option<&str> {
        self.mode.as_deref().filter(|m| !m.is_empty())
    }

    /// Copy with `${KEY}` placeholders in string fields replaced from `arguments`.
    pub fn expanded(&self, arguments: &Arguments) -> Self {
        let fields = self
            .fields
            .iter()
            .map(|(k, v)| (k.clone(), expand_value(v, arguments)))
            .collect();

        Self {
            fields,
            mode: self.mode.clone(),
        }
    }
}

impl std::fmt::Display for Command {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let raw = serde_json::to_string(&self.fields).map_err(|_| std::fmt::Error)?;
        f.write_str(&raw)
    }
}

/// Replace `${KEY}` placeholders with argument values.
///
/// Unknown keys are left untouched so a typo shows up verbatim in the UI.
pub fn expand_placeholders(text: &str, arguments: &Arguments) -> String {
    placeholder_regex()
        .replace_all(text, |caps: &regex::Captures<'_>| {
            arguments
                .get(&caps[1])
                .cloned()
                .unwrap_or_else(|| caps[0].to_string())
        })
        .into_owned()
}

fn expand_value(value: &Value, arguments: &Arguments) -> Value {
    match value {
        Value::String(s) => Value::String(expand_placeholders(s, arguments)),
        Value::Array(items) => {
            Value::Array(items.iter().map(|v| expand_value(v, arguments)).collect())
        }
        Value::Object(map) => Value::Object(
            map.iter()
                .map(|(k, v)| (k.clone(), expand_value(v, arguments)))
                .collect(),
        ),
        other => other.clone(),
    }
}

fn placeholder_regex() -> &'static regex::Regex {
    static RE: OnceLock<regex::Regex> = OnceLock::new();
    RE.get_or_init(|| {
        regex::Regex::new(r"\$\{([A-Za-z_][A-Za-z0-9_]*)\}").expect("placeholder pattern is valid")
    })
}
