// src/config.rs

use anyhow::{Context, Result};
use serde::Deserialize;
use serde_json::Value;
use std::{collections::BTreeMap, fs, path::Path, path::PathBuf};

/// Root runner settings loaded from `automate.yaml`.
///
/// This file controls:
/// - Which suite and arguments files are used
/// - Where per-step screenshots are written
/// - How English scripts are translated into JSON programs
/// - Which WebDriver endpoint backs each platform
/// - Where the final report is published
///
/// Every field has a default, so the file itself is optional.
#[derive(Debug, Deserialize, Clone)]
pub struct Settings {
    /// Suite definition (execution mode + runnables)
    #[serde(default = "default_suite")]
    pub suite: PathBuf,

    /// Line-oriented KEY=VALUE arguments file
    #[serde(default = "default_arguments")]
    pub arguments: PathBuf,

    /// Root folder for screenshots (one sub-folder per executable)
    #[serde(default = "default_recordings_dir")]
    pub recordings_dir: PathBuf,

    /// Pause before locating each element, in milliseconds.
    ///
    /// Some UI elements take a moment to refresh after the previous step.
    #[serde(default = "default_step_delay_ms")]
    pub step_delay_ms: u64,

    #[serde(default)]
    pub translator: TranslatorConfig,

    #[serde(default)]
    pub platforms: Platforms,

    #[serde(default)]
    pub report: ReportConfig,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            suite: default_suite(),
            arguments: default_arguments(),
            recordings_dir: default_recordings_dir(),
            step_delay_ms: default_step_delay_ms(),
            translator: TranslatorConfig::default(),
            platforms: Platforms::default(),
            report: ReportConfig::default(),
        }
    }
}

/// External English-to-JSON translator.
///
/// Example in automate.yaml:
///
/// translator:
///   command: ["python3", "tools/parse_english.py"]
///
/// The runner appends `<input> <output>` to this argv.
#[derive(Debug, Deserialize, Clone, Default)]
pub struct TranslatorConfig {
    #[serde(default)]
    pub command: Vec<String>,
}

/// WebDriver endpoints per platform.
///
/// Example:
///
/// platforms:
///   web:
///     endpoint: http://localhost:9515
///   mac:
///     endpoint: http://localhost:4723
#[derive(Debug, Deserialize, Clone)]
pub struct Platforms {
    #[serde(default = "default_web")]
    pub web: PlatformEndpoint,

    #[serde(default = "default_mac")]
    pub mac: PlatformEndpoint,
}

impl Default for Platforms {
    fn default() -> Self {
        Self {
            web: default_web(),
            mac: default_mac(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct PlatformEndpoint {
    pub endpoint: String,

    /// Extra `alwaysMatch` capabilities merged over the platform defaults.
    #[serde(default)]
    pub capabilities: BTreeMap<String, Value>,
}

/// Report publishing.
#[derive(Debug, Deserialize, Clone, Default)]
pub struct ReportConfig {
    /// Slack-compatible incoming webhook. Console output is always produced.
    #[serde(default)]
    pub webhook_url: Option<String>,
}

fn default_suite() -> PathBuf {
    PathBuf::from("run.json")
}

fn default_arguments() -> PathBuf {
    PathBuf::from("arguments.txt")
}

fn default_recordings_dir() -> PathBuf {
    PathBuf::from("recordings")
}

fn default_step_delay_ms() -> u64 {
    1000
}

fn default_web() -> PlatformEndpoint {
    PlatformEndpoint {
        endpoint: "http://localhost:9515".to_string(),
        capabilities: BTreeMap::new(),
    }
}

fn default_mac() -> PlatformEndpoint {
    PlatformEndpoint {
        endpoint: "http://localhost:4723".to_string(),
        capabilities: BTreeMap::new(),
    }
}

impl Settings {
    /// Load and parse `automate.yaml` from disk.
    ///
    /// A missing file is not an error: defaults are used instead.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            tracing::debug!(path = %path.display(), "settings file not found, using defaults");
            return Ok(Self::default());
        }

        let raw = fs::read_to_string(path)
            .with_context(|| format!("Failed to read settings file: {:?}", path))?;

        let settings: Settings =
            serde_yaml::from_str(&raw).context("Failed to parse YAML settings")?;

        Ok(settings)
    }

    /// Apply CLI overrides on top of the loaded file.
    pub fn with_overrides(
        mut self,
        suite: Option<PathBuf>,
        arguments: Option<PathBuf>,
        recordings: Option<PathBuf>,
    ) -> Self {
        if let Some(p) = suite {
            self.suite = p;
        }
        if let Some(p) = arguments {
            self.arguments = p;
        }
        if let Some(p) = recordings {
            self.recordings_dir = p;
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_settings_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let s = Settings::load(&dir.path().join("automate.yaml")).unwrap();

        assert_eq!(s.suite, PathBuf::from("run.json"));
        assert_eq!(s.step_delay_ms, 1000);
        assert!(s.translator.command.is_empty());
        assert_eq!(s.platforms.web.endpoint, "http://localhost:9515");
    }

    #[test]
    fn partial_yaml_keeps_remaining_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("automate.yaml");
        fs::write(
            &path,
            r#"
step_delay_ms: 0
translator:
  command: ["python3", "parse.py"]
platforms:
  mac:
    endpoint: http://mac-runner:4723
    capabilities:
      appium:automationName: Mac2
report:
  webhook_url: https://hooks.example.com/x
"#,
        )
        .unwrap();

        let s = Settings::load(&path).unwrap();
        assert_eq!(s.step_delay_ms, 0);
        assert_eq!(s.translator.command, vec!["python3", "parse.py"]);
        assert_eq!(s.platforms.mac.endpoint, "http://mac-runner:4723");
        assert_eq!(s.platforms.web.endpoint, "http://localhost:9515");
        assert_eq!(
            s.platforms.mac.capabilities.get("appium:automationName"),
            Some(&Value::String("Mac2".into()))
        );
        assert_eq!(s.recordings_dir, PathBuf::from("recordings"));
        assert!(s.report.webhook_url.is_some());
    }

    #[test]
    fn cli_overrides_win() {
        let s = Settings::default().with_overrides(
            Some(PathBuf::from("nightly.json")),
            None,
            Some(PathBuf::from("out")),
        );
        assert_eq!(s.suite, PathBuf::from("nightly.json"));
        assert_eq!(s.arguments, PathBuf::from("arguments.txt"));
        assert_eq!(s.recordings_dir, PathBuf::from("out"));
    }
}
