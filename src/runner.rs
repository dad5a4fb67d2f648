// src/runner.rs

use crate::actions::ActionExecutor;
use crate::cli::{Cli, Command};
use crate::config::Settings;
use crate::engine::sink::TracingEventSink;
use crate::orchestrator::{
    overall_exit_code, plan, run_parallel, ExecutionResult, Orchestrator, WorkerLauncher,
};
use crate::platform::PlatformRegistry;
use crate::report::{publish_all, reporters};
use crate::suite::{load_arguments, Arguments, ExecutionMode, Suite};
use crate::translate::{self, Translator};
use crate::util::ensure_dir;
use crate::validate::validate_suite;

use anyhow::Result;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::info;

/// Entry point from `main.rs`. Returns the process exit code.
pub async fn run(cli: Cli) -> Result<i32> {
    match cli.command {
        Command::Init => {
            init_scaffold(Path::new("."))?;
            Ok(0)
        }

        Command::Validate { settings, suite } => {
            let s = Settings::load(&settings)?.with_overrides(suite, None, None);
            let result = validate_suite(&s.suite);
            println!("{}", serde_json::to_string_pretty(&result)?);
            Ok(if result.is_valid() { 0 } else { 1 })
        }

        Command::Worker {
            settings,
            arguments,
            recordings,
            runnable,
            index,
        } => {
            let s = Settings::load(&settings)?.with_overrides(None, arguments, recordings);
            run_worker(&s, &runnable, index).await
        }

        Command::Run {
            settings,
            suite,
            arguments,
            recordings,
            mode,
        } => {
            let s = Settings::load(&settings)?.with_overrides(suite, arguments, recordings);
            run_suite(&settings, &s, mode).await
        }
    }
}

/* ---------------- shared runtime ---------------- */

/// Everything an in-process run borrows from.
struct Runtime {
    platforms: PlatformRegistry,
    translator: Box<dyn Translator>,
    executor: ActionExecutor<'static>,
    arguments: Arguments,
    recordings_dir: PathBuf,
}

impl Runtime {
    fn from_settings(settings: &Settings) -> Result<Self> {
        Ok(Self {
            platforms: PlatformRegistry::from_settings(&settings.platforms),
            translator: translate::from_config(&settings.translator),
            executor: ActionExecutor::standard(Duration::from_millis(settings.step_delay_ms)),
            arguments: load_arguments(&settings.arguments)?,
            recordings_dir: settings.recordings_dir.clone(),
        })
    }

    fn orchestrator(&self) -> Orchestrator<'_> {
        Orchestrator {
            platforms: &self.platforms,
            translator: self.translator.as_ref(),
            executor: &self.executor,
            arguments: &self.arguments,
            recordings_dir: &self.recordings_dir,
        }
    }
}

/* ---------------- run ---------------- */

async fn run_suite(
    settings_path: &Path,
    settings: &Settings,
    mode_override: Option<ExecutionMode>,
) -> Result<i32> {
    let suite = Suite::load(&settings.suite)?;
    let mode = mode_override.unwrap_or(suite.execution_mode);

    // Every runnable is read before the first executable starts.
    let plan = plan(&suite)?;

    info!(
        suite = %settings.suite.display(),
        mode = ?mode,
        executables = plan.len(),
        "starting run"
    );

    let results = match mode {
        ExecutionMode::Serial => {
            let runtime = Runtime::from_settings(settings)?;
            runtime
                .orchestrator()
                .run_serial(&plan, &mut TracingEventSink)
                .await
        }
        ExecutionMode::Parallel => {
            let launcher = WorkerLauncher::current_exe(
                settings_path,
                &settings.arguments,
                &settings.recordings_dir,
            )?;
            run_parallel(&plan, &launcher).await
        }
    };

    publish_all(&reporters(settings.report.webhook_url.as_deref()), &results).await;

    for line in status_lines(&results) {
        println!("{}", line);
    }

    Ok(overall_exit_code(&results))
}

async fn run_worker(settings: &Settings, runnable: &Path, index: usize) -> Result<i32> {
    let runtime = Runtime::from_settings(settings)?;

    runtime
        .orchestrator()
        .run_worker(runnable, index, &mut TracingEventSink)
        .await
}

/// `Error in : <name>` per failure, then the overall verdict.
fn status_lines(results: &[ExecutionResult]) -> Vec<String> {
    let mut lines: Vec<String> = results
        .iter()
        .filter(|r| !r.ok())
        .map(|r| format!("Error in : {}", r.executable))
        .collect();

    lines.push(if overall_exit_code(results) == 0 {
        "Success!".to_string()
    } else {
        "Exiting with error!".to_string()
    });

    lines
}

/* ---------------- init ---------------- */

fn init_scaffold(root: &Path) -> Result<()> {
    ensure_dir(&root.join("runnables"))?;
    ensure_dir(&root.join("tests"))?;

    let files: [(&str, &str); 5] = [
        ("automate.yaml", default_settings_yaml()),
        ("run.json", default_suite_json()),
        ("runnables/smoke.json", default_runnable_json()),
        ("tests/smoke.json", default_program_json()),
        ("arguments.txt", default_arguments_txt()),
    ];

    for (rel, contents) in files {
        let path = root.join(rel);
        if path.exists() {
            eprintln!("{} already exists (skipping)", rel);
            continue;
        }
        std::fs::write(&path, contents.trim_start())?;
        eprintln!("Created {}", rel);
    }

    Ok(())
}

fn default_settings_yaml() -> &'static str {
    r#"
suite: run.json
arguments: arguments.txt
recordings_dir: recordings

# Pause before each element lookup
step_delay_ms: 1000

# English script -> JSON program. Leave empty to use JSON programs directly.
translator:
  command: []

platforms:
  web:
    endpoint: http://localhost:9515
  mac:
    endpoint: http://localhost:4723

# Slack-compatible webhook for the final summary
# report:
#   webhook_url: https://hooks.slack.com/services/...
"#
}

fn default_suite_json() -> &'static str {
    r#"
{
  "execution-mode": "serial",
  "runnables": ["runnables/smoke.json"]
}
"#
}

fn default_runnable_json() -> &'static str {
    r#"
{
  "platform": "web",
  "executables": [
    { "name": "smoke", "type": "file", "location": "tests/smoke.json" }
  ]
}
"#
}

fn default_program_json() -> &'static str {
    r#"
{
  "open": "${BASE_URL}",
  "commands": [
    { "action": "assert-title", "value": "Example Domain" },
    { "action": "click", "target": "More information..." }
  ]
}
"#
}

fn default_arguments_txt() -> &'static str {
    r#"
# KEY=VALUE, available as ${KEY} in programs
BASE_URL=https://example.com
"#
}
