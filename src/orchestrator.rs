// src/orchestrator.rs

//! Suite orchestration.
//!
//! A suite is expanded into a flat plan of executables, which is then run
//! either:
//! - serially, in this process, one executable after another
//! - in parallel, one worker process per executable
//!
//! Both strategies produce the same ordered list of results, and a failing
//! executable never stops its siblings.
//!
//! Parallel mode isolates at the process boundary: every worker owns its
//! own driver session, screenshot folder and lock file. The parent waits for
//! every worker before computing results; there is no early cancellation.

use anyhow::{Context, Result};
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::process::{Child, Command as TokioCommand};
use tracing::{error, info};

use crate::actions::ActionExecutor;
use crate::engine::sink::EventSink;
use crate::engine::{run_executable, RunContext, RunOutcome};
use crate::platform::PlatformRegistry;
use crate::suite::{Arguments, ExecutableDescriptor, Runnable, Suite};
use crate::translate::Translator;

/// One entry of the run's result list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutionResult {
    pub runnable: PathBuf,
    pub executable: String,

    /// 0 success, 1 failure.
    pub exit_code: i32,
}

impl ExecutionResult {
    pub fn ok(&self) -> bool {
        self.exit_code == 0
    }
}

/// An executable together with the runnable that declared it.
#[derive(Debug, Clone)]
pub struct PlannedExecutable {
    pub runnable: PathBuf,

    /// Position inside the runnable's `executables` list.
    pub index: usize,

    pub platform: String,
    pub executable: ExecutableDescriptor,
}

impl PlannedExecutable {
    fn result(&self, exit_code: i32) -> ExecutionResult {
        ExecutionResult {
            runnable: self.runnable.clone(),
            executable: self.executable.name.clone(),
            exit_code,
        }
    }
}

/// Load every runnable of the suite, in order.
///
/// An unreadable runnable fails the whole plan before anything runs.
pub fn plan(suite: &Suite) -> Result<Vec<PlannedExecutable>> {
    let mut planned = Vec::new();

    for runnable_path in &suite.runnables {
        let runnable = Runnable::load(runnable_path)?;

        for (index, executable) in runnable.executables.into_iter().enumerate() {
            planned.push(PlannedExecutable {
                runnable: runnable_path.clone(),
                index,
                platform: runnable.platform.clone(),
                executable,
            });
        }
    }

    Ok(planned)
}

/// Load a single planned executable (used by worker processes).
pub fn plan_one(runnable_path: &Path, index: usize) -> Result<PlannedExecutable> {
    let runnable = Runnable::load(runnable_path)?;
    let executable = runnable
        .executables
        .get(index)
        .cloned()
        .with_context(|| {
            format!(
                "Runnable {:?} has no executable #{} ({} defined)",
                runnable_path,
                index,
                runnable.executables.len()
            )
        })?;

    Ok(PlannedExecutable {
        runnable: runnable_path.to_path_buf(),
        index,
        platform: runnable.platform,
        executable,
    })
}

/// Runs planned executables in-process.
pub struct Orchestrator<'a> {
    pub platforms: &'a PlatformRegistry,
    pub translator: &'a dyn Translator,
    pub executor: &'a ActionExecutor<'a>,
    pub arguments: &'a Arguments,
    pub recordings_dir: &'a Path,
}

impl Orchestrator<'_> {
    /// Run one executable on the platform its runnable names.
    pub async fn run_one(
        &self,
        planned: &PlannedExecutable,
        sink: &mut dyn EventSink,
    ) -> Result<RunOutcome> {
        let platform = self.platforms.select(&planned.platform)?;

        let ctx = RunContext {
            platform: platform.as_ref(),
            translator: self.translator,
            executor: self.executor,
            arguments: self.arguments,
            recordings_dir: self.recordings_dir,
        };

        run_executable(&ctx, &planned.executable, sink).await
    }

    /// Run one executable and convert the outcome into an exit code.
    pub async fn run_to_exit_code(
        &self,
        planned: &PlannedExecutable,
        sink: &mut dyn EventSink,
    ) -> i32 {
        match self.run_one(planned, sink).await {
            Ok(outcome) => {
                info!(
                    run_id = %outcome.run_id,
                    executable = %outcome.executable,
                    replayed = outcome.replayed,
                    "executable passed"
                );
                0
            }
            Err(e) => {
                error!(
                    executable = %planned.executable.name,
                    runnable = %planned.runnable.display(),
                    error = %format!("{:#}", e),
                    "executable failed"
                );
                1
            }
        }
    }

    /// Worker entry: run executable `index` of `runnable` and map it to an exit code.
    pub async fn run_worker(
        &self,
        runnable: &Path,
        index: usize,
        sink: &mut dyn EventSink,
    ) -> Result<i32> {
        let planned = plan_one(runnable, index)?;
        Ok(self.run_to_exit_code(&planned, sink).await)
    }

    pub async fn run_serial(
        &self,
        plan: &[PlannedExecutable],
        sink: &mut dyn EventSink,
    ) -> Vec<ExecutionResult> {
        let mut results = Vec::with_capacity(plan.len());

        for planned in plan {
            let code = self.run_to_exit_code(planned, sink).await;
            results.push(planned.result(code));
        }

        results
    }
}

/// Spawns `uiautomate worker ...` children for parallel mode.
#[derive(Debug, Clone)]
pub struct WorkerLauncher {
    pub program: PathBuf,

    /// Arguments placed before `--runnable <path> --index <n>`.
    pub args: Vec<OsString>,
}

impl WorkerLauncher {
    /// Re-invoke the current binary as a worker with the same settings.
    pub fn current_exe(settings: &Path, arguments: &Path, recordings: &Path) -> Result<Self> {
        let program = std::env::current_exe().context("Unable to locate current executable")?;

        Ok(Self {
            program,
            args: vec![
                "worker".into(),
                "--settings".into(),
                settings.into(),
                "--arguments".into(),
                arguments.into(),
                "--recordings".into(),
                recordings.into(),
            ],
        })
    }

    fn spawn(&self, planned: &PlannedExecutable) -> Result<Child> {
        TokioCommand::new(&self.program)
            .args(&self.args)
            .arg("--runnable")
            .arg(&planned.runnable)
            .arg("--index")
            .arg(planned.index.to_string())
            .stdin(Stdio::null())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit())
            .spawn()
            .with_context(|| format!("Failed to spawn worker for {}", planned.executable.name))
    }
}

/// Launch every executable as its own process, then wait for all of them.
pub async fn run_parallel(
    plan: &[PlannedExecutable],
    launcher: &WorkerLauncher,
) -> Vec<ExecutionResult> {
    let mut jobs: Vec<(&PlannedExecutable, Option<Child>)> = Vec::with_capacity(plan.len());

    for planned in plan {
        info!(executable = %planned.executable.name, "Running Executable");

        match launcher.spawn(planned) {
            Ok(child) => jobs.push((planned, Some(child))),
            Err(e) => {
                error!(executable = %planned.executable.name, error = %format!("{:#}", e), "spawn failed");
                jobs.push((planned, None));
            }
        }
    }

    let mut results = Vec::with_capacity(jobs.len());

    for (planned, child) in jobs {
        let code = match child {
            Some(mut child) => match child.wait().await {
                Ok(status) if status.success() => 0,
                Ok(status) => {
                    error!(executable = %planned.executable.name, status = %status, "worker failed");
                    1
                }
                Err(e) => {
                    error!(executable = %planned.executable.name, error = %e, "failed to wait for worker");
                    1
                }
            },
            None => 1,
        };
        results.push(planned.result(code));
    }

    results
}

/// 0 when every executable succeeded, 1 otherwise.
pub fn overall_exit_code(results: &[ExecutionResult]) -> i32 {
    if results.iter().all(ExecutionResult::ok) {
        0
    } else {
        1
    }
}
