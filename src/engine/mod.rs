//! Run engine: drives one executable end-to-end.
//!
//! INIT → SESSION_OPEN → (RESOLVING | REPLAYING) → CLOSED → LOCK_PERSISTED
//!
//! Any error moves the run to ABORTED. The session is closed whether or not
//! the commands succeeded, and a lock is only written after every command
//! succeeded.

use anyhow::{bail, Result};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

pub mod events;
pub mod sink;

use crate::actions::ActionExecutor;
use crate::lock::{self, ResolvedInput};
use crate::platform::{DriverSession, PlatformDriver};
use crate::program::{Command, Program};
use crate::recording::{recording_init, write_screenshot};
use crate::run_id::RunId;
use crate::suite::{Arguments, ExecutableDescriptor, ExecutableKind};
use crate::translate::{translated_path, Translator};
use events::{state_entered, RunState};
use sink::EventSink;

/// Everything a run needs besides the executable itself.
///
/// Shared read-only between executables; nothing here is mutated by a run.
pub struct RunContext<'a> {
    pub platform: &'a dyn PlatformDriver,
    pub translator: &'a dyn Translator,
    pub executor: &'a ActionExecutor<'a>,
    pub arguments: &'a Arguments,
    pub recordings_dir: &'a Path,
}

#[derive(Debug, Clone)]
pub struct RunOutcome {
    pub run_id: RunId,
    pub executable: String,

    /// True when the program came from a lock artifact.
    pub replayed: bool,

    /// Program with every command's mode filled in.
    pub locked: Program,

    pub lock_written: Option<PathBuf>,
}

struct StateTracker<'s> {
    run_id: RunId,
    executable: String,
    sink: &'s mut dyn EventSink,
}

impl StateTracker<'_> {
    fn enter(&mut self, state: RunState) {
        self.sink
            .emit(state_entered(&self.run_id, &self.executable, state));
    }
}

/// Run one executable. Errors abort the executable, never its siblings.
pub async fn run_executable(
    ctx: &RunContext<'_>,
    executable: &ExecutableDescriptor,
    sink: &mut dyn EventSink,
) -> Result<RunOutcome> {
    let mut tracker = StateTracker {
        run_id: RunId::new(),
        executable: executable.name.clone(),
        sink,
    };

    info!(
        run_id = %tracker.run_id,
        executable = %executable.name,
        platform = %ctx.platform.kind(),
        "running executable"
    );

    let result = drive(ctx, executable, &mut tracker).await;

    if result.is_err() {
        tracker.enter(RunState::Aborted);
    }

    result
}

async fn drive(
    ctx: &RunContext<'_>,
    executable: &ExecutableDescriptor,
    tracker: &mut StateTracker<'_>,
) -> Result<RunOutcome> {
    tracker.enter(RunState::Init);

    let input = load_input(ctx, executable).await?;

    if input.program.open.is_none() {
        bail!("Program Error! Open not specified! ({})", executable.name);
    }

    let mut session = ctx.platform.init_driver().await?;
    tracker.enter(RunState::SessionOpen);

    let body = execute_commands(ctx, executable, session.as_mut(), &input, tracker).await;

    if let Err(e) = session.close().await {
        warn!(executable = %executable.name, error = %e, "failed to close session");
    }
    tracker.enter(RunState::Closed);

    let locked = body?;

    let lock_written = lock::persist(&input, &locked)?;
    if let Some(path) = &lock_written {
        info!(executable = %executable.name, lock = %path.display(), "lock written");
        tracker.enter(RunState::LockPersisted);
    }

    Ok(RunOutcome {
        run_id: tracker.run_id.clone(),
        executable: executable.name.clone(),
        replayed: input.is_locked(),
        locked,
        lock_written,
    })
}

/// Translate the script and pick lock or fresh program.
async fn load_input(ctx: &RunContext<'_>, executable: &ExecutableDescriptor) -> Result<ResolvedInput> {
    let script = match executable.kind {
        ExecutableKind::File => &executable.location,
        ExecutableKind::Unsupported => {
            bail!("Unsupported executable type for {}", executable.name)
        }
    };

    let program_path = translated_path(script);
    ctx.translator.translate(script, &program_path).await?;

    let fresh = Program::load(&program_path)?;
    lock::resolve_input(&program_path, fresh)
}

async fn execute_commands(
    ctx: &RunContext<'_>,
    executable: &ExecutableDescriptor,
    session: &mut dyn DriverSession,
    input: &ResolvedInput,
    tracker: &mut StateTracker<'_>,
) -> Result<Program> {
    ctx.platform
        .init_app(session, &input.program, ctx.arguments)
        .await?;

    let folder = recording_init(ctx.recordings_dir, &executable.name)?;

    tracker.enter(if input.is_locked() {
        RunState::Replaying
    } else {
        RunState::Resolving
    });

    let mut locked = input.program.clone();

    for (step, command) in input.program.commands.iter().enumerate() {
        info!(executable = %executable.name, step, command = %command, "Executing Command");

        let png = session.screenshot().await?;
        write_screenshot(&folder, step, &png)?;

        let mode = execute_one(ctx, session, command).await?;

        if let Some(previous) = command.recorded_mode() {
            if previous != mode {
                warn!(step, previous, mode = %mode, "replay resolved a different mode");
            }
        }
        locked.commands[step].mode = Some(mode);
    }

    Ok(locked)
}

async fn execute_one(
    ctx: &RunContext<'_>,
    session: &mut dyn DriverSession,
    command: &Command,
) -> Result<String> {
    let expanded = command.expanded(ctx.arguments);
    ctx.executor
        .execute_command(ctx.platform, session, &expanded)
        .await
}
