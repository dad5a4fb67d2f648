// src/lock.rs

//! Execution locks.
//!
//! A lock artifact is a translated program in which every command carries the
//! resolution `mode` that was used for it. It lives next to the translated
//! program:
//!
//! tests/login.json       (translator output)
//! tests/login.json.lock  (locked program)
//!
//! On later runs the lock is replayed instead of re-resolving each element,
//! so runs stay deterministic even if locator heuristics would drift.
//!
//! Locks are a cache, never a source of truth:
//! - an unreadable, malformed or stale lock is treated as absent
//! - a lock is written once, atomically, after every command succeeded
//! - a lock is never re-written from a lock

use anyhow::{Context, Result};
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tracing::{debug, warn};

use crate::program::Program;
use crate::util::with_suffix;

pub const LOCK_SUFFIX: &str = ".lock";

/// Lock artifact path for a translated program.
pub fn lock_path(program_path: &Path) -> PathBuf {
    with_suffix(program_path, LOCK_SUFFIX)
}

pub fn is_lock_path(path: &Path) -> bool {
    path.to_string_lossy().ends_with(LOCK_SUFFIX)
}

/// The program a run should execute, and where it came from.
#[derive(Debug, Clone)]
pub struct ResolvedInput {
    pub path: PathBuf,
    pub program: Program,
}

impl ResolvedInput {
    /// True when the program was read from a lock artifact (replay).
    pub fn is_locked(&self) -> bool {
        is_lock_path(&self.path)
    }
}

/// Why a lock on disk was not used.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LockRejection {
    Unreadable(String),
    CommandCountMismatch { lock: usize, program: usize },
    MissingMode { index: usize },
    SourceChanged,
}

impl std::fmt::Display for LockRejection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Unreadable(e) => write!(f, "unreadable lock: {}", e),
            Self::CommandCountMismatch { lock, program } => write!(
                f,
                "lock has {} commands, program has {}",
                lock, program
            ),
            Self::MissingMode { index } => write!(f, "command {} has no mode", index),
            Self::SourceChanged => f.write_str("program changed since the lock was written"),
        }
    }
}

/// Pick the lock for `program_path` if one exists and still matches `fresh`,
/// otherwise the freshly translated program.
pub fn resolve_input(program_path: &Path, fresh: Program) -> Result<ResolvedInput> {
    let lock = lock_path(program_path);

    if !lock.is_file() {
        debug!(path = %program_path.display(), "no lock artifact");
        return Ok(ResolvedInput {
            path: program_path.to_path_buf(),
            program: fresh,
        });
    }

    match load_lock(&lock, &fresh)? {
        Ok(locked) => {
            debug!(lock = %lock.display(), "replaying lock artifact");
            Ok(ResolvedInput {
                path: lock,
                program: locked,
            })
        }
        Err(rejection) => {
            warn!(
                lock = %lock.display(),
                reason = %rejection,
                "ignoring lock artifact, resolving from scratch"
            );
            Ok(ResolvedInput {
                path: program_path.to_path_buf(),
                program: fresh,
            })
        }
    }
}

/// Read a lock and check it against the freshly translated program.
///
/// The outer `Result` is for hashing failures only; every problem with the
/// lock file itself is reported as a [`LockRejection`].
pub fn load_lock(
    lock: &Path,
    fresh: &Program,
) -> Result<std::result::Result<Program, LockRejection>> {
    let locked = match Program::load(lock) {
        Ok(p) => p,
        Err(e) => return Ok(Err(LockRejection::Unreadable(format!("{:#}", e)))),
    };

    if locked.commands.len() != fresh.commands.len() {
        return Ok(Err(LockRejection::CommandCountMismatch {
            lock: locked.commands.len(),
            program: fresh.commands.len(),
        }));
    }

    if let Some(index) = locked.commands.iter().position(|c| c.mode.is_none()) {
        return Ok(Err(LockRejection::MissingMode { index }));
    }

    let unchanged = match &locked.source_hash {
        Some(hash) => *hash == fresh.source_hash()?,
        // Hand-written or legacy lock: compare structurally.
        None => locked.unlocked() == fresh.unlocked(),
    };

    if !unchanged {
        return Ok(Err(LockRejection::SourceChanged));
    }

    Ok(Ok(locked))
}

/// Write the locked program next to the input, unless the input already was a lock.
///
/// Returns the path written, if any.
pub fn persist(input: &ResolvedInput, locked: &Program) -> Result<Option<PathBuf>> {
    if input.is_locked() {
        return Ok(None);
    }

    let target = lock_path(&input.path);

    let mut artifact = locked.clone();
    artifact.source_hash = Some(locked.source_hash()?);

    write_atomic(&target, &artifact)?;
    Ok(Some(target))
}

fn write_atomic(target: &Path, program: &Program) -> Result<()> {
    let dir = match target.parent() {
        Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
        _ => PathBuf::from("."),
    };

    let bytes = serde_json::to_vec_pretty(program).context("Failed to serialise lock artifact")?;

    let mut tmp = NamedTempFile::new_in(&dir)
        .with_context(|| format!("Failed to create temp file in {:?}", dir))?;
    tmp.write_all(&bytes)
        .context("Failed to write lock artifact")?;
    tmp.persist(target)
        .with_context(|| format!("Failed to write lock artifact {:?}", target))?;

    Ok(())
}
