use crate::run_id::RunId;
use serde::Serialize;
use std::time::SystemTime;

/// Run engine states, in the order a successful run visits them.
#[derive(Debug, Serialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RunState {
    Init,
    SessionOpen,
    Resolving,
    Replaying,
    Closed,
    LockPersisted,
    Aborted,
}

impl std::fmt::Display for RunState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Init => "INIT",
            Self::SessionOpen => "SESSION_OPEN",
            Self::Resolving => "RESOLVING",
            Self::Replaying => "REPLAYING",
            Self::Closed => "CLOSED",
            Self::LockPersisted => "LOCK_PERSISTED",
            Self::Aborted => "ABORTED",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Serialize, Clone)]
pub struct RunEvent {
    pub run_id: RunId,
    pub executable: String,
    pub state: RunState,
    pub timestamp: SystemTime,
}

pub fn state_entered(run_id: &RunId, executable: &str, state: RunState) -> RunEvent {
    RunEvent {
        run_id: run_id.clone(),
        executable: executable.to_string(),
        state,
        timestamp: SystemTime::now(),
    }
}
