use std::fmt;
use std::str::FromStr;

use serde::Serialize;

/// Lifecycle state of the managed server process.
///
/// There is no separate `Starting` state: the game server gives no readiness
/// signal, so a freshly launched process is `Running` straight away.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ServerState {
    /// No process handle.
    #[default]
    Stopped,
    /// Handle exists and accepts commands.
    Running,
    /// Graceful shutdown requested; waiting for the OS to report exit.
    Stopping,
}

impl ServerState {
    /// True while a process handle exists (`Running` or `Stopping`).
    pub fn is_running(self) -> bool {
        !matches!(self, ServerState::Stopped)
    }
}

impl fmt::Display for ServerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ServerState::Stopped => "stopped",
            ServerState::Running => "running",
            ServerState::Stopping => "stopping",
        };
        f.write_str(s)
    }
}

/// Action accepted by `POST /control`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlAction {
    Start,
    Stop,
    Restart,
}

impl FromStr for ControlAction {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "start" => Ok(ControlAction::Start),
            "stop" => Ok(ControlAction::Stop),
            "restart" => Ok(ControlAction::Restart),
            other => Err(format!(
                "invalid action: {other} (expected \"start\", \"stop\" or \"restart\")"
            )),
        }
    }
}

/// Result of a `start` request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StartOutcome {
    /// A new process was launched.
    Started { pid: Option<u32> },
    /// A handle already exists; nothing was spawned.
    AlreadyActive(ServerState),
}

/// Result of a `stop`/`restart` request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopOutcome {
    /// Nothing was running; the continuation (if any) ran immediately.
    AlreadyStopped,
    /// The shutdown command was written; exit is pending.
    Stopping,
    /// A shutdown was already in progress; no second write was issued.
    AlreadyStopping,
}
