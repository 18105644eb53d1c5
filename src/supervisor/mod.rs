// src/supervisor/mod.rs

//! Managed server process supervision.
//!
//! - [`launcher`] provides the `ProcessLauncher` trait and the real
//!   `TokioLauncher`; tests can swap in a fake.
//! - [`actor`] owns the single process handle and the lifecycle state
//!   machine (`Stopped -> Running -> Stopping -> Stopped`).
//! - [`handle`] is the cloneable `SupervisorHandle` everyone else talks to.
//! - [`output`] pumps stdout/stderr into the console buffer.

mod actor;
pub mod handle;
pub mod launcher;
mod output;

use std::sync::Arc;
use std::time::Duration;

use crate::console::ConsoleBuffer;

pub use handle::SupervisorHandle;
pub use launcher::{
    ExitFuture, LaunchSpec, LaunchedProcess, ProcessLauncher, ProcessOutput, ProcessStdin,
    TokioLauncher,
};

/// Tunables for the supervisor owner task.
#[derive(Debug, Clone)]
pub struct SupervisorSettings {
    /// Line written to stdin to request an orderly shutdown.
    pub stop_command: String,
    /// Upper bound on a single stdin write.
    pub write_timeout: Duration,
    /// How long to wait for output readers to drain after exit.
    pub drain_grace: Duration,
}

impl Default for SupervisorSettings {
    fn default() -> Self {
        Self {
            stop_command: "stop".to_string(),
            write_timeout: Duration::from_secs(5),
            drain_grace: Duration::from_secs(1),
        }
    }
}

/// Spawn the supervisor owner task and return a handle to it.
///
/// Must be called from within a Tokio runtime. The task lives until every
/// handle is dropped.
pub fn spawn_supervisor(
    launcher: Arc<dyn ProcessLauncher>,
    spec: LaunchSpec,
    console: ConsoleBuffer,
    settings: SupervisorSettings,
) -> SupervisorHandle {
    let (tx, state_rx) = actor::Supervisor::spawn(launcher, spec, console, settings);
    SupervisorHandle::new(tx, state_rx)
}
