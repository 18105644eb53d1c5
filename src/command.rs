// src/command.rs

//! Operator command gateway.

use tracing::debug;

use crate::errors::{CommandError, SupervisorError};
use crate::supervisor::SupervisorHandle;

/// Delivers operator-typed lines to the managed server's stdin.
///
/// Validation happens here; the running check, the console echo and the
/// write all happen inside the supervisor owner task so they are atomic with
/// respect to lifecycle changes.
#[derive(Debug, Clone)]
pub struct CommandChannel {
    supervisor: SupervisorHandle,
}

impl CommandChannel {
    pub fn new(supervisor: SupervisorHandle) -> Self {
        Self { supervisor }
    }

    /// Send one command line.
    ///
    /// On success the console shows `> <command>` and the server has received
    /// `<command>\n`. A rejected command leaves the console untouched.
    pub async fn send(&self, text: &str) -> Result<(), CommandError> {
        let command = validate(text)?;

        if !self.supervisor.is_running() {
            return Err(CommandError::NotRunning);
        }

        debug!(%command, "forwarding command to server");

        let line = format!("{command}\n");
        let echo = format!("> {command}\n");
        self.supervisor
            .send_line(line, echo)
            .await
            .map_err(|e| match e {
                SupervisorError::NotRunning => CommandError::NotRunning,
                other => CommandError::WriteFailure(other.to_string()),
            })
    }
}

/// Trim and check a raw command. One command per call: embedded line breaks
/// are rejected rather than smuggling several lines into stdin.
fn validate(text: &str) -> Result<&str, CommandError> {
    let command = text.trim();
    if command.is_empty() {
        return Err(CommandError::Invalid("command is empty".to_string()));
    }
    if command.contains(['\n', '\r']) {
        return Err(CommandError::Invalid(
            "command must be a single line".to_string(),
        ));
    }
    Ok(command)
}
