// src/supervisor/launcher.rs

//! Pluggable process launcher.
//!
//! The supervisor never calls `tokio::process::Command` directly; it asks a
//! [`ProcessLauncher`] for a [`LaunchedProcess`]. Production code uses
//! [`TokioLauncher`]; tests can provide a launcher that hands out in-memory
//! pipes and lets them decide when the "process" exits.

use std::fmt;
use std::future::Future;
use std::io;
use std::path::PathBuf;
use std::pin::Pin;
use std::process::Stdio;

use tokio::io::{AsyncRead, AsyncWrite};
use tokio::process::Command;
use tracing::debug;

pub type ProcessStdin = Box<dyn AsyncWrite + Send + Unpin>;
pub type ProcessOutput = Box<dyn AsyncRead + Send + Unpin>;

/// Resolves once the process has exited, with its exit code if the OS
/// reported one.
pub type ExitFuture = Pin<Box<dyn Future<Output = io::Result<Option<i32>>> + Send>>;

/// Immutable description of how to launch the managed server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LaunchSpec {
    pub program: String,
    pub args: Vec<String>,
    pub working_dir: PathBuf,
}

impl LaunchSpec {
    /// Render the launch command for logs and `--dry-run`.
    pub fn display_command(&self) -> String {
        let mut out = self.program.clone();
        for arg in &self.args {
            out.push(' ');
            out.push_str(arg);
        }
        out
    }
}

/// The pieces of a freshly spawned process the supervisor takes ownership
/// of.
pub struct LaunchedProcess {
    pub pid: Option<u32>,
    pub stdin: Option<ProcessStdin>,
    pub stdout: Option<ProcessOutput>,
    pub stderr: Option<ProcessOutput>,
    pub exit: ExitFuture,
}

impl fmt::Debug for LaunchedProcess {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LaunchedProcess")
            .field("pid", &self.pid)
            .field("stdin", &self.stdin.is_some())
            .field("stdout", &self.stdout.is_some())
            .field("stderr", &self.stderr.is_some())
            .finish_non_exhaustive()
    }
}

/// Trait abstracting how the managed process is spawned.
pub trait ProcessLauncher: Send + Sync + 'static {
    /// Spawn the process described by `spec`.
    ///
    /// An error here is a launch failure: nothing was started.
    fn launch(&self, spec: &LaunchSpec) -> io::Result<LaunchedProcess>;
}

/// Real launcher backed by `tokio::process`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioLauncher;

impl ProcessLauncher for TokioLauncher {
    fn launch(&self, spec: &LaunchSpec) -> io::Result<LaunchedProcess> {
        debug!(
            cmd = %spec.display_command(),
            cwd = %spec.working_dir.display(),
            "spawning server process"
        );

        let mut child = Command::new(&spec.program)
            .args(&spec.args)
            .current_dir(&spec.working_dir)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()?;

        let pid = child.id();
        let stdin = child.stdin.take().map(|s| Box::new(s) as ProcessStdin);
        let stdout = child.stdout.take().map(|s| Box::new(s) as ProcessOutput);
        let stderr = child.stderr.take().map(|s| Box::new(s) as ProcessOutput);

        let exit: ExitFuture = Box::pin(async move {
            let status = child.wait().await?;
            Ok(status.code())
        });

        Ok(LaunchedProcess {
            pid,
            stdin,
            stdout,
            stderr,
            exit,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_command_joins_program_and_args() {
        let spec = LaunchSpec {
            program: "java".to_string(),
            args: vec!["-Xmx8G".to_string(), "-jar".to_string(), "server.jar".to_string()],
            working_dir: PathBuf::from("/srv/mc"),
        };
        assert_eq!(spec.display_command(), "java -Xmx8G -jar server.jar");
    }

    #[tokio::test]
    async fn missing_program_is_a_launch_error() {
        let spec = LaunchSpec {
            program: "definitely-not-a-real-binary-gamectl".to_string(),
            args: Vec::new(),
            working_dir: std::env::temp_dir(),
        };
        assert!(TokioLauncher.launch(&spec).is_err());
    }
}
