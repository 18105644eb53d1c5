// src/supervisor/actor.rs

//! The supervisor owner task.
//!
//! Every mutation of the process handle, its stdin and the pending
//! continuation happens inside [`Supervisor::run`], one message at a time.
//! Exit notifications from watcher tasks arrive on a second channel and go
//! through the same loop, so `start`/`stop`/`restart` can never race each
//! other or the exit transition.

use std::io;
use std::sync::Arc;
use std::time::Duration;

use tokio::io::AsyncWriteExt;
use tokio::sync::{mpsc, oneshot, watch};
use tokio::task::AbortHandle;
use tokio::time::timeout;
use tracing::{debug, error, info, warn};

use crate::console::ConsoleBuffer;
use crate::errors::SupervisorError;
use crate::types::{ServerState, StartOutcome, StopOutcome};

use super::launcher::{LaunchSpec, ProcessLauncher, ProcessStdin};
use super::output::spawn_output_reader;
use super::SupervisorSettings;

type Reply<T> = oneshot::Sender<Result<T, SupervisorError>>;

/// What to do once the current process has exited.
#[derive(Debug)]
pub(crate) enum AfterExit {
    /// Launch a fresh process (the restart continuation).
    Start,
    /// Hand the exit code to a waiting caller.
    Notify(oneshot::Sender<Option<i32>>),
}

/// Requests accepted by the owner task.
#[derive(Debug)]
pub(crate) enum Request {
    Start {
        reply: Reply<StartOutcome>,
    },
    Stop {
        after: Option<AfterExit>,
        reply: Reply<StopOutcome>,
    },
    SendLine {
        line: String,
        echo: String,
        reply: Reply<()>,
    },
}

/// Reported by a watcher task once its process is gone and output drained.
#[derive(Debug)]
struct ProcessExited {
    generation: u64,
    code: Option<i32>,
}

/// The live handle. Only exists between launch and observed exit.
struct ActiveProcess {
    generation: u64,
    pid: Option<u32>,
    stdin: Option<ProcessStdin>,
}

pub(crate) struct Supervisor {
    launcher: Arc<dyn ProcessLauncher>,
    spec: LaunchSpec,
    console: ConsoleBuffer,
    settings: SupervisorSettings,
    state_tx: watch::Sender<ServerState>,
    exit_tx: mpsc::UnboundedSender<ProcessExited>,
    active: Option<ActiveProcess>,
    /// Restart continuation; at most one per process instance.
    restart_pending: bool,
    /// Callers waiting for the current process's exit code.
    exit_waiters: Vec<oneshot::Sender<Option<i32>>>,
    next_generation: u64,
}

impl Supervisor {
    /// Spawn the owner task and return its request sender and state feed.
    pub(crate) fn spawn(
        launcher: Arc<dyn ProcessLauncher>,
        spec: LaunchSpec,
        console: ConsoleBuffer,
        settings: SupervisorSettings,
    ) -> (mpsc::Sender<Request>, watch::Receiver<ServerState>) {
        let (tx, rx) = mpsc::channel::<Request>(32);
        let (exit_tx, exit_rx) = mpsc::unbounded_channel();
        let (state_tx, state_rx) = watch::channel(ServerState::Stopped);

        let supervisor = Supervisor {
            launcher,
            spec,
            console,
            settings,
            state_tx,
            exit_tx,
            active: None,
            restart_pending: false,
            exit_waiters: Vec::new(),
            next_generation: 1,
        };

        tokio::spawn(supervisor.run(rx, exit_rx));

        (tx, state_rx)
    }

    async fn run(
        mut self,
        mut requests: mpsc::Receiver<Request>,
        mut exits: mpsc::UnboundedReceiver<ProcessExited>,
    ) {
        info!(cmd = %self.spec.display_command(), "supervisor started");

        loop {
            tokio::select! {
                // Exits first, so requests always see the latest state.
                biased;

                Some(exited) = exits.recv() => self.on_exit(exited).await,

                request = requests.recv() => match request {
                    Some(request) => self.handle(request).await,
                    None => break,
                },
            }
        }

        info!("supervisor finished (all handles dropped)");
    }

    async fn handle(&mut self, request: Request) {
        match request {
            Request::Start { reply } => {
                let _ = reply.send(self.start().await);
            }
            Request::Stop { after, reply } => {
                let _ = reply.send(self.stop(after).await);
            }
            Request::SendLine { line, echo, reply } => {
                let _ = reply.send(self.send_line(&line, &echo).await);
            }
        }
    }

    fn state(&self) -> ServerState {
        *self.state_tx.borrow()
    }

    fn set_state(&self, state: ServerState) {
        let previous = self.state_tx.send_replace(state);
        if previous != state {
            debug!(from = %previous, to = %state, "server state changed");
        }
    }

    async fn start(&mut self) -> Result<StartOutcome, SupervisorError> {
        if self.active.is_some() {
            let state = self.state();
            debug!(%state, "start requested while a process is active; ignoring");
            return Ok(StartOutcome::AlreadyActive(state));
        }

        let launched = self.launcher.launch(&self.spec).map_err(|e| {
            error!(error = %e, cmd = %self.spec.display_command(), "failed to launch server process");
            SupervisorError::LaunchFailure(e)
        })?;

        let generation = self.next_generation;
        self.next_generation += 1;

        let mut readers = Vec::new();
        if let Some(stdout) = launched.stdout {
            readers.push(spawn_output_reader(stdout, self.console.clone(), "stdout", generation));
        }
        if let Some(stderr) = launched.stderr {
            readers.push(spawn_output_reader(stderr, self.console.clone(), "stderr", generation));
        }

        // Watch for exit. Output is drained before the exit is reported so the
        // exit notice lands after the process's last lines.
        let exit = launched.exit;
        let exit_tx = self.exit_tx.clone();
        let drain_grace = self.settings.drain_grace;
        tokio::spawn(async move {
            let code = match exit.await {
                Ok(code) => code,
                Err(e) => {
                    warn!(generation, error = %e, "failed waiting for server process");
                    None
                }
            };

            let aborts: Vec<AbortHandle> = readers.iter().map(|r| r.abort_handle()).collect();
            let drained = timeout(drain_grace, async {
                for reader in readers {
                    let _ = reader.await;
                }
            })
            .await;
            if drained.is_err() {
                debug!(generation, "output still open after exit; detaching readers");
                aborts.iter().for_each(AbortHandle::abort);
            }

            let _ = exit_tx.send(ProcessExited { generation, code });
        });

        info!(pid = ?launched.pid, generation, "server process started");

        self.active = Some(ActiveProcess {
            generation,
            pid: launched.pid,
            stdin: launched.stdin,
        });
        self.set_state(ServerState::Running);

        Ok(StartOutcome::Started { pid: launched.pid })
    }

    async fn stop(&mut self, after: Option<AfterExit>) -> Result<StopOutcome, SupervisorError> {
        let state = self.state();
        let Some(active) = self.active.as_mut() else {
            debug!("stop requested with no process; running continuation now");
            if let Some(after) = after {
                self.run_now(after).await?;
            }
            return Ok(StopOutcome::AlreadyStopped);
        };

        if state == ServerState::Stopping {
            debug!(generation = active.generation, "shutdown already in progress");
            self.defer(after);
            return Ok(StopOutcome::AlreadyStopping);
        }

        let line = format!("{}\n", self.settings.stop_command);
        write_line(&mut active.stdin, &line, self.settings.write_timeout)
            .await
            .map_err(|e| {
                warn!(generation = active.generation, error = %e, "failed to send shutdown command");
                SupervisorError::WriteFailure(e)
            })?;

        info!(
            pid = ?active.pid,
            generation = active.generation,
            command = %self.settings.stop_command,
            "graceful shutdown requested"
        );

        self.defer(after);
        self.set_state(ServerState::Stopping);
        Ok(StopOutcome::Stopping)
    }

    /// Attach a continuation to the pending exit. A second restart while one
    /// is already queued is dropped.
    fn defer(&mut self, after: Option<AfterExit>) {
        match after {
            None => {}
            Some(AfterExit::Notify(tx)) => self.exit_waiters.push(tx),
            Some(AfterExit::Start) if self.restart_pending => {
                debug!("restart already pending; dropping duplicate");
            }
            Some(AfterExit::Start) => self.restart_pending = true,
        }
    }

    async fn send_line(&mut self, line: &str, echo: &str) -> Result<(), SupervisorError> {
        let Some(active) = self.active.as_mut() else {
            return Err(SupervisorError::NotRunning);
        };

        // Echo before writing: anything the command causes comes after it.
        self.console.append(echo);

        if let Err(e) = write_line(&mut active.stdin, line, self.settings.write_timeout).await {
            warn!(generation = active.generation, error = %e, "failed to write command to server");
            self.console.append_line("[Failed to send command]");
            return Err(SupervisorError::WriteFailure(e));
        }
        Ok(())
    }

    async fn on_exit(&mut self, exited: ProcessExited) {
        match &self.active {
            Some(active) if active.generation == exited.generation => {}
            _ => {
                debug!(generation = exited.generation, "ignoring exit of a stale process");
                return;
            }
        }

        let solicited = self.state() == ServerState::Stopping;
        let code = exited
            .code
            .map(|c| c.to_string())
            .unwrap_or_else(|| "null".to_string());

        self.active = None;
        self.console.append_line(&format!("[Server exited with code {code}]"));
        self.set_state(ServerState::Stopped);

        info!(generation = exited.generation, exit_code = %code, solicited, "server process exited");

        for waiter in self.exit_waiters.drain(..) {
            let _ = waiter.send(exited.code);
        }

        if std::mem::take(&mut self.restart_pending) {
            if let Err(e) = self.start().await {
                self.console.append_line(&format!("[Failed to start server: {e}]"));
            }
        }
    }

    /// Run a continuation immediately (nothing was running).
    async fn run_now(&mut self, after: AfterExit) -> Result<(), SupervisorError> {
        match after {
            AfterExit::Start => self.start().await.map(|_| ()),
            AfterExit::Notify(tx) => {
                let _ = tx.send(None);
                Ok(())
            }
        }
    }
}

/// Write `line` to stdin within `limit`. A timed-out write may have left a
/// partial line in the pipe, so stdin is closed and later writes fail with
/// `BrokenPipe`.
async fn write_line(
    stdin: &mut Option<ProcessStdin>,
    line: &str,
    limit: Duration,
) -> io::Result<()> {
    let writer = stdin
        .as_mut()
        .ok_or_else(|| io::Error::new(io::ErrorKind::BrokenPipe, "server stdin is closed"))?;

    let write = async {
        writer.write_all(line.as_bytes()).await?;
        writer.flush().await
    };

    let result = timeout(limit, write).await;
    match result {
        Ok(result) => result,
        Err(_) => {
            *stdin = None;
            Err(io::Error::new(
                io::ErrorKind::TimedOut,
                "timed out writing to server stdin; closing it",
            ))
        }
    }
}
