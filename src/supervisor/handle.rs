// src/supervisor/handle.rs

use tokio::sync::{mpsc, oneshot, watch};

use crate::errors::SupervisorError;
use crate::types::{ServerState, StartOutcome, StopOutcome};

use super::actor::{AfterExit, Request};

/// Cloneable front door to the supervisor owner task.
///
/// Lifecycle operations are messages to the owner task. State reads go
/// through a `watch` channel and never wait behind a pending operation, so
/// `state()` stays responsive while a shutdown is in flight.
#[derive(Debug, Clone)]
pub struct SupervisorHandle {
    tx: mpsc::Sender<Request>,
    state_rx: watch::Receiver<ServerState>,
}

impl SupervisorHandle {
    pub(crate) fn new(tx: mpsc::Sender<Request>, state_rx: watch::Receiver<ServerState>) -> Self {
        Self { tx, state_rx }
    }

    async fn request<T>(
        &self,
        make: impl FnOnce(oneshot::Sender<Result<T, SupervisorError>>) -> Request,
    ) -> Result<T, SupervisorError> {
        let (reply, rx) = oneshot::channel();
        self.tx
            .send(make(reply))
            .await
            .map_err(|_| SupervisorError::Unavailable)?;
        rx.await.map_err(|_| SupervisorError::Unavailable)?
    }

    /// Launch the server unless a process handle already exists.
    pub async fn start(&self) -> Result<StartOutcome, SupervisorError> {
        self.request(|reply| Request::Start { reply }).await
    }

    /// Ask the server to shut down gracefully. Returns once the shutdown
    /// command is written; exit happens later.
    pub async fn stop(&self) -> Result<StopOutcome, SupervisorError> {
        self.request(|reply| Request::Stop { after: None, reply })
            .await
    }

    /// Stop, then start again once the exit has been observed.
    ///
    /// When nothing is running this starts immediately, and a launch failure
    /// is returned to the caller.
    pub async fn restart(&self) -> Result<StopOutcome, SupervisorError> {
        self.request(|reply| Request::Stop {
            after: Some(AfterExit::Start),
            reply,
        })
        .await
    }

    /// Stop and wait for the OS to report the exit. Resolves with the exit
    /// code, or `None` if nothing was running or no code was reported.
    ///
    /// Any number of callers may wait on the same shutdown.
    pub async fn stop_and_wait(&self) -> Result<Option<i32>, SupervisorError> {
        let (notify, exited) = oneshot::channel();

        self.request(|reply| Request::Stop {
            after: Some(AfterExit::Notify(notify)),
            reply,
        })
        .await?;

        exited.await.map_err(|_| SupervisorError::Unavailable)
    }

    /// Write `line` to the server's stdin after appending `echo` to the
    /// console. Used by the command channel.
    pub(crate) async fn send_line(&self, line: String, echo: String) -> Result<(), SupervisorError> {
        self.request(|reply| Request::SendLine { line, echo, reply })
            .await
    }

    pub fn state(&self) -> ServerState {
        *self.state_rx.borrow()
    }

    /// True while a process handle exists (`Running` or `Stopping`).
    pub fn is_running(&self) -> bool {
        self.state().is_running()
    }

    /// Subscribe to state transitions.
    pub fn subscribe(&self) -> watch::Receiver<ServerState> {
        self.state_rx.clone()
    }

    /// Wait until the supervisor reports `target`.
    pub async fn wait_for_state(&self, target: ServerState) -> Result<(), SupervisorError> {
        let mut rx = self.state_rx.clone();
        rx.wait_for(|s| *s == target)
            .await
            .map(|_| ())
            .map_err(|_| SupervisorError::Unavailable)
    }
}
