use std::io;
use std::sync::{Arc, Mutex};

use gamectl::supervisor::{
    ExitFuture, LaunchSpec, LaunchedProcess, ProcessLauncher, ProcessOutput, ProcessStdin,
};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, DuplexStream};
use tokio::sync::oneshot;

const PIPE_CAPACITY: usize = 64 * 1024;
const STALLED_PIPE_CAPACITY: usize = 4;

/// A fake launcher that:
/// - counts launches and tracks how many "processes" are alive at once
/// - hands the supervisor in-memory pipes instead of OS pipes
/// - records every line written to stdin
/// - exits a process with code 0 when it reads the stop command (like the
///   real server), unless configured otherwise
///
/// Tests drive output and exits through the [`FakeProcess`] handles.
#[derive(Clone)]
pub struct FakeLauncher {
    state: Arc<Mutex<LauncherState>>,
    exit_on_line: Option<(String, Option<i32>)>,
    stdin: StdinMode,
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum StdinMode {
    Piped,
    Missing,
    /// Tiny pipe nobody reads, so writes block.
    Stalled,
}

#[derive(Default)]
struct LauncherState {
    launches: usize,
    alive: usize,
    max_alive: usize,
    fail: bool,
    processes: Vec<FakeProcess>,
    stalled_pipes: Vec<DuplexStream>,
}

impl FakeLauncher {
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(LauncherState::default())),
            exit_on_line: Some(("stop".to_string(), Some(0))),
            stdin: StdinMode::Piped,
        }
    }

    /// Processes ignore the stop command; tests must call
    /// [`FakeProcess::exit`] themselves.
    pub fn ignoring_stop(mut self) -> Self {
        self.exit_on_line = None;
        self
    }

    /// Processes come up without a stdin pipe, so every write fails.
    pub fn without_stdin(mut self) -> Self {
        self.stdin = StdinMode::Missing;
        self
    }

    /// Processes never read stdin and the pipe holds only a few bytes, so
    /// longer writes hang until the write timeout.
    pub fn with_stalled_stdin(mut self) -> Self {
        self.stdin = StdinMode::Stalled;
        self
    }

    /// Make subsequent launches fail (or succeed again).
    pub fn set_failing(&self, fail: bool) {
        self.state.lock().unwrap().fail = fail;
    }

    pub fn launch_count(&self) -> usize {
        self.state.lock().unwrap().launches
    }

    /// Highest number of processes alive at the same time.
    pub fn max_concurrent(&self) -> usize {
        self.state.lock().unwrap().max_alive
    }

    pub fn alive(&self) -> usize {
        self.state.lock().unwrap().alive
    }

    /// Handle for the `n`th launched process (0-based).
    pub fn process(&self, n: usize) -> FakeProcess {
        self.state.lock().unwrap().processes[n].clone()
    }

    /// Handle for the most recently launched process.
    pub fn last_process(&self) -> FakeProcess {
        let state = self.state.lock().unwrap();
        state.processes.last().cloned().expect("no process launched yet")
    }
}

impl Default for FakeLauncher {
    fn default() -> Self {
        Self::new()
    }
}

impl ProcessLauncher for FakeLauncher {
    fn launch(&self, _spec: &LaunchSpec) -> io::Result<LaunchedProcess> {
        let mut state = self.state.lock().unwrap();
        if state.fail {
            return Err(io::Error::new(io::ErrorKind::NotFound, "fake launch failure"));
        }

        state.launches += 1;
        state.alive += 1;
        state.max_alive = state.max_alive.max(state.alive);
        let pid = 1000 + state.launches as u32;

        let (stdout_ours, stdout_theirs) = tokio::io::duplex(PIPE_CAPACITY);
        let (exit_tx, exit_rx) = oneshot::channel();

        let process = FakeProcess {
            pid,
            stdout: Arc::new(tokio::sync::Mutex::new(Some(stdout_ours))),
            exit_tx: Arc::new(Mutex::new(Some(exit_tx))),
            stdin_lines: Arc::new(Mutex::new(Vec::new())),
        };

        let stdin: Option<ProcessStdin> = match self.stdin {
            StdinMode::Piped => {
                let (stdin_ours, stdin_theirs) = tokio::io::duplex(PIPE_CAPACITY);
                tokio::spawn(read_stdin(
                    stdin_ours,
                    process.clone(),
                    self.exit_on_line.clone(),
                ));
                Some(Box::new(stdin_theirs) as ProcessStdin)
            }
            StdinMode::Missing => None,
            StdinMode::Stalled => {
                let (stdin_ours, stdin_theirs) = tokio::io::duplex(STALLED_PIPE_CAPACITY);
                state.stalled_pipes.push(stdin_ours);
                Some(Box::new(stdin_theirs) as ProcessStdin)
            }
        };

        state.processes.push(process);

        let launcher_state = Arc::clone(&self.state);
        let exit: ExitFuture = Box::pin(async move {
            let code = exit_rx.await.unwrap_or(None);
            launcher_state.lock().unwrap().alive -= 1;
            Ok(code)
        });

        Ok(LaunchedProcess {
            pid: Some(pid),
            stdin,
            stdout: Some(Box::new(stdout_theirs) as ProcessOutput),
            stderr: None,
            exit,
        })
    }
}

async fn read_stdin(
    pipe: DuplexStream,
    process: FakeProcess,
    exit_on_line: Option<(String, Option<i32>)>,
) {
    let mut lines = BufReader::new(pipe).lines();
    while let Ok(Some(line)) = lines.next_line().await {
        process.stdin_lines.lock().unwrap().push(line.clone());
        if let Some((trigger, code)) = &exit_on_line {
            if line == *trigger {
                process.emit("[Server thread/INFO]: Stopping server\n").await;
                process.exit(*code).await;
            }
        }
    }
}

/// Test-side controls for one launched fake process.
#[derive(Clone)]
pub struct FakeProcess {
    pub pid: u32,
    stdout: Arc<tokio::sync::Mutex<Option<DuplexStream>>>,
    exit_tx: Arc<Mutex<Option<oneshot::Sender<Option<i32>>>>>,
    stdin_lines: Arc<Mutex<Vec<String>>>,
}

impl FakeProcess {
    /// Write `text` to the process's stdout. No-op after exit.
    pub async fn emit(&self, text: &str) {
        let mut guard = self.stdout.lock().await;
        if let Some(pipe) = guard.as_mut() {
            let _ = pipe.write_all(text.as_bytes()).await;
        }
    }

    /// Close stdout and report exit with `code`. Idempotent.
    pub async fn exit(&self, code: Option<i32>) {
        self.stdout.lock().await.take();
        if let Some(tx) = self.exit_tx.lock().unwrap().take() {
            let _ = tx.send(code);
        }
    }

    pub fn has_exited(&self) -> bool {
        self.exit_tx.lock().unwrap().is_none()
    }

    /// Lines received on stdin so far (without trailing newlines).
    pub fn stdin_lines(&self) -> Vec<String> {
        self.stdin_lines.lock().unwrap().clone()
    }
}
