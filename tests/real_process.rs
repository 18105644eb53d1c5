// tests/real_process.rs

//! End-to-end lifecycle against a real child process. A small `sh` script
//! stands in for the game server: it echoes commands and exits on `stop`.

#![cfg(unix)]

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use gamectl::command::CommandChannel;
use gamectl::console::ConsoleBuffer;
use gamectl::supervisor::{LaunchSpec, SupervisorSettings, TokioLauncher, spawn_supervisor};
use gamectl::types::ServerState;
use gamectl_test_utils::{eventually, init_tracing, with_timeout};

const FAKE_SERVER: &str = r#"
echo "Done (0.1s)! For help, type \"help\""
while IFS= read -r line; do
  case "$line" in
    stop) echo "Stopping server"; exit 0 ;;
    *) echo "ran: $line" ;;
  esac
done
exit 3
"#;

fn sh_spec(script: &str) -> LaunchSpec {
    LaunchSpec {
        program: "sh".to_string(),
        args: vec!["-c".to_string(), script.to_string()],
        working_dir: PathBuf::from("/"),
    }
}

fn settings() -> SupervisorSettings {
    SupervisorSettings {
        drain_grace: Duration::from_secs(2),
        ..SupervisorSettings::default()
    }
}

#[tokio::test]
async fn sh_server_full_lifecycle() {
    init_tracing();
    let console = ConsoleBuffer::new(20_000);
    let sup = spawn_supervisor(
        Arc::new(TokioLauncher),
        sh_spec(FAKE_SERVER),
        console.clone(),
        settings(),
    );
    let commands = CommandChannel::new(sup.clone());

    sup.start().await.unwrap();
    eventually(|| console.snapshot().contains("Done (0.1s)!")).await;

    commands.send("say hello").await.unwrap();
    eventually(|| console.snapshot().contains("ran: say hello")).await;

    let code = with_timeout(sup.stop_and_wait()).await.unwrap();
    assert_eq!(code, Some(0));
    assert_eq!(sup.state(), ServerState::Stopped);

    let snapshot = console.snapshot();
    let echo = snapshot.find("> say hello").unwrap();
    let ran = snapshot.find("ran: say hello").unwrap();
    assert!(echo < ran);
    assert!(snapshot.ends_with("Stopping server\n[Server exited with code 0]\n"));
}

#[tokio::test]
async fn sh_server_crash_is_observed() {
    init_tracing();
    let console = ConsoleBuffer::new(20_000);
    let sup = spawn_supervisor(
        Arc::new(TokioLauncher),
        sh_spec("echo booting; echo oops >&2; exit 7"),
        console.clone(),
        settings(),
    );

    sup.start().await.unwrap();
    with_timeout(sup.wait_for_state(ServerState::Stopped))
        .await
        .unwrap();

    let snapshot = console.snapshot();
    assert!(snapshot.contains("booting\n"));
    assert!(snapshot.contains("oops\n"));
    assert!(snapshot.ends_with("[Server exited with code 7]\n"));
}

#[tokio::test]
async fn missing_binary_is_a_launch_failure() {
    init_tracing();
    let console = ConsoleBuffer::new(100);
    let sup = spawn_supervisor(
        Arc::new(TokioLauncher),
        LaunchSpec {
            program: "gamectl-no-such-java".to_string(),
            args: Vec::new(),
            working_dir: PathBuf::from("/"),
        },
        console.clone(),
        settings(),
    );

    assert!(sup.start().await.is_err());
    assert_eq!(sup.state(), ServerState::Stopped);
    assert!(console.is_empty());
}
