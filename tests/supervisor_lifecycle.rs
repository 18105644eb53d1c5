// tests/supervisor_lifecycle.rs

use std::sync::Arc;
use std::time::Duration;

use gamectl::errors::SupervisorError;
use gamectl::types::{ServerState, StartOutcome, StopOutcome};
use gamectl_test_utils::builders::spawn_test_supervisor;
use gamectl_test_utils::fake_launcher::FakeLauncher;
use gamectl_test_utils::{eventually, init_tracing, with_timeout};

#[tokio::test]
async fn two_immediate_starts_launch_exactly_once() {
    init_tracing();
    let launcher = FakeLauncher::new();
    let (sup, _console) = spawn_test_supervisor(Arc::new(launcher.clone()), 20_000);

    let (a, b) = tokio::join!(sup.start(), sup.start());
    let outcomes = [a.unwrap(), b.unwrap()];

    assert_eq!(launcher.launch_count(), 1);
    assert_eq!(
        outcomes
            .iter()
            .filter(|o| matches!(o, StartOutcome::Started { .. }))
            .count(),
        1
    );
    assert!(outcomes.contains(&StartOutcome::AlreadyActive(ServerState::Running)));
    assert_eq!(sup.state(), ServerState::Running);
}

#[tokio::test]
async fn stop_when_stopped_runs_continuation_without_writing() {
    init_tracing();
    let launcher = FakeLauncher::new();
    let (sup, console) = spawn_test_supervisor(Arc::new(launcher.clone()), 20_000);

    assert_eq!(sup.stop().await.unwrap(), StopOutcome::AlreadyStopped);
    assert_eq!(with_timeout(sup.stop_and_wait()).await.unwrap(), None);

    assert_eq!(launcher.launch_count(), 0);
    assert_eq!(sup.state(), ServerState::Stopped);
    assert!(console.is_empty());
}

#[tokio::test]
async fn stop_writes_shutdown_command_once_and_observes_exit() {
    init_tracing();
    let launcher = FakeLauncher::new().ignoring_stop();
    let (sup, console) = spawn_test_supervisor(Arc::new(launcher.clone()), 20_000);

    sup.start().await.unwrap();
    let process = launcher.last_process();

    assert_eq!(sup.stop().await.unwrap(), StopOutcome::Stopping);
    assert_eq!(sup.state(), ServerState::Stopping);
    assert!(sup.is_running());

    // Second stop while shutting down: no second write.
    assert_eq!(sup.stop().await.unwrap(), StopOutcome::AlreadyStopping);

    eventually(|| !process.stdin_lines().is_empty()).await;
    process.exit(Some(0)).await;
    with_timeout(sup.wait_for_state(ServerState::Stopped))
        .await
        .unwrap();

    assert_eq!(process.stdin_lines(), vec!["stop".to_string()]);
    assert!(console.snapshot().ends_with("[Server exited with code 0]\n"));
    assert!(!sup.is_running());
}

#[tokio::test]
async fn stop_and_wait_resolves_with_exit_code() {
    init_tracing();
    let launcher = FakeLauncher::new();
    let (sup, console) = spawn_test_supervisor(Arc::new(launcher.clone()), 20_000);

    sup.start().await.unwrap();
    let code = with_timeout(sup.stop_and_wait()).await.unwrap();

    assert_eq!(code, Some(0));
    assert_eq!(sup.state(), ServerState::Stopped);
    // The fake prints a shutdown line before exiting; the notice follows it.
    assert!(
        console
            .snapshot()
            .ends_with("[Server thread/INFO]: Stopping server\n[Server exited with code 0]\n")
    );
}

#[tokio::test]
async fn several_callers_can_wait_for_the_same_exit() {
    init_tracing();
    let launcher = FakeLauncher::new().ignoring_stop();
    let (sup, _console) = spawn_test_supervisor(Arc::new(launcher.clone()), 20_000);

    sup.start().await.unwrap();
    let first = tokio::spawn({
        let sup = sup.clone();
        async move { sup.stop_and_wait().await }
    });
    let second = tokio::spawn({
        let sup = sup.clone();
        async move { sup.stop_and_wait().await }
    });

    with_timeout(sup.wait_for_state(ServerState::Stopping))
        .await
        .unwrap();
    // Let both requests reach the supervisor before the exit.
    tokio::time::sleep(Duration::from_millis(20)).await;
    launcher.last_process().exit(Some(3)).await;

    assert_eq!(with_timeout(first).await.unwrap().unwrap(), Some(3));
    assert_eq!(with_timeout(second).await.unwrap().unwrap(), Some(3));
}

#[tokio::test]
async fn restart_launches_only_after_observed_exit() {
    init_tracing();
    let launcher = FakeLauncher::new().ignoring_stop();
    let (sup, _console) = spawn_test_supervisor(Arc::new(launcher.clone()), 20_000);

    sup.start().await.unwrap();
    assert_eq!(sup.restart().await.unwrap(), StopOutcome::Stopping);

    tokio::time::sleep(Duration::from_millis(50)).await;
    assert_eq!(launcher.launch_count(), 1);
    assert_eq!(sup.state(), ServerState::Stopping);
    assert_eq!(
        sup.start().await.unwrap(),
        StartOutcome::AlreadyActive(ServerState::Stopping)
    );

    launcher.process(0).exit(Some(0)).await;
    eventually(|| launcher.launch_count() == 2).await;
    with_timeout(sup.wait_for_state(ServerState::Running))
        .await
        .unwrap();

    assert_eq!(launcher.max_concurrent(), 1);
    assert_eq!(launcher.alive(), 1);
}

#[tokio::test]
async fn restart_while_stopping_fills_the_empty_slot_once() {
    init_tracing();
    let launcher = FakeLauncher::new().ignoring_stop();
    let (sup, _console) = spawn_test_supervisor(Arc::new(launcher.clone()), 20_000);

    sup.start().await.unwrap();
    assert_eq!(sup.stop().await.unwrap(), StopOutcome::Stopping);
    assert_eq!(sup.restart().await.unwrap(), StopOutcome::AlreadyStopping);
    assert_eq!(sup.restart().await.unwrap(), StopOutcome::AlreadyStopping);

    launcher.process(0).exit(Some(0)).await;
    eventually(|| launcher.launch_count() == 2).await;

    // The duplicate restart was dropped: nothing else gets launched.
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert_eq!(launcher.launch_count(), 2);
    assert_eq!(sup.state(), ServerState::Running);
    assert_eq!(launcher.max_concurrent(), 1);
}

#[tokio::test]
async fn restart_from_stopped_starts_immediately() {
    init_tracing();
    let launcher = FakeLauncher::new();
    let (sup, _console) = spawn_test_supervisor(Arc::new(launcher.clone()), 20_000);

    assert_eq!(sup.restart().await.unwrap(), StopOutcome::AlreadyStopped);
    assert_eq!(launcher.launch_count(), 1);
    assert_eq!(sup.state(), ServerState::Running);
}

#[tokio::test]
async fn launch_failure_leaves_state_stopped() {
    init_tracing();
    let launcher = FakeLauncher::new();
    let (sup, _console) = spawn_test_supervisor(Arc::new(launcher.clone()), 20_000);

    launcher.set_failing(true);
    assert!(matches!(sup.start().await, Err(SupervisorError::LaunchFailure(_))));
    assert!(matches!(sup.restart().await, Err(SupervisorError::LaunchFailure(_))));
    assert_eq!(sup.state(), ServerState::Stopped);

    launcher.set_failing(false);
    assert!(matches!(sup.start().await, Ok(StartOutcome::Started { pid: Some(_) })));
    assert_eq!(sup.state(), ServerState::Running);
}

#[tokio::test]
async fn failed_restart_after_exit_is_noted_in_console() {
    init_tracing();
    let launcher = FakeLauncher::new();
    let (sup, console) = spawn_test_supervisor(Arc::new(launcher.clone()), 20_000);

    sup.start().await.unwrap();
    launcher.set_failing(true);
    assert_eq!(sup.restart().await.unwrap(), StopOutcome::Stopping);

    with_timeout(sup.wait_for_state(ServerState::Stopped))
        .await
        .unwrap();
    eventually(|| console.snapshot().contains("[Failed to start server:")).await;
    assert_eq!(sup.state(), ServerState::Stopped);
}

#[tokio::test]
async fn unsolicited_exit_keeps_last_output_before_notice() {
    init_tracing();
    let launcher = FakeLauncher::new();
    let (sup, console) = spawn_test_supervisor(Arc::new(launcher.clone()), 20_000);

    sup.start().await.unwrap();
    let process = launcher.last_process();
    process.emit("[Server thread/ERROR]: Crashed\n").await;
    process.exit(None).await;

    with_timeout(sup.wait_for_state(ServerState::Stopped))
        .await
        .unwrap();
    assert!(
        console
            .snapshot()
            .ends_with("[Server thread/ERROR]: Crashed\n[Server exited with code null]\n")
    );

    // A fresh start is allowed once the exit has been observed.
    sup.start().await.unwrap();
    assert_eq!(launcher.launch_count(), 2);
}

#[tokio::test]
async fn stop_with_broken_stdin_is_a_write_failure() {
    init_tracing();
    let launcher = FakeLauncher::new().without_stdin();
    let (sup, _console) = spawn_test_supervisor(Arc::new(launcher.clone()), 20_000);

    sup.start().await.unwrap();
    assert!(matches!(sup.stop().await, Err(SupervisorError::WriteFailure(_))));
    assert_eq!(sup.state(), ServerState::Running);
}
