//! End-to-end tests covering the daemon loop and the probe client

use std::path::Path;
use std::time::Duration;

use tempfile::tempdir;
use tokio::io::AsyncWriteExt;
use tokio::net::UnixListener;
use tokio::task::JoinHandle;

use healthchecker::check::{Check, HttpCheck};
use healthchecker::client::{self, ProbeError};
use healthchecker::config::HttpCheckConfig;
use healthchecker::server::{spawn_signal_watcher, ServeError, Server, Shutdown};
use healthchecker::Verdict;

use crate::helpers::{http_response, wait_for_socket, wait_until, ScriptedServer, StaticCheck};

/// Runs a daemon for `check` in the background.
fn spawn_server<C>(
    socket_path: &Path,
    check: C,
) -> (Shutdown, JoinHandle<Result<(), ServeError>>)
where
    C: Check + 'static,
{
    let shutdown = Shutdown::new();
    let server = Server::new(socket_path, check);
    let task = tokio::spawn({
        let shutdown = shutdown.clone();
        async move { server.run(shutdown).await }
    });
    (shutdown, task)
}

async fn stop_server(shutdown: Shutdown, task: JoinHandle<Result<(), ServeError>>) {
    shutdown.trigger();
    task.await
        .expect("Server task panicked")
        .expect("Server exited with error");
}

#[tokio::test]
async fn test_healthy_check_yields_healthy_verdict() {
    let dir = tempdir().expect("Failed to create temp dir");
    let socket_path = dir.path().join("health.sock");
    let check = StaticCheck::healthy();
    let (shutdown, task) = spawn_server(&socket_path, check.clone());
    wait_for_socket(&socket_path).await;

    let verdict = client::probe(&socket_path).await.expect("Probe failed");
    assert_eq!(verdict, Verdict::Healthy);
    assert_eq!(check.runs(), 1);

    stop_server(shutdown, task).await;
}

#[tokio::test]
async fn test_failing_check_yields_unhealthy_verdict() {
    let dir = tempdir().expect("Failed to create temp dir");
    let socket_path = dir.path().join("health.sock");
    let (shutdown, task) = spawn_server(&socket_path, StaticCheck::unhealthy());
    wait_for_socket(&socket_path).await;

    let verdict = client::probe(&socket_path).await.expect("Probe failed");
    assert_eq!(verdict, Verdict::Unhealthy);

    stop_server(shutdown, task).await;
}

#[tokio::test]
async fn test_each_probe_runs_a_fresh_check() {
    let dir = tempdir().expect("Failed to create temp dir");
    let socket_path = dir.path().join("health.sock");
    let check = StaticCheck::healthy();
    let (shutdown, task) = spawn_server(&socket_path, check.clone());
    wait_for_socket(&socket_path).await;

    let verdict = client::probe(&socket_path).await.expect("First probe failed");
    assert_eq!(verdict, Verdict::Healthy);

    // The next probe must observe the state change, not a cached verdict.
    check.set_healthy(false);
    let verdict = client::probe(&socket_path).await.expect("Second probe failed");
    assert_eq!(verdict, Verdict::Unhealthy);
    assert_eq!(check.runs(), 2);

    stop_server(shutdown, task).await;
}

#[tokio::test]
async fn test_concurrent_probes_are_served_one_at_a_time() {
    let dir = tempdir().expect("Failed to create temp dir");
    let socket_path = dir.path().join("health.sock");
    let check = StaticCheck::healthy().with_delay(Duration::from_millis(100));
    let (shutdown, task) = spawn_server(&socket_path, check.clone());
    wait_for_socket(&socket_path).await;

    let (first, second) = tokio::join!(client::probe(&socket_path), client::probe(&socket_path));
    assert_eq!(first.expect("First probe failed"), Verdict::Healthy);
    assert_eq!(second.expect("Second probe failed"), Verdict::Healthy);
    assert_eq!(check.runs(), 2);
    assert_eq!(check.max_in_flight(), 1, "Checks must never overlap");

    stop_server(shutdown, task).await;
}

#[tokio::test]
async fn test_shutdown_unlinks_socket_and_frees_the_path() {
    let dir = tempdir().expect("Failed to create temp dir");
    let socket_path = dir.path().join("health.sock");
    let (shutdown, task) = spawn_server(&socket_path, StaticCheck::healthy());
    wait_for_socket(&socket_path).await;

    stop_server(shutdown, task).await;
    assert!(!socket_path.exists(), "Socket file must be removed on exit");

    // The same path binds again without any cleanup in between.
    let (shutdown, task) = spawn_server(&socket_path, StaticCheck::healthy());
    wait_for_socket(&socket_path).await;
    let verdict = client::probe(&socket_path).await.expect("Probe failed");
    assert_eq!(verdict, Verdict::Healthy);

    stop_server(shutdown, task).await;
}

#[tokio::test]
async fn test_second_daemon_on_a_live_path_is_refused() {
    let dir = tempdir().expect("Failed to create temp dir");
    let socket_path = dir.path().join("health.sock");
    let (shutdown, task) = spawn_server(&socket_path, StaticCheck::healthy());
    wait_for_socket(&socket_path).await;

    let refused = Server::new(&socket_path, StaticCheck::healthy());
    match refused.run(Shutdown::new()).await {
        Err(ServeError::Bind { path, .. }) => assert_eq!(path, socket_path),
        other => panic!("Expected a bind error, got {:?}", other),
    }

    // The refused daemon must not have broken the running one.
    let verdict = client::probe(&socket_path).await.expect("Probe failed");
    assert_eq!(verdict, Verdict::Healthy);

    stop_server(shutdown, task).await;
}

#[tokio::test]
async fn test_shutdown_waits_for_the_in_flight_check() {
    let dir = tempdir().expect("Failed to create temp dir");
    let socket_path = dir.path().join("health.sock");
    let check = StaticCheck::healthy().with_delay(Duration::from_millis(200));
    let (shutdown, task) = spawn_server(&socket_path, check.clone());
    wait_for_socket(&socket_path).await;

    let probe_path = socket_path.clone();
    let probe = tokio::spawn(async move { client::probe(&probe_path).await });

    // Interrupt while the check is still running.
    wait_until("the check to start", || check.runs() == 1).await;
    shutdown.trigger();

    let verdict = probe
        .await
        .expect("Probe task panicked")
        .expect("Probe failed");
    assert_eq!(verdict, Verdict::Healthy, "In-flight probe must get its verdict");

    task.await
        .expect("Server task panicked")
        .expect("Server exited with error");
    assert!(!socket_path.exists(), "Socket file must be removed on exit");
}

#[tokio::test]
async fn test_sigterm_shuts_the_daemon_down() {
    let dir = tempdir().expect("Failed to create temp dir");
    let socket_path = dir.path().join("health.sock");
    let (shutdown, task) = spawn_server(&socket_path, StaticCheck::healthy());
    let watcher = spawn_signal_watcher(shutdown).expect("Failed to register signal handlers");
    wait_for_socket(&socket_path).await;

    // The watcher above replaced the default disposition, so a real SIGTERM
    // reaches tokio's handler instead of killing the test binary.
    unsafe {
        assert_eq!(libc::kill(libc::getpid(), libc::SIGTERM), 0);
    }

    tokio::time::timeout(Duration::from_secs(5), task)
        .await
        .expect("Daemon kept running after SIGTERM")
        .expect("Server task panicked")
        .expect("Server exited with error");
    tokio::time::timeout(Duration::from_secs(5), watcher)
        .await
        .expect("Watcher kept running after SIGTERM")
        .expect("Watcher task panicked");
    assert!(!socket_path.exists(), "Socket file must be removed on exit");
}

#[tokio::test]
async fn test_empty_response_is_a_protocol_error() {
    let dir = tempdir().expect("Failed to create temp dir");
    let socket_path = dir.path().join("mute.sock");
    let listener = UnixListener::bind(&socket_path).expect("Failed to bind");
    let mute = tokio::spawn(async move {
        let (stream, _) = listener.accept().await.expect("Accept failed");
        // Close without writing a verdict.
        drop(stream);
    });

    match client::probe(&socket_path).await {
        Err(ProbeError::Protocol { error }) => assert!(error.bytes.is_empty()),
        other => panic!("Expected a protocol error, got {:?}", other),
    }
    mute.await.expect("Listener task panicked");
}

#[tokio::test]
async fn test_oversized_response_is_a_protocol_error() {
    let dir = tempdir().expect("Failed to create temp dir");
    let socket_path = dir.path().join("chatty.sock");
    let listener = UnixListener::bind(&socket_path).expect("Failed to bind");
    let chatty = tokio::spawn(async move {
        let (mut stream, _) = listener.accept().await.expect("Accept failed");
        stream.write_all(&[0, 0]).await.expect("Write failed");
        stream.shutdown().await.expect("Close failed");
    });

    match client::probe(&socket_path).await {
        Err(ProbeError::Protocol { error }) => assert_eq!(error.bytes, vec![0, 0]),
        other => panic!("Expected a protocol error, got {:?}", other),
    }
    chatty.await.expect("Listener task panicked");
}

#[tokio::test]
async fn test_probe_without_a_daemon_reports_the_socket_path() {
    let dir = tempdir().expect("Failed to create temp dir");
    let socket_path = dir.path().join("absent.sock");

    let err = client::probe(&socket_path).await.unwrap_err();
    match &err {
        ProbeError::Connect { path, .. } => assert_eq!(path, &socket_path),
        other => panic!("Expected a connect error, got {}", other),
    }
    assert!(err.to_string().contains("absent.sock"));
}

#[tokio::test]
async fn test_http_check_verdict_reaches_the_probe() {
    let origin = ScriptedServer::start(vec![
        http_response("200 OK", "ready"),
        http_response("503 Service Unavailable", "draining"),
    ])
    .await;

    let dir = tempdir().expect("Failed to create temp dir");
    let socket_path = dir.path().join("health.sock");
    let check =
        HttpCheck::new(HttpCheckConfig::new(origin.url("/health"))).expect("Failed to build check");
    let (shutdown, task) = spawn_server(&socket_path, check);
    wait_for_socket(&socket_path).await;

    let verdict = client::probe(&socket_path).await.expect("First probe failed");
    assert_eq!(verdict, Verdict::Healthy);

    let verdict = client::probe(&socket_path).await.expect("Second probe failed");
    assert_eq!(verdict, Verdict::Unhealthy);

    stop_server(shutdown, task).await;
}
