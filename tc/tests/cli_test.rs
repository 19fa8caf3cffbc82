//! Command-line tests for the taskc binary

use std::time::Duration;

use assert_cmd::Command;
use predicates::prelude::*;
use taskd::config::Config;
use taskd::executor::ExecutorConfig;
use taskd::server::Server;

fn taskc() -> Command {
    Command::cargo_bin("taskc").unwrap()
}

async fn start_server() -> u16 {
    let mut config = Config::default();
    config.server.port = 0;
    config.executor = ExecutorConfig::with_uniform_delay(Duration::from_millis(50));
    let server = Server::start(&config).await.unwrap();
    let port = server.local_addr().unwrap().port();
    tokio::spawn(server.run(std::future::pending::<()>()));
    port
}

#[test]
fn test_help_lists_subcommands() {
    taskc()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("task"))
        .stdout(predicate::str::contains("status"));
}

#[test]
fn test_unknown_kind_is_rejected() {
    taskc()
        .args(["task", "9", "abcd"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Unknown task kind"));
}

#[test]
fn test_missing_data_is_rejected() {
    taskc().args(["task", "1"]).assert().failure();
}

#[test]
fn test_connection_refused_fails() {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let port = listener.local_addr().unwrap().port();
    drop(listener);

    taskc()
        .args(["-P", &port.to_string(), "status", "3f9a61c2"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to connect"));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_status_of_unknown_task() {
    let port = start_server().await;

    tokio::task::spawn_blocking(move || {
        taskc()
            .args(["-P", &port.to_string(), "status", "deadbeef"])
            .assert()
            .success()
            .stdout(predicate::str::contains("No such task"));
    })
    .await
    .unwrap();
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_submit_prints_identifier() {
    let port = start_server().await;

    tokio::task::spawn_blocking(move || {
        taskc()
            .args(["-P", &port.to_string(), "task", "1", "abcd"])
            .assert()
            .success()
            .stdout(predicate::str::is_match(r"^[0-9a-f]{8}: task scheduled").unwrap());
    })
    .await
    .unwrap();
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_packet_mode_waits_for_result() {
    let port = start_server().await;

    tokio::task::spawn_blocking(move || {
        taskc()
            .args(["-P", &port.to_string(), "task", "3", "xyz", "--packet", "--interval", "1"])
            .timeout(Duration::from_secs(30))
            .assert()
            .success()
            .stdout(predicate::str::contains("Waiting for updates."))
            .stdout(predicate::str::contains("done, result: xyyzzz"));
    })
    .await
    .unwrap();
}
