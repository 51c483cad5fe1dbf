// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use sw_core::{Secret, SessionCredential};

async fn collect(running: &mut RunningCommand) -> (String, String, i32) {
    let mut stdout = String::new();
    let mut stderr = String::new();
    loop {
        match running.next_event().await {
            CommandEvent::Stdout(chunk) => stdout.push_str(&chunk),
            CommandEvent::Stderr(chunk) => stderr.push_str(&chunk),
            CommandEvent::Exited(code) => return (stdout, stderr, code),
            CommandEvent::Closed => return (stdout, stderr, -1),
        }
    }
}

#[tokio::test]
async fn captures_stdout_and_exit_code() {
    let mut session = LocalSession::new();
    let mut running = session.spawn("echo hi").await.unwrap();
    let (stdout, stderr, code) = collect(&mut running).await;

    assert_eq!(stdout, "hi\n");
    assert_eq!(stderr, "");
    assert_eq!(code, 0);
}

#[tokio::test]
async fn separates_stderr_from_stdout() {
    let mut session = LocalSession::new();
    let mut running = session.spawn("echo oops 1>&2").await.unwrap();
    let (stdout, stderr, code) = collect(&mut running).await;

    assert_eq!(stdout, "");
    assert_eq!(stderr, "oops\n");
    assert_eq!(code, 0);
}

#[tokio::test]
async fn reports_nonzero_exit() {
    let mut session = LocalSession::new();
    let mut running = session.spawn("exit 3").await.unwrap();
    let (_, _, code) = collect(&mut running).await;
    assert_eq!(code, 3);
}

#[tokio::test]
async fn exited_comes_after_all_output() {
    let mut session = LocalSession::new();
    let mut running = session.spawn("printf one; printf two").await.unwrap();

    let mut events = Vec::new();
    loop {
        let event = running.next_event().await;
        let done = matches!(event, CommandEvent::Exited(_));
        events.push(event);
        if done {
            break;
        }
    }

    let stdout: String = events
        .iter()
        .filter_map(|e| match e {
            CommandEvent::Stdout(chunk) => Some(chunk.as_str()),
            _ => None,
        })
        .collect();
    assert_eq!(stdout, "onetwo");
    assert!(matches!(events.last(), Some(CommandEvent::Exited(0))));
}

#[tokio::test]
async fn forwards_stdin_to_the_child() {
    let mut session = LocalSession::new();
    let mut running = session.spawn("read line; echo \"got $line\"").await.unwrap();

    running.send_stdin("secret123\n").await.unwrap();
    let (stdout, _, code) = collect(&mut running).await;

    assert_eq!(stdout, "got secret123\n");
    assert_eq!(code, 0);
}

#[tokio::test]
async fn abort_kills_the_child_without_waiting() {
    let mut session = LocalSession::new();
    let running = session.spawn("sleep 30").await.unwrap();

    let started = std::time::Instant::now();
    running.abort();
    assert!(started.elapsed() < std::time::Duration::from_secs(5));
}

#[tokio::test]
async fn runs_in_the_configured_working_directory() {
    let dir = std::env::temp_dir();
    let mut session = LocalSession::with_cwd(&dir);
    let mut running = session.spawn("pwd").await.unwrap();
    let (stdout, _, code) = collect(&mut running).await;

    assert_eq!(code, 0);
    let reported = PathBuf::from(stdout.trim_end());
    assert_eq!(
        reported.canonicalize().unwrap(),
        dir.canonicalize().unwrap()
    );
}

#[tokio::test]
async fn closed_session_rejects_spawns() {
    let mut session = LocalSession::new();
    assert!(session.is_open());

    session.close().await.unwrap();
    assert!(!session.is_open());
    assert!(matches!(
        session.spawn("echo hi").await,
        Err(SessionError::Closed)
    ));
}

#[tokio::test]
async fn factory_ignores_the_remote_target() {
    let factory = LocalFactory::new();
    let options = ConnectOptions::new(
        "unreachable.invalid",
        "nobody",
        SessionCredential::new(Secret::new("pw")),
    );
    let mut session = factory.connect(&options).await.unwrap();
    let mut running = session.spawn("echo local").await.unwrap();
    let (stdout, _, code) = collect(&mut running).await;

    assert_eq!(stdout, "local\n");
    assert_eq!(code, 0);
}
