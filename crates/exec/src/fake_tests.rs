// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use sw_core::{Secret, SessionCredential};

async fn drain(running: &mut RunningCommand) -> (String, String, Option<i32>) {
    let mut stdout = String::new();
    let mut stderr = String::new();
    loop {
        match running.next_event().await {
            CommandEvent::Stdout(chunk) => stdout.push_str(&chunk),
            CommandEvent::Stderr(chunk) => stderr.push_str(&chunk),
            CommandEvent::Exited(code) => return (stdout, stderr, Some(code)),
            CommandEvent::Closed => return (stdout, stderr, None),
        }
    }
}

#[tokio::test]
async fn replays_scripted_output_and_exit() {
    let mut session = FakeSession::new(vec![ScriptedCommand::exiting(2)
        .stdout("out")
        .stderr("err")]);
    let mut running = session.spawn("deploy").await.unwrap();
    let (stdout, stderr, code) = drain(&mut running).await;

    assert_eq!(stdout, "out");
    assert_eq!(stderr, "err");
    assert_eq!(code, Some(2));
    assert_eq!(session.recorder().executed(), vec!["deploy"]);
}

#[tokio::test]
async fn commands_beyond_the_script_succeed_silently() {
    let mut session = FakeSession::new(vec![]);
    let mut running = session.spawn("anything").await.unwrap();
    let (stdout, stderr, code) = drain(&mut running).await;

    assert_eq!(stdout, "");
    assert_eq!(stderr, "");
    assert_eq!(code, Some(0));
}

#[tokio::test]
async fn closing_script_ends_without_an_exit_code() {
    let mut session = FakeSession::new(vec![ScriptedCommand::closing().stdout("partial")]);
    let mut running = session.spawn("cmd").await.unwrap();
    let (stdout, _, code) = drain(&mut running).await;

    assert_eq!(stdout, "partial");
    assert_eq!(code, None);
}

#[tokio::test]
async fn records_stdin_while_the_command_runs() {
    let mut session =
        FakeSession::new(vec![ScriptedCommand::succeeding()
            .delay(std::time::Duration::from_millis(200))]);
    let mut running = session.spawn("cmd").await.unwrap();

    running.send_stdin("secret123\n").await.unwrap();
    let (_, _, code) = drain(&mut running).await;

    assert_eq!(code, Some(0));
    assert_eq!(session.recorder().stdin_writes(), vec!["secret123\n"]);
}

#[tokio::test]
async fn factory_records_connect_options_and_shares_the_recorder() {
    let factory = FakeFactory::with_script(vec![ScriptedCommand::succeeding()]);
    let options = ConnectOptions::new("host", "user", SessionCredential::new(Secret::new("pw")))
        .forward_agent(false);

    let mut session = factory.connect(&options).await.unwrap();
    let mut running = session.spawn("cmd").await.unwrap();
    let _ = drain(&mut running).await;

    let recorded = factory.recorder().last_options().unwrap();
    assert_eq!(recorded.host, "host");
    assert!(!recorded.forward_agent);
    assert_eq!(factory.recorder().executed(), vec!["cmd"]);
}

#[tokio::test]
async fn failing_factory_rejects_connects() {
    let factory = FakeFactory::failing("host unreachable");
    let options = ConnectOptions::new("host", "user", SessionCredential::new(Secret::new("pw")));

    let err = factory.connect(&options).await.unwrap_err();
    assert!(matches!(err, SessionError::Connect(_)));
    assert!(err.to_string().contains("host unreachable"));
}
