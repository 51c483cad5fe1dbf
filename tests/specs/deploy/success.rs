// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Happy-path deploy specs over real local processes.

use crate::prelude::*;

#[tokio::test]
async fn streams_every_line_to_observers_in_order() {
    let mut deploy = Deploy::start(&["echo \"hi\"", "echo \"hello\""]);

    deploy.send_passphrase("pw").await;
    assert_eq!(deploy.next_line().await, "hi");
    assert_eq!(deploy.next_line().await, "hello");

    let report = deploy.finish().await.unwrap();
    assert_eq!(report.outcome, DeployOutcome::Succeeded);
    assert_eq!(report.job.state, JobState::Succeeded);
    assert!(report.job.log.ends_with("hi\nhello\n"));
}

#[tokio::test]
async fn persists_the_finished_job_with_its_log() {
    let deploy = Deploy::start(&["echo done"]);
    let store = std::sync::Arc::clone(&deploy.store);
    let job_id = deploy.job.id.clone();

    let mut deploy = deploy;
    deploy.send_passphrase("pw").await;
    deploy.finish().await.unwrap();

    let saved = store.get(&job_id).unwrap();
    assert_eq!(saved.state, JobState::Succeeded);
    assert!(saved.log.contains("done\n"));

    // The persisted record round-trips.
    let json = serde_json::to_string(&saved).unwrap();
    assert!(json.contains("\"succeeded\""));
    let back: sw_core::Job = serde_json::from_str(&json).unwrap();
    assert_eq!(back, saved);
}

#[tokio::test]
async fn commands_run_in_the_session_working_directory() {
    let dir = tempfile::tempdir().unwrap();
    let mut deploy = Deploy::start_in(&["touch deployed.marker"], Some(dir.path()));

    deploy.send_passphrase("pw").await;
    let report = deploy.finish().await.unwrap();

    assert_eq!(report.outcome, DeployOutcome::Succeeded);
    assert!(dir.path().join("deployed.marker").exists());
}

#[tokio::test]
async fn stderr_lines_are_marked_but_do_not_fail_the_run() {
    let mut deploy = Deploy::start(&["echo warning >&2", "echo ok"]);

    deploy.send_passphrase("pw").await;
    assert_eq!(deploy.next_line().await, "**ERRwarning");
    assert_eq!(deploy.next_line().await, "ok");

    let report = deploy.finish().await.unwrap();
    assert_eq!(report.outcome, DeployOutcome::Succeeded);
}
