// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Cooperative cancellation specs.

use crate::prelude::*;
use std::time::{Duration, Instant};

#[tokio::test]
async fn stop_abandons_a_long_running_command() {
    let mut deploy = Deploy::start(&["sleep 30", "echo after"]);

    deploy.send_passphrase("pw").await;
    // Give the command time to start before requesting the stop.
    tokio::time::sleep(Duration::from_millis(200)).await;

    let started = Instant::now();
    deploy.handle.stop();
    let report = deploy.finish().await.unwrap();

    assert!(started.elapsed() < Duration::from_secs(5));
    assert_eq!(report.outcome, DeployOutcome::Stopped);
    assert_eq!(report.job.state, JobState::Failed);
    assert!(report.job.log.contains("Failed to execute \"sleep 30\""));
    assert!(report.job.log.ends_with("Deploy stopped.\n"));
    assert!(!report.job.log.contains("after"));
}

#[tokio::test]
async fn stop_before_the_passphrase_arrives() {
    let mut deploy = Deploy::start(&["echo never"]);

    let prompt = deploy.next_line().await;
    assert_eq!(prompt, "Please enter your passphrase:");
    deploy.handle.stop();

    assert_eq!(deploy.next_line().await, "Deploy stopped.");
    let report = deploy.finish().await.unwrap();

    assert_eq!(report.outcome, DeployOutcome::Stopped);
    assert_eq!(report.job.state, JobState::Failed);
    assert!(!report.job.log.contains("never"));
}

#[tokio::test]
async fn stop_is_idempotent_and_safe_after_the_run() {
    let mut deploy = Deploy::start(&["echo hi"]);
    let handle = deploy.handle.clone();

    deploy.send_passphrase("pw").await;
    let report = deploy.finish().await.unwrap();
    assert_eq!(report.outcome, DeployOutcome::Succeeded);

    // The run is over; these only trip an already-dead flag.
    handle.stop();
    handle.stop();
    assert!(handle.is_stop_requested());
}
