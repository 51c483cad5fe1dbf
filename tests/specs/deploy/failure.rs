// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Failing-command specs: fail fast, explain on the channel, one terminal
//! transition.

use crate::prelude::*;

#[tokio::test]
async fn the_first_failing_command_halts_the_sequence() {
    let mut deploy = Deploy::start(&["ls /nonexistent/place", "echo \"hi\""]);

    deploy.send_passphrase("pw").await;
    let store = std::sync::Arc::clone(&deploy.store);
    let report = deploy.finish().await.unwrap();

    assert_eq!(report.outcome, DeployOutcome::Failed);
    assert_eq!(report.job.state, JobState::Failed);
    assert!(report.job.log.contains("**ERR"));
    assert!(report.job.log.contains("Failed to execute \"ls /nonexistent/place\""));
    // The second command never ran.
    assert!(!report.job.log.contains("hi\n"));

    let terminal = store
        .saved_states()
        .iter()
        .filter(|state| state.is_terminal())
        .count();
    assert_eq!(terminal, 1);
}

#[tokio::test]
async fn an_observer_always_sees_a_terminal_explanation() {
    let mut deploy = Deploy::start(&["exit 7"]);

    deploy.send_passphrase("pw").await;
    let line = deploy.next_line().await;
    assert_eq!(line, "**ERRFailed to execute \"exit 7\"");

    let report = deploy.finish().await.unwrap();
    assert_eq!(report.outcome, DeployOutcome::Failed);
}

#[tokio::test]
async fn a_nonexistent_program_fails_like_a_nonzero_exit() {
    let mut deploy = Deploy::start(&["definitely-not-a-real-program-xyz"]);

    deploy.send_passphrase("pw").await;
    let report = deploy.finish().await.unwrap();

    assert_eq!(report.outcome, DeployOutcome::Failed);
    assert!(report
        .job
        .log
        .contains("Failed to execute \"definitely-not-a-real-program-xyz\""));
}
