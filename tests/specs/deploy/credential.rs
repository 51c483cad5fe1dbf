// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Credential handshake specs.

use crate::prelude::*;
use sw_relay::Relay as _;

#[tokio::test]
async fn the_prompt_is_published_before_any_command_runs() {
    let mut deploy = Deploy::start(&["echo started"]);

    // First broadcast line is always the prompt.
    assert_eq!(deploy.next_line().await, "Please enter your passphrase:");
    deploy
        .relay
        .put_input(&deploy.job.channel, "pw")
        .await
        .unwrap();

    assert_eq!(deploy.next_line().await, "started");
    deploy.finish().await.unwrap();
}

#[tokio::test]
async fn the_passphrase_is_consumed_exactly_once() {
    let mut deploy = Deploy::start(&["true"]);
    let relay = std::sync::Arc::clone(&deploy.relay);
    let channel = deploy.job.channel.clone();

    deploy.send_passphrase("secret123").await;
    let report = deploy.finish().await.unwrap();

    assert_eq!(report.outcome, DeployOutcome::Succeeded);
    // The mailbox is empty again; nothing is left to leak or replay.
    assert_eq!(relay.take_input(&channel).await.unwrap(), None);
}

#[tokio::test]
async fn the_passphrase_never_appears_in_log_or_broadcast() {
    let mut deploy = Deploy::start(&["echo hi"]);
    let observer = deploy.observer.clone();

    deploy.send_passphrase("hunter2").await;
    let report = deploy.finish().await.unwrap();

    assert!(!report.job.log.contains("hunter2"));
    assert!(observer.lines().iter().all(|line| !line.contains("hunter2")));
}

#[tokio::test]
async fn a_prompt_answer_waits_in_the_mailbox_until_polled() {
    let deploy = Deploy::start(&["true"]);
    let relay = std::sync::Arc::clone(&deploy.relay);
    let channel = deploy.job.channel.clone();

    // Stored before the session polls; overwritten before it is read.
    relay.put_input(&channel, "first").await.unwrap();
    relay.put_input(&channel, "second").await.unwrap();

    let report = deploy.finish().await.unwrap();
    assert_eq!(report.outcome, DeployOutcome::Succeeded);
}
