// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The fixed deploy command sequence.

use sw_core::Job;

/// The four-step sequence run against the target for one job.
///
/// Templates are literal for behavioral compatibility with the deploy tool on
/// the target. This function is the single substitution point: environment
/// and commit are passed through verbatim with no shell escaping, so anything
/// hardening those values belongs here, not in the executor.
pub fn deploy_commands(job: &Job) -> Vec<String> {
    vec![
        format!("cd {}", parameterize(&job.project)),
        "git fetch -ap".to_string(),
        format!("git reset --hard {}", job.commit),
        format!("capsu {} deploy TAG={}", job.environment, job.commit),
    ]
}

/// Reduce a project name to the filesystem-safe token naming its checkout
/// directory: lowercased alphanumeric runs joined by underscores.
pub fn parameterize(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut pending_sep = false;
    for ch in name.chars() {
        if ch.is_ascii_alphanumeric() {
            if pending_sep && !out.is_empty() {
                out.push('_');
            }
            pending_sep = false;
            out.push(ch.to_ascii_lowercase());
        } else {
            pending_sep = true;
        }
    }
    out
}

#[cfg(test)]
#[path = "commands_tests.rs"]
mod tests;
