// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Session credential material: a redacted passphrase plus optional key and
//! agent socket.

use std::path::PathBuf;

/// Secret string with redacted `Debug` and `Display` output.
///
/// The passphrase passes near config, tracing, and error chains; the wrapper
/// keeps an accidental `{:?}` from leaking it. [`expose`](Secret::expose) is
/// the only way at the value, so call sites are the audit surface.
#[derive(Clone, PartialEq, Eq)]
pub struct Secret(String);

impl Secret {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn expose(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl std::fmt::Debug for Secret {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("Secret(****)")
    }
}

impl std::fmt::Display for Secret {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("****")
    }
}

impl From<&str> for Secret {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for Secret {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// Everything needed to authenticate one remote session.
///
/// Built after the credential handshake, handed to the session factory,
/// dropped when the session ends. Never persisted. The agent socket is an
/// explicit field here rather than process environment so concurrent sessions
/// cannot observe each other's agents.
#[derive(Debug, Clone)]
pub struct SessionCredential {
    /// Operator-supplied passphrase: decrypts the key material when present,
    /// otherwise serves as the login password.
    pub passphrase: Secret,
    /// PEM-encoded private key material.
    pub key_data: Option<String>,
    /// Unix socket of a running credential agent, resolved to its real path.
    pub agent_socket: Option<PathBuf>,
}

impl SessionCredential {
    pub fn new(passphrase: Secret) -> Self {
        Self {
            passphrase,
            key_data: None,
            agent_socket: None,
        }
    }

    crate::setters! {
        option {
            key_data: String,
            agent_socket: PathBuf,
        }
    }
}

#[cfg(test)]
#[path = "credential_tests.rs"]
mod tests;
