// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Workspace-level integration specs.
//!
//! These compose the real deploy engine with the in-memory relay and store
//! and run the command sequences through real local processes.

mod prelude;

mod deploy {
    mod credential;
    mod failure;
    mod stop;
    mod success;
}
