// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Control signal observed by the executor between scheduler cycles.

/// Verdict of one control tick.
///
/// The executor asks for one of these on every cycle while a command runs;
/// `Stop` abandons the current command and the rest of the sequence, `Input`
/// forwards a value to the running command's stdin.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Control {
    Continue,
    Stop,
    Input(String),
}

impl Control {
    pub fn is_stop(&self) -> bool {
        matches!(self, Control::Stop)
    }
}

crate::simple_display! {
    Control {
        Continue => "continue",
        Stop => "stop",
        Input(..) => "input",
    }
}

#[cfg(test)]
#[path = "control_tests.rs"]
mod tests;
