// SPDX-FileCopyrightText: 2025 Phoenix R&D GmbH <hello@phnx.im>
//
// SPDX-License-Identifier: AGPL-3.0-or-later

use std::any::Any;

/// Errors of the helpers built on top of the probe.
///
/// The probe itself never fails; see [`crate::remaining_stack`].
#[derive(Debug, thiserror::Error)]
pub enum StackError {
    #[error("Remaining stack {remaining} is below redline of {redline} ({context})")]
    BelowRedline {
        remaining: usize,
        redline: usize,
        context: &'static str,
    },
    #[error("Failed to spawn thread with a stack of {stack_size} bytes")]
    Spawn {
        stack_size: usize,
        #[source]
        source: std::io::Error,
    },
    #[error("Thread with fresh stack panicked: {message}")]
    Panicked { message: String },
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum SettingsError {
    #[error("Probe settings are already installed")]
    AlreadyInstalled,
    #[error("Invalid probe settings: {0}")]
    Invalid(&'static str),
}

/// Extracts the message of a panic payload.
pub fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic payload".to_string()
    }
}
