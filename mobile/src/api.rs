// SPDX-FileCopyrightText: 2025 Phoenix R&D GmbH <hello@phnx.im>
//
// SPDX-License-Identifier: AGPL-3.0-or-later

use std::panic::{self, AssertUnwindSafe};

use stackprobe::{RemainingStackReport, remaining_stack};
use tracing::error;

/// Text shown by hosts when the probe could not run.
pub const PROBE_FAILED: &str = "failed to get remaining stack";

/// Remaining stack of the calling thread as human readable text.
///
/// Estimated values are suffixed with `(estimated)`.
pub fn get_remaining_stack() -> String {
    match probe() {
        Some(report) => report.to_string(),
        None => PROBE_FAILED.to_owned(),
    }
}

/// Remaining stack of the calling thread as JSON object with the fields `remaining_bytes`
/// and `bounds_source`.
pub fn get_remaining_stack_json() -> Option<String> {
    let report = probe()?;
    serde_json::to_string(&report)
        .inspect_err(|error| error!(%error, "Failed to serialize stack report"))
        .ok()
}

/// Runs the probe without letting a panic unwind into the host.
pub(crate) fn probe() -> Option<RemainingStackReport> {
    panic::catch_unwind(AssertUnwindSafe(remaining_stack))
        .inspect_err(|payload| {
            let message = stackprobe::error::panic_message(&**payload);
            error!(%message, "Stack probe panicked");
        })
        .ok()
}
