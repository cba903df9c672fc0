// SPDX-FileCopyrightText: 2025 Phoenix R&D GmbH <hello@phnx.im>
//
// SPDX-License-Identifier: AGPL-3.0-or-later

use std::hint::black_box;

use serde_json::json;
use stackprobe::{ProbeSettings, RemainingStackReport, check_redline, remaining_stack, stack_size};
use tracing::warn;

use crate::args::Command;

/// Granularity of the stack held by each `descend` frame.
const CHUNK_SIZE: usize = 1024;

/// Runs `cmd` on the calling thread and returns the lines to print.
pub fn run_command(cmd: &Command, json: bool) -> Vec<String> {
    match cmd {
        Command::Report => {
            let report = remaining_stack();
            vec![render(&report, None, json)]
        }
        Command::Descend {
            depth,
            step,
            frame_size,
        } => {
            let descent = Descent {
                max_depth: *depth,
                step: (*step).max(1),
                chunks: frame_size.div_ceil(CHUNK_SIZE).max(1),
                json,
            };
            let mut lines = Vec::new();
            descent.run(0, &mut lines);
            lines
        }
    }
}

fn render(report: &RemainingStackReport, depth: Option<usize>, json: bool) -> String {
    match (json, depth) {
        (true, None) => json!({
            "remaining_bytes": report.remaining_bytes,
            "bounds_source": report.bounds_source,
            "stack_size": stack_size(),
        })
        .to_string(),
        (true, Some(depth)) => json!({
            "depth": depth,
            "remaining_bytes": report.remaining_bytes,
            "bounds_source": report.bounds_source,
        })
        .to_string(),
        (false, None) => format!("{report}, stack size: {} bytes", stack_size()),
        (false, Some(depth)) => format!("depth {depth}: {report}"),
    }
}

struct Descent {
    max_depth: usize,
    step: usize,
    /// Stack held per frame, in units of [`CHUNK_SIZE`]
    chunks: usize,
    json: bool,
}

impl Descent {
    fn frame_size(&self) -> usize {
        self.chunks * CHUNK_SIZE
    }

    fn run(&self, depth: usize, lines: &mut Vec<String>) {
        hold_chunks(self.chunks, &mut || self.visit(depth, lines));
    }

    fn visit(&self, depth: usize, lines: &mut Vec<String>) {
        if depth % self.step == 0 || depth == self.max_depth {
            lines.push(render(&remaining_stack(), Some(depth), self.json));
        }
        if depth < self.max_depth {
            // Leave room for the next frame on top of the configured redline
            let redline = ProbeSettings::global().default_redline + self.frame_size();
            match check_redline(redline, "descend") {
                Ok(_) => self.run(depth + 1, lines),
                Err(error) => {
                    warn!(%error, depth, "Stopping descent");
                    lines.push(format!("stopped at depth {depth}: {error}"));
                }
            }
        }
    }
}

/// Keeps `chunks` blocks of [`CHUNK_SIZE`] bytes on the stack while `f` runs.
#[inline(never)]
fn hold_chunks(chunks: usize, f: &mut dyn FnMut()) {
    let chunk = [0u8; CHUNK_SIZE];
    black_box(&chunk);
    if chunks > 1 {
        hold_chunks(chunks - 1, f);
    } else {
        f();
    }
    black_box(&chunk);
}
