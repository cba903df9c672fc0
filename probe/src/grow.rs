// SPDX-FileCopyrightText: 2025 Phoenix R&D GmbH <hello@phnx.im>
//
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Guards for recursive code: fail early on a low stack, or continue on a fresh one.

use std::thread;

use tracing::{error, info};

use crate::{
    bounds::{BoundsSource, StackBounds, SwappedBounds},
    error::{StackError, panic_message},
    estimate::remaining_stack,
    platform::{STACK_GROWTH, current_stack_pointer},
    settings::ProbeSettings,
};

/// Name of the threads spawned by [`run_on_new_stack`].
pub const GROW_THREAD_NAME: &str = "stackprobe-grow";

/// Checks that more than `redline` bytes of stack are left.
///
/// `context` can be anything that helps to find where the redline was hit without resorting
/// to backtraces. Returns the remaining bytes on success.
#[inline]
pub fn check_redline(redline: usize, context: &'static str) -> Result<usize, StackError> {
    let remaining = remaining_stack().remaining_bytes;
    if remaining <= redline {
        return Err(StackError::BelowRedline {
            remaining,
            redline,
            context,
        });
    }
    Ok(remaining)
}

/// Runs `f` on the current thread if at least `red_zone` bytes of stack are left, otherwise on
/// a freshly allocated stack segment of `stack_size` bytes, see [`grow`].
#[inline]
pub fn maybe_grow<F, R>(red_zone: usize, stack_size: usize, f: F) -> R
where
    F: FnOnce() -> R,
{
    let report = remaining_stack();
    if report.remaining_bytes >= red_zone {
        return f();
    }
    info!(
        remaining_bytes = report.remaining_bytes,
        red_zone, stack_size, "Continuing on a fresh stack segment"
    );
    grow(stack_size, f)
}

/// Runs `f` on a new stack segment of `stack_size` bytes without leaving the calling thread.
///
/// Thread-locals and the thread identity stay the same. While `f` runs, [`remaining_stack`] and
/// [`crate::resolve_bounds`] describe the segment; the thread's own bounds are restored when
/// `f` returns or unwinds.
pub fn grow<F, R>(stack_size: usize, f: F) -> R
where
    F: FnOnce() -> R,
{
    stacker::grow(stack_size, || {
        let _swap = SwappedBounds::install(segment_bounds(stack_size));
        f()
    })
}

/// Bounds of the segment the caller currently runs on, anchored at the stack pointer.
fn segment_bounds(stack_size: usize) -> StackBounds {
    let sp = current_stack_pointer();
    let guard_size = ProbeSettings::global().min_guard_size;
    match stacker::remaining_stack() {
        Some(remaining) => StackBounds::new(
            sp,
            STACK_GROWTH.advance(sp, remaining.min(stack_size)),
            guard_size,
            BoundsSource::Precise,
        ),
        None => StackBounds::new(
            sp,
            STACK_GROWTH.advance(sp, stack_size),
            guard_size,
            BoundsSource::Estimated,
        ),
    }
}

/// Runs `f` on a new thread with a stack of `stack_size` bytes and waits for its result.
///
/// Unlike [`grow`], `f` sees the thread-locals of the spawned thread, not the caller's.
/// A panic in `f` is caught and returned as [`StackError::Panicked`].
pub fn run_on_new_stack<F, R>(stack_size: usize, f: F) -> Result<R, StackError>
where
    F: FnOnce() -> R + Send,
    R: Send,
{
    thread::scope(|scope| {
        let handle = thread::Builder::new()
            .name(GROW_THREAD_NAME.to_owned())
            .stack_size(stack_size)
            .spawn_scoped(scope, f)
            .map_err(|source| {
                error!(%source, stack_size, "Failed to spawn thread with fresh stack");
                StackError::Spawn { stack_size, source }
            })?;
        handle.join().map_err(|payload| {
            let message = panic_message(&*payload);
            error!(%message, "Thread with fresh stack panicked");
            StackError::Panicked { message }
        })
    })
}
