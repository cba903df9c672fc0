// SPDX-FileCopyrightText: 2025 Phoenix R&D GmbH <hello@phnx.im>
//
// SPDX-License-Identifier: AGPL-3.0-or-later

use std::fmt;

use serde::Serialize;

use crate::{
    bounds::{BoundsSource, StackBounds, resolve_bounds},
    platform::{GrowthDirection, STACK_GROWTH, current_stack_pointer},
};

/// Stack capacity left on a thread at the time of measurement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct RemainingStackReport {
    /// Usable bytes before the guard region is reached
    pub remaining_bytes: usize,
    /// If [`BoundsSource::Estimated`], `remaining_bytes` is a lower bound only.
    pub bounds_source: BoundsSource,
}

impl RemainingStackReport {
    /// Measures the distance from `sp` to the guard region of `bounds`.
    pub fn measure(bounds: &StackBounds, sp: usize) -> Self {
        Self {
            remaining_bytes: remaining_bytes(bounds, sp, STACK_GROWTH),
            bounds_source: bounds.source(),
        }
    }

    pub fn is_estimated(&self) -> bool {
        self.bounds_source == BoundsSource::Estimated
    }
}

impl fmt::Display for RemainingStackReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "remaining stack: {} bytes", self.remaining_bytes)?;
        if self.is_estimated() {
            f.write_str(" (estimated)")?;
        }
        Ok(())
    }
}

fn remaining_bytes(bounds: &StackBounds, sp: usize, direction: GrowthDirection) -> usize {
    let guard_size = bounds.guard_size();
    let Some(distance) = direction.distance_to_limit(sp, bounds.limit()) else {
        return 0;
    };
    distance
        .saturating_sub(guard_size)
        .min(bounds.size().saturating_sub(guard_size))
}

/// Measures the stack capacity left on the calling thread.
///
/// Resolves and caches the thread's bounds on first use; afterwards this is a thread-local
/// lookup plus arithmetic without allocations or locks, so it stays usable on a nearly
/// exhausted stack. It never fails. A result of `0` means the caller is already within the
/// guard margin.
#[inline]
pub fn remaining_stack() -> RemainingStackReport {
    let bounds = resolve_bounds();
    RemainingStackReport::measure(&bounds, current_stack_pointer())
}

/// Total stack size of the calling thread.
pub fn stack_size() -> usize {
    resolve_bounds().size()
}
