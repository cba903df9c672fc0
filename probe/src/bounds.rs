// SPDX-FileCopyrightText: 2025 Phoenix R&D GmbH <hello@phnx.im>
//
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Per-thread stack bounds, resolved once and cached for the thread's lifetime.

use std::cell::Cell;

use serde::Serialize;
use tracing::{debug, warn};

use crate::{
    platform::{
        Platform, PlatformStack, STACK_GROWTH, StackIntrospection, current_stack_pointer,
    },
    settings::ProbeSettings,
};

thread_local! {
    static BOUNDS: Cell<Option<StackBounds>> = const { Cell::new(None) };
}

/// Where a [`StackBounds`] value comes from.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, strum::Display, strum::AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum BoundsSource {
    /// Reported by the platform and passed the plausibility checks.
    Precise,
    /// Assumed from [`ProbeSettings::estimated_stack_size`]; a lower bound only.
    Estimated,
}

/// Address range of one thread's stack plus the guard region beyond its limit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StackBounds {
    base: usize,
    limit: usize,
    guard_size: usize,
    source: BoundsSource,
}

impl StackBounds {
    /// Address the stack starts growing from.
    pub fn base(&self) -> usize {
        self.base
    }

    /// Address the stack must not grow past.
    pub fn limit(&self) -> usize {
        self.limit
    }

    /// Bytes in front of `limit` that are never reported as usable.
    pub fn guard_size(&self) -> usize {
        self.guard_size
    }

    pub fn source(&self) -> BoundsSource {
        self.source
    }

    /// Total size of the stack range.
    pub fn size(&self) -> usize {
        self.base.abs_diff(self.limit)
    }

    /// Returns whether `sp` lies between base and limit (inclusive).
    pub fn contains(&self, sp: usize) -> bool {
        self.base.min(self.limit) <= sp && sp <= self.base.max(self.limit)
    }

    pub(crate) const fn new(
        base: usize,
        limit: usize,
        guard_size: usize,
        source: BoundsSource,
    ) -> Self {
        Self {
            base,
            limit,
            guard_size,
            source,
        }
    }

    fn precise(stack: PlatformStack, settings: &ProbeSettings) -> Self {
        Self::new(
            stack.base,
            stack.limit,
            stack.guard_size.max(settings.min_guard_size),
            BoundsSource::Precise,
        )
    }

    /// Conservative bounds anchored at `sp`.
    pub fn estimated(sp: usize, settings: &ProbeSettings) -> Self {
        Self::new(
            sp,
            STACK_GROWTH.advance(sp, settings.estimated_stack_size),
            settings.min_guard_size,
            BoundsSource::Estimated,
        )
    }
}

/// Returns the stack bounds of the calling thread.
///
/// The platform is queried on the first call per thread only; the result is cached in
/// thread-local storage. This never fails: unusable platform data yields
/// [`BoundsSource::Estimated`] bounds.
pub fn resolve_bounds() -> StackBounds {
    cached_or_resolve(|| resolve_uncached(&Platform, ProbeSettings::global()))
}

fn cached_or_resolve(resolve: impl FnOnce() -> StackBounds) -> StackBounds {
    if let Some(bounds) = BOUNDS.try_with(Cell::get).ok().flatten() {
        return bounds;
    }
    let bounds = resolve();
    // Fails only while the thread-local storage is torn down; the bounds stay uncached then.
    let _ = BOUNDS.try_with(|slot| slot.set(Some(bounds)));
    bounds
}

/// Replaces the calling thread's cached bounds until dropped, then restores the previous value.
///
/// Used while the thread runs on a stack segment other than its own.
pub(crate) struct SwappedBounds {
    previous: Option<StackBounds>,
}

impl SwappedBounds {
    pub(crate) fn install(bounds: StackBounds) -> Self {
        let previous = BOUNDS.try_with(|slot| slot.replace(Some(bounds))).ok().flatten();
        Self { previous }
    }
}

impl Drop for SwappedBounds {
    fn drop(&mut self) {
        let _ = BOUNDS.try_with(|slot| slot.set(self.previous));
    }
}

/// Queries `introspection` for the calling thread's stack and validates the result.
///
/// Does not touch the per-thread cache.
pub fn resolve_uncached(
    introspection: &impl StackIntrospection,
    settings: &ProbeSettings,
) -> StackBounds {
    let sp = current_stack_pointer();
    let Some(stack) = introspection.current_thread_stack() else {
        warn!(
            estimated_stack_size = settings.estimated_stack_size,
            "Platform reported no stack bounds, estimating"
        );
        return StackBounds::estimated(sp, settings);
    };

    match check_plausible(&stack, sp, settings) {
        Ok(()) => {
            let bounds = StackBounds::precise(stack, settings);
            debug!(
                base = bounds.base,
                limit = bounds.limit,
                guard_size = bounds.guard_size,
                "Resolved stack bounds"
            );
            bounds
        }
        Err(reason) => {
            warn!(
                reason,
                base = stack.base,
                limit = stack.limit,
                sp,
                estimated_stack_size = settings.estimated_stack_size,
                "Implausible stack bounds, estimating"
            );
            StackBounds::estimated(sp, settings)
        }
    }
}

fn check_plausible(
    stack: &PlatformStack,
    sp: usize,
    settings: &ProbeSettings,
) -> Result<(), &'static str> {
    if !STACK_GROWTH.is_ordered(stack.base, stack.limit) {
        return Err("base and limit are out of order");
    }
    if stack.base.abs_diff(stack.limit) < settings.min_plausible_stack_size {
        return Err("stack is smaller than the minimum plausible size");
    }
    let (low, high) = (stack.base.min(stack.limit), stack.base.max(stack.limit));
    if sp < low || sp > high {
        return Err("stack pointer lies outside of the reported range");
    }
    Ok(())
}
