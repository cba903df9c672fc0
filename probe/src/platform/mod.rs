// SPDX-FileCopyrightText: 2025 Phoenix R&D GmbH <hello@phnx.im>
//
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Build-time selection of the facility used to discover a thread's stack.
//!
//! Every supported target family provides one implementation of
//! [`StackIntrospection`], exported as [`Platform`]. Targets without a known
//! facility get [`Platform`] that reports nothing, which makes the resolver
//! fall back to estimated bounds.

#[cfg(target_vendor = "apple")]
mod apple;
#[cfg(target_os = "freebsd")]
mod freebsd;
#[cfg(any(target_os = "linux", target_os = "android"))]
mod linux;
#[cfg(not(any(
    target_os = "linux",
    target_os = "android",
    target_vendor = "apple",
    target_os = "freebsd"
)))]
mod unsupported;

#[cfg(target_vendor = "apple")]
pub use apple::Apple as Platform;
#[cfg(target_os = "freebsd")]
pub use freebsd::FreeBsd as Platform;
#[cfg(any(target_os = "linux", target_os = "android"))]
pub use linux::Linux as Platform;
#[cfg(not(any(
    target_os = "linux",
    target_os = "android",
    target_vendor = "apple",
    target_os = "freebsd"
)))]
pub use unsupported::Unsupported as Platform;

/// Stack range of the calling thread as reported by the platform.
///
/// No plausibility checks have been applied yet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlatformStack {
    /// Address the stack starts growing from.
    pub base: usize,
    /// Address the stack must not grow past.
    pub limit: usize,
    /// Size of the guard region reserved beyond `limit`.
    pub guard_size: usize,
}

/// Stack introspection capability of a target platform.
#[cfg_attr(test, mockall::automock)]
pub trait StackIntrospection {
    /// Queries the stack range of the calling thread.
    ///
    /// Returns `None` if the platform has no such facility or the query failed.
    fn current_thread_stack(&self) -> Option<PlatformStack>;
}

/// Direction in which a thread's stack grows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GrowthDirection {
    /// Towards lower addresses: `limit < base`.
    Downward,
    /// Towards higher addresses: `base < limit`.
    Upward,
}

/// Growth direction of the build target.
///
/// All targets supported by Rust grow their stacks towards lower addresses.
pub const STACK_GROWTH: GrowthDirection = GrowthDirection::Downward;

impl GrowthDirection {
    /// Bytes between `sp` and `limit` that the stack can still grow into.
    ///
    /// Returns `None` if `sp` already lies beyond `limit`.
    pub const fn distance_to_limit(self, sp: usize, limit: usize) -> Option<usize> {
        match self {
            Self::Downward => sp.checked_sub(limit),
            Self::Upward => limit.checked_sub(sp),
        }
    }

    /// Returns whether `base` and `limit` are ordered consistently with this direction.
    pub const fn is_ordered(self, base: usize, limit: usize) -> bool {
        match self {
            Self::Downward => limit < base,
            Self::Upward => base < limit,
        }
    }

    /// Moves `from` by `len` bytes in the growth direction, saturating at the address space
    /// bounds.
    pub const fn advance(self, from: usize, len: usize) -> usize {
        match self {
            Self::Downward => from.saturating_sub(len),
            Self::Upward => from.saturating_add(len),
        }
    }
}

/// Returns the current stack position of the calling thread.
///
/// Reads the address of a one-byte local, so the read itself needs no stack beyond the
/// caller's frame.
#[inline(always)]
pub fn current_stack_pointer() -> usize {
    let marker = 0u8;
    std::hint::black_box(&marker) as *const u8 as usize
}

/// Page size of the running system, used where the platform does not report a guard size.
#[cfg(any(target_vendor = "apple", test))]
#[cfg(unix)]
pub(crate) fn page_size() -> usize {
    // SAFETY: `sysconf` has no preconditions.
    let size = unsafe { libc::sysconf(libc::_SC_PAGESIZE) };
    usize::try_from(size).ok().filter(|&size| size > 0).unwrap_or(4096)
}
