// SPDX-FileCopyrightText: 2025 Phoenix R&D GmbH <hello@phnx.im>
//
// SPDX-License-Identifier: AGPL-3.0-or-later

use std::{
    hint::black_box,
    sync::{Arc, Barrier},
    thread,
};

use stackprobe::{
    BoundsSource, ProbeSettings, RemainingStackReport, StackBounds,
    bounds::resolve_uncached,
    grow, maybe_grow,
    platform::{PlatformStack, StackIntrospection, current_stack_pointer},
    remaining_stack, resolve_bounds,
};

const KIB: usize = 1024;
const MIB: usize = 1024 * KIB;

fn on_thread<R: Send + 'static>(stack_size: usize, f: impl FnOnce() -> R + Send + 'static) -> R {
    thread::Builder::new()
        .stack_size(stack_size)
        .spawn(f)
        .unwrap()
        .join()
        .unwrap()
}

/// Recurses with frames of at least `FRAME` bytes until `consumed` bytes of the reported
/// capacity are used up, or the report drops below `floor`.
#[inline(never)]
fn descend<const FRAME: usize>(start: usize, consumed: usize, floor: usize) -> RemainingStackReport {
    let frame = [0u8; FRAME];
    black_box(&frame);
    let report = remaining_stack();
    let done = start.saturating_sub(report.remaining_bytes) >= consumed
        || report.remaining_bytes < floor;
    let report = if done {
        report
    } else {
        descend::<FRAME>(start, consumed, floor)
    };
    // Keeps the frame alive across the recursive call
    black_box(&frame);
    report
}

/// Recurses until no capacity is reported left; returns the depth reached.
#[inline(never)]
fn descend_to_zero(depth: usize) -> usize {
    let frame = [0u8; 512];
    black_box(&frame);
    let depth = if remaining_stack().remaining_bytes == 0 {
        depth
    } else {
        descend_to_zero(depth + 1)
    };
    black_box(&frame);
    depth
}

/// Reports at `depth` successive frames.
#[inline(never)]
fn reports_by_depth(depth: usize, reports: &mut Vec<RemainingStackReport>) {
    let frame = [0u8; KIB];
    black_box(&frame);
    reports.push(remaining_stack());
    if depth > 0 {
        reports_by_depth(depth - 1, reports);
    }
    black_box(&frame);
}

#[cfg(any(
    target_os = "linux",
    target_os = "android",
    target_vendor = "apple",
    target_os = "freebsd"
))]
#[test]
fn bounds_are_precise_on_supported_platforms() {
    assert_eq!(remaining_stack().bounds_source, BoundsSource::Precise);
    let report = on_thread(MIB, remaining_stack);
    assert_eq!(report.bounds_source, BoundsSource::Precise);
}

/// The platform may hand out a reused stack larger than requested, so the expectations are
/// derived from the reported size.
fn assert_at_least_requested(bounds: &StackBounds, requested: usize) {
    assert!(
        bounds.size() + bounds.guard_size() >= requested,
        "stack of {} bytes is smaller than the requested {requested}",
        bounds.size()
    );
}

#[test]
fn fresh_thread_reports_close_to_its_stack_size() {
    let (report, bounds) = on_thread(MIB, || (remaining_stack(), resolve_bounds()));
    if report.bounds_source == BoundsSource::Estimated {
        return;
    }
    assert_at_least_requested(&bounds, MIB);
    let usable = bounds.size() - bounds.guard_size();
    assert!(report.remaining_bytes <= usable);
    assert!(
        report.remaining_bytes >= usable - 96 * KIB,
        "remaining {} of {usable} usable bytes at thread start",
        report.remaining_bytes
    );
}

#[test]
fn reused_thread_stack_is_reported_as_is() {
    // A finished thread with a bigger stack leaves it in the platform's cache
    on_thread(4 * MIB, || black_box(remaining_stack()));
    let (report, bounds) = on_thread(512 * KIB, || (remaining_stack(), resolve_bounds()));
    if report.bounds_source == BoundsSource::Estimated {
        return;
    }
    assert_at_least_requested(&bounds, 512 * KIB);
    assert!(report.remaining_bytes <= bounds.size() - bounds.guard_size());
    assert!(bounds.contains(bounds.base()));
}

#[test]
fn deep_recursion_consumes_reported_capacity() {
    let (start, deep, bounds) = on_thread(MIB, || {
        let start = remaining_stack();
        let deep = descend::<{ 2 * KIB }>(start.remaining_bytes, 900 * KIB, 8 * KIB);
        (start, deep, resolve_bounds())
    });
    if start.bounds_source == BoundsSource::Estimated {
        return;
    }
    let consumed = start.remaining_bytes - deep.remaining_bytes;
    assert!(consumed >= 900 * KIB, "consumed only {consumed} bytes");
    assert!(deep.remaining_bytes > 0);
    assert!(deep.remaining_bytes + 900 * KIB <= bounds.size() - bounds.guard_size());
}

#[test]
fn remaining_decreases_with_depth() {
    let reports = on_thread(512 * KIB, || {
        let mut reports = Vec::with_capacity(32);
        reports_by_depth(31, &mut reports);
        reports
    });
    for pair in reports.windows(2) {
        assert!(
            pair[1].remaining_bytes < pair[0].remaining_bytes,
            "{} is not below {}",
            pair[1].remaining_bytes,
            pair[0].remaining_bytes
        );
        assert!(pair[0].remaining_bytes - pair[1].remaining_bytes >= KIB);
    }
}

#[test]
fn consecutive_calls_at_same_depth_agree() {
    on_thread(256 * KIB, || {
        let first = remaining_stack();
        let second = remaining_stack();
        assert_eq!(first.bounds_source, second.bounds_source);
        assert!(first.remaining_bytes.abs_diff(second.remaining_bytes) < 256);
    });
}

#[test]
fn zero_is_reported_before_overflow() {
    let depth = on_thread(256 * KIB, || descend_to_zero(0));
    assert!(depth > 0);
}

#[test]
fn zero_is_reported_before_overflow_on_grown_segment() {
    let (depth, bounds_after) = on_thread(256 * KIB, || {
        let own = resolve_bounds();
        let depth = grow(512 * KIB, || descend_to_zero(0));
        (depth, resolve_bounds() == own)
    });
    assert!(depth > 0);
    assert!(bounds_after);
}

/// Sums `1..=n` recursively with 1 KiB frames, continuing on fresh segments as needed.
#[inline(never)]
fn grown_sum(n: u64) -> u64 {
    let frame = [0u8; KIB];
    black_box(&frame);
    let sum = if n == 0 {
        0
    } else {
        n + maybe_grow(64 * KIB, MIB, || grown_sum(n - 1))
    };
    black_box(&frame);
    sum
}

#[test]
fn maybe_grow_extends_recursion_past_thread_stack() {
    // About 4 MiB of frames on a 128 KiB thread
    let sum = on_thread(128 * KIB, || grown_sum(4000));
    assert_eq!(sum, 4000 * 4001 / 2);
}

#[test]
fn concurrent_threads_are_independent() {
    const THREADS: usize = 16;
    let barrier = Arc::new(Barrier::new(THREADS));
    let handles: Vec<_> = (0..THREADS)
        .map(|i| {
            let barrier = barrier.clone();
            let stack_size = 256 * KIB + i * 64 * KIB;
            thread::Builder::new()
                .stack_size(stack_size)
                .spawn(move || {
                    barrier.wait();
                    let bounds = resolve_bounds();
                    for _ in 0..1000 {
                        assert_eq!(resolve_bounds(), bounds);
                        let report = remaining_stack();
                        assert!(report.remaining_bytes <= bounds.size());
                        if bounds.source() == BoundsSource::Precise {
                            assert!(bounds.contains(current_stack_pointer()));
                        }
                    }
                    if bounds.source() == BoundsSource::Precise {
                        assert_at_least_requested(&bounds, stack_size);
                    }
                    bounds
                })
                .unwrap()
        })
        .collect();
    let bounds: Vec<StackBounds> = handles.into_iter().map(|h| h.join().unwrap()).collect();

    let mut ranges: Vec<(usize, usize)> = bounds
        .iter()
        .map(|b| (b.base().min(b.limit()), b.base().max(b.limit())))
        .collect();
    ranges.sort_unstable();
    for pair in ranges.windows(2) {
        assert!(pair[0].1 <= pair[1].0, "overlapping stacks: {pair:?}");
    }
}

struct Unavailable;

impl StackIntrospection for Unavailable {
    fn current_thread_stack(&self) -> Option<PlatformStack> {
        None
    }
}

struct Garbage;

impl StackIntrospection for Garbage {
    fn current_thread_stack(&self) -> Option<PlatformStack> {
        Some(PlatformStack {
            base: 0x1000,
            limit: 0x2000,
            guard_size: usize::MAX,
        })
    }
}

#[test]
fn failing_platform_query_falls_back_to_estimate() {
    let settings = ProbeSettings::DEFAULT;
    for bounds in [
        resolve_uncached(&Unavailable, &settings),
        resolve_uncached(&Garbage, &settings),
    ] {
        assert_eq!(bounds.source(), BoundsSource::Estimated);
        let report = RemainingStackReport::measure(&bounds, current_stack_pointer());
        assert!(report.is_estimated());
        assert!(report.remaining_bytes > 0);
        assert!(report.remaining_bytes <= settings.estimated_stack_size - settings.min_guard_size);
    }
}

#[test]
fn estimate_never_exceeds_precise_report() {
    on_thread(MIB, || {
        let precise = remaining_stack();
        let bounds = resolve_uncached(&Unavailable, &ProbeSettings::DEFAULT);
        let estimated = RemainingStackReport::measure(&bounds, current_stack_pointer());
        if precise.bounds_source == BoundsSource::Precise {
            assert!(estimated.remaining_bytes <= precise.remaining_bytes);
        }
    });
}
