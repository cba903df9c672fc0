// SPDX-FileCopyrightText: 2025 Phoenix R&D GmbH <hello@phnx.im>
//
// SPDX-License-Identifier: AGPL-3.0-or-later

use libc::{pthread_get_stackaddr_np, pthread_get_stacksize_np, pthread_self};

use super::{PlatformStack, StackIntrospection, page_size};

/// Stack introspection through the Darwin `pthread_get_stack*_np` calls (macOS and iOS).
#[derive(Debug, Clone, Copy, Default)]
pub struct Apple;

impl StackIntrospection for Apple {
    fn current_thread_stack(&self) -> Option<PlatformStack> {
        // SAFETY: both calls only inspect the calling thread's own descriptor.
        let (base, size) = unsafe {
            let thread = pthread_self();
            (
                pthread_get_stackaddr_np(thread) as usize,
                pthread_get_stacksize_np(thread),
            )
        };
        // Darwin reports the highest stack address; the guard page sits right below the limit.
        let limit = base.checked_sub(size)?;
        Some(PlatformStack {
            base,
            limit,
            guard_size: page_size(),
        })
    }
}
