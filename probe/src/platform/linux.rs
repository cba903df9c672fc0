// SPDX-FileCopyrightText: 2025 Phoenix R&D GmbH <hello@phnx.im>
//
// SPDX-License-Identifier: AGPL-3.0-or-later

use libc::{
    c_void, pthread_attr_destroy, pthread_attr_getguardsize, pthread_attr_getstack,
    pthread_attr_t, pthread_getattr_np, pthread_self,
};

use super::{PlatformStack, StackIntrospection};

/// Stack introspection through `pthread_getattr_np` (glibc, musl and bionic).
#[derive(Debug, Clone, Copy, Default)]
pub struct Linux;

impl StackIntrospection for Linux {
    fn current_thread_stack(&self) -> Option<PlatformStack> {
        // SAFETY: `attr` is only read after `pthread_getattr_np` initialized it, and it is
        // destroyed exactly once before returning.
        unsafe {
            let mut attr: pthread_attr_t = core::mem::zeroed();
            if pthread_getattr_np(pthread_self(), &mut attr) != 0 {
                return None;
            }
            let mut addr: *mut c_void = core::ptr::null_mut();
            let mut size: usize = 0;
            let mut guard_size: usize = 0;
            let stack_res = pthread_attr_getstack(&attr, &mut addr, &mut size);
            // The main thread reports no guard here; the resolver applies a minimum.
            if pthread_attr_getguardsize(&attr, &mut guard_size) != 0 {
                guard_size = 0;
            }
            let _ = pthread_attr_destroy(&mut attr);
            if stack_res != 0 {
                return None;
            }

            // `addr` is the lowest address of the stack, excluding the guard region.
            let limit = addr as usize;
            let base = limit.checked_add(size)?;
            Some(PlatformStack {
                base,
                limit,
                guard_size,
            })
        }
    }
}
