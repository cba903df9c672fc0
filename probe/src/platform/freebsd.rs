// SPDX-FileCopyrightText: 2025 Phoenix R&D GmbH <hello@phnx.im>
//
// SPDX-License-Identifier: AGPL-3.0-or-later

use libc::{
    c_void, pthread_attr_destroy, pthread_attr_get_np, pthread_attr_getguardsize,
    pthread_attr_getstack, pthread_attr_init, pthread_attr_t, pthread_self,
};

use super::{PlatformStack, StackIntrospection};

/// Stack introspection through `pthread_attr_get_np`.
#[derive(Debug, Clone, Copy, Default)]
pub struct FreeBsd;

impl StackIntrospection for FreeBsd {
    fn current_thread_stack(&self) -> Option<PlatformStack> {
        // SAFETY: `attr` is initialized by `pthread_attr_init` before use and destroyed exactly
        // once before returning.
        unsafe {
            let mut attr: pthread_attr_t = core::mem::zeroed();
            if pthread_attr_init(&mut attr) != 0 {
                return None;
            }
            let mut addr: *mut c_void = core::ptr::null_mut();
            let mut size: usize = 0;
            let mut guard_size: usize = 0;
            let ok = pthread_attr_get_np(pthread_self(), &mut attr) == 0
                && pthread_attr_getstack(&attr, &mut addr, &mut size) == 0;
            if pthread_attr_getguardsize(&attr, &mut guard_size) != 0 {
                guard_size = 0;
            }
            let _ = pthread_attr_destroy(&mut attr);
            if !ok {
                return None;
            }

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
