// SPDX-FileCopyrightText: 2025 Phoenix R&D GmbH <hello@phnx.im>
//
// SPDX-License-Identifier: AGPL-3.0-or-later

use super::{PlatformStack, StackIntrospection};

/// Targets without a known stack introspection facility.
#[derive(Debug, Clone, Copy, Default)]
pub struct Unsupported;

impl StackIntrospection for Unsupported {
    fn current_thread_stack(&self) -> Option<PlatformStack> {
        None
    }
}
