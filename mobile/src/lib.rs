// SPDX-FileCopyrightText: 2025 Phoenix R&D GmbH <hello@phnx.im>
//
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Exposes the stack probe to host applications.
//!
//! [`api`] holds the Rust functions the hosts call; [`java_api`] and [`swift_api`] are the
//! thin JNI and C ABI layers around them.

pub mod api;
pub mod java_api;
pub mod logging;
pub mod swift_api;
