// SPDX-FileCopyrightText: 2025 Phoenix R&D GmbH <hello@phnx.im>
//
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Measures how much call-stack capacity the current thread has left.
//!
//! The stack range of a thread is queried from the platform once and cached in thread-local
//! storage. Each [`remaining_stack`] call then only reads the stack position and subtracts
//! the limit and guard region:
//!
//! ```
//! let report = stackprobe::remaining_stack();
//! println!("{report}");
//! assert!(report.remaining_bytes <= stackprobe::stack_size());
//! ```
//!
//! The probe never fails. If the platform cannot tell the stack range, the result is
//! computed from a conservative estimate and marked as [`BoundsSource::Estimated`].

pub mod bounds;
pub mod error;
pub mod estimate;
pub mod grow;
pub mod platform;
pub mod settings;

pub use bounds::{BoundsSource, StackBounds, resolve_bounds};
pub use error::{SettingsError, StackError};
pub use estimate::{RemainingStackReport, remaining_stack, stack_size};
pub use grow::{check_redline, grow, maybe_grow, run_on_new_stack};
pub use settings::ProbeSettings;
