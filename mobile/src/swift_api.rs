// SPDX-FileCopyrightText: 2025 Phoenix R&D GmbH <hello@phnx.im>
//
// SPDX-License-Identifier: AGPL-3.0-or-later

use std::ffi::{CStr, CString, c_char};

use stackprobe::BoundsSource;

use crate::api::{get_remaining_stack, get_remaining_stack_json, probe};

/// Remaining stack report in a C compatible layout.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StackReportFfi {
    pub remaining_bytes: usize,
    /// `0` if the stack bounds are precise, `1` if they are estimated.
    pub bounds_source: u8,
}

pub const BOUNDS_SOURCE_PRECISE: u8 = 0;
pub const BOUNDS_SOURCE_ESTIMATED: u8 = 1;

/// Measures the remaining stack of the calling thread without allocating.
///
/// If the probe fails, reports zero remaining bytes from estimated bounds.
#[unsafe(no_mangle)]
pub extern "C" fn stackprobe_remaining_stack() -> StackReportFfi {
    match probe() {
        Some(report) => StackReportFfi {
            remaining_bytes: report.remaining_bytes,
            bounds_source: match report.bounds_source {
                BoundsSource::Precise => BOUNDS_SOURCE_PRECISE,
                BoundsSource::Estimated => BOUNDS_SOURCE_ESTIMATED,
            },
        },
        None => StackReportFfi {
            remaining_bytes: 0,
            bounds_source: BOUNDS_SOURCE_ESTIMATED,
        },
    }
}

/// Remaining stack as human readable C string.
///
/// The returned string must be released with `stackprobe_free_string`.
#[unsafe(no_mangle)]
pub extern "C" fn stackprobe_remaining_stack_string() -> *mut c_char {
    into_raw(get_remaining_stack())
}

/// Remaining stack as JSON C string, or null on failure.
///
/// The returned string must be released with `stackprobe_free_string`.
#[unsafe(no_mangle)]
pub extern "C" fn stackprobe_remaining_stack_json() -> *mut c_char {
    get_remaining_stack_json().map_or(std::ptr::null_mut(), into_raw)
}

fn into_raw(s: String) -> *mut c_char {
    CString::new(s).map_or(std::ptr::null_mut(), CString::into_raw)
}

/// Initialize the Rust logger from the iOS host.
///
/// # Safety
///
/// The caller must ensure that the path is a pointer to a valid, NUL-terminated C string.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn stackprobe_init_logger(path: *const c_char) {
    if path.is_null() {
        return;
    }

    let Ok(path) = unsafe { CStr::from_ptr(path) }.to_str() else {
        return;
    };

    let _ = crate::logging::init_logger(path);
}

/// Releases a string returned by this library.
///
/// # Safety
///
/// The caller must ensure that the string was previously returned by
/// `stackprobe_remaining_stack_string` or `stackprobe_remaining_stack_json`, and that it is
/// released only once.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn stackprobe_free_string(s: *mut c_char) {
    if s.is_null() {
        return;
    }
    unsafe {
        let _ = CString::from_raw(s);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn typed_report() {
        let report = stackprobe_remaining_stack();
        assert!(report.remaining_bytes > 0);
        assert!(
            report.bounds_source == BOUNDS_SOURCE_PRECISE
                || report.bounds_source == BOUNDS_SOURCE_ESTIMATED
        );
    }

    #[test]
    fn string_roundtrip_through_c() {
        let raw = stackprobe_remaining_stack_string();
        assert!(!raw.is_null());
        let text = unsafe { CStr::from_ptr(raw) }.to_str().unwrap().to_owned();
        unsafe { stackprobe_free_string(raw) };
        assert!(text.starts_with("remaining stack: "));

        let raw = stackprobe_remaining_stack_json();
        assert!(!raw.is_null());
        let json = unsafe { CStr::from_ptr(raw) }.to_str().unwrap().to_owned();
        unsafe { stackprobe_free_string(raw) };
        assert!(json.contains("\"remaining_bytes\""));
    }

    #[test]
    fn null_arguments_are_ignored() {
        unsafe {
            stackprobe_free_string(std::ptr::null_mut());
            stackprobe_init_logger(std::ptr::null());
        }
    }
}
