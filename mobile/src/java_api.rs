// SPDX-FileCopyrightText: 2025 Phoenix R&D GmbH <hello@phnx.im>
//
// SPDX-License-Identifier: AGPL-3.0-or-later

use jni::{
    JNIEnv,
    objects::{JClass, JString},
    sys::jstring,
};
use tracing::error;

use crate::api::get_remaining_stack;

/// Called by `com.example.rust_android.StackProbe.getRemainingStack()`.
///
/// Returns `null` if the Java string cannot be created.
#[unsafe(export_name = "Java_com_example_rust_1android_StackProbe_getRemainingStack")]
pub extern "C" fn java_get_remaining_stack(mut env: JNIEnv, _class: JClass) -> jstring {
    let text = get_remaining_stack();
    match env.new_string(text) {
        Ok(output) => output.into_raw(),
        Err(error) => {
            error!(%error, "Failed to create Java string");
            std::ptr::null_mut()
        }
    }
}

/// Called by `com.example.rust_android.StackProbe.initLogger(String path)`.
#[unsafe(export_name = "Java_com_example_rust_1android_StackProbe_initLogger")]
pub extern "C" fn java_init_logger(mut env: JNIEnv, _class: JClass, path: JString) {
    let path: String = match env.get_string(&path) {
        Ok(value) => value.into(),
        Err(error) => {
            error!(%error, "Failed to read log path string from Java");
            return;
        }
    };
    if let Err(error) = crate::logging::init_logger(&path) {
        error!(%error, path, "Failed to initialize logger");
    }
}
