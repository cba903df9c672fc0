// SPDX-FileCopyrightText: 2025 Phoenix R&D GmbH <hello@phnx.im>
//
// SPDX-License-Identifier: AGPL-3.0-or-later

use std::sync::OnceLock;

use serde::Deserialize;
use tracing::info;

use crate::error::SettingsError;

static SETTINGS: OnceLock<ProbeSettings> = OnceLock::new();
static DEFAULT_SETTINGS: ProbeSettings = ProbeSettings::DEFAULT;

/// Tuning of the stack probe.
///
/// Installed once per process with [`ProbeSettings::install`]. Threads that resolved their
/// bounds before installation keep the bounds computed with the previous settings.
#[derive(Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct ProbeSettings {
    /// Platform-reported stacks smaller than this are considered implausible
    ///
    /// Default is 16 KiB.
    #[serde(default = "default_min_plausible_stack_size")]
    pub min_plausible_stack_size: usize,
    /// Stack size assumed below the current frame when the platform bounds are unusable
    ///
    /// Default is 32 KiB.
    #[serde(default = "default_estimated_stack_size")]
    pub estimated_stack_size: usize,
    /// Guard size applied when the platform reports a smaller one (or none)
    ///
    /// Default is 4 KiB.
    #[serde(default = "default_min_guard_size")]
    pub min_guard_size: usize,
    /// Redline used by callers that do not pick their own
    ///
    /// Default is 32 KiB.
    #[serde(default = "default_redline")]
    pub default_redline: usize,
}

impl ProbeSettings {
    pub const DEFAULT: Self = Self {
        min_plausible_stack_size: 16 * 1024,
        estimated_stack_size: 32 * 1024,
        min_guard_size: 4 * 1024,
        default_redline: 32 * 1024,
    };

    /// Returns the installed settings, or the defaults if none were installed.
    pub fn global() -> &'static Self {
        SETTINGS.get().unwrap_or(&DEFAULT_SETTINGS)
    }

    /// Checks that the settings leave an estimated stack some usable room.
    pub fn validate(&self) -> Result<(), SettingsError> {
        if self.estimated_stack_size == 0 {
            return Err(SettingsError::Invalid("estimated_stack_size must not be zero"));
        }
        if self.min_guard_size >= self.estimated_stack_size {
            return Err(SettingsError::Invalid(
                "min_guard_size must be smaller than estimated_stack_size",
            ));
        }
        Ok(())
    }

    /// Validates and installs the settings for the whole process.
    pub fn install(self) -> Result<(), SettingsError> {
        self.validate()?;
        info!(settings = ?self, "Installing stack probe settings");
        SETTINGS
            .set(self)
            .map_err(|_| SettingsError::AlreadyInstalled)
    }
}

impl Default for ProbeSettings {
    fn default() -> Self {
        Self::DEFAULT
    }
}

fn default_min_plausible_stack_size() -> usize {
    ProbeSettings::DEFAULT.min_plausible_stack_size
}

fn default_estimated_stack_size() -> usize {
    ProbeSettings::DEFAULT.estimated_stack_size
}

fn default_min_guard_size() -> usize {
    ProbeSettings::DEFAULT.min_guard_size
}

fn default_redline() -> usize {
    ProbeSettings::DEFAULT.default_redline
}
