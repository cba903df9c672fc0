// SPDX-FileCopyrightText: 2025 Phoenix R&D GmbH <hello@phnx.im>
//
// SPDX-License-Identifier: AGPL-3.0-or-later

use std::path::Path;

use config::{Config, ConfigError, Environment, File};
use stackprobe::ProbeSettings;

/// Loads the probe settings from `<dir>/stackprobe.yaml` (optional) and `STACKPROBE__*`
/// environment variables, in increasing priority.
///
/// Missing values fall back to the defaults of [`ProbeSettings`].
pub fn get_configuration(dir: impl AsRef<Path>) -> Result<ProbeSettings, ConfigError> {
    Config::builder()
        .add_source(File::from(dir.as_ref().join("stackprobe")).required(false))
        .add_source(
            Environment::with_prefix("STACKPROBE")
                .prefix_separator("__")
                .separator("__")
                .try_parsing(true),
        )
        .build()?
        .try_deserialize()
}
