// SPDX-FileCopyrightText: 2025 Phoenix R&D GmbH <hello@phnx.im>
//
// SPDX-License-Identifier: AGPL-3.0-or-later

use std::{fs::OpenOptions, io, path::Path, sync::Mutex};

use tracing::{debug, metadata::LevelFilter};
use tracing_subscriber::EnvFilter;

/// Routes all logs into the file at `path`, appending to it.
///
/// If a logger is already installed, it is kept.
pub fn init_logger(path: impl AsRef<Path>) -> io::Result<()> {
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path.as_ref())?;
    let env_filter = EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy();
    let result = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .try_init();
    if let Err(error) = result {
        debug!(%error, "Logger already initialized");
    }
    Ok(())
}
