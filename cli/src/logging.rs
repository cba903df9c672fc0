// SPDX-FileCopyrightText: 2025 Phoenix R&D GmbH <hello@phnx.im>
//
// SPDX-License-Identifier: AGPL-3.0-or-later

use std::io;

use tracing::{metadata::LevelFilter, subscriber::set_global_default};
use tracing_bunyan_formatter::{BunyanFormattingLayer, JsonStorageLayer};
use tracing_log::LogTracer;
use tracing_subscriber::{EnvFilter, Registry, fmt, layer::SubscriberExt};

const LOG_NAME: &str = "stackprobe";

/// Routes logs to stderr so that stdout only carries the reports.
///
/// With `json`, log lines are bunyan JSON like the reports; otherwise they are plain text.
/// The level defaults to `warn` and can be changed with `RUST_LOG`. Fails when a global
/// subscriber is already installed.
pub fn init_logging(json: bool) -> anyhow::Result<()> {
    let env_filter = EnvFilter::builder()
        .with_default_directive(LevelFilter::WARN.into())
        .from_env_lossy();
    let bunyan = json.then(|| BunyanFormattingLayer::new(LOG_NAME.into(), io::stderr));
    let text = (!json).then(|| fmt::layer().with_target(false).with_writer(io::stderr));
    let subscriber = Registry::default()
        .with(env_filter)
        .with(json.then_some(JsonStorageLayer))
        .with(bunyan)
        .with(text);

    LogTracer::init()?;
    set_global_default(subscriber)?;
    Ok(())
}
