// SPDX-FileCopyrightText: 2025 Phoenix R&D GmbH <hello@phnx.im>
//
// SPDX-License-Identifier: AGPL-3.0-or-later

use anyhow::Context;
use clap::Parser;
use stackprobe::run_on_new_stack;
use stackprobe_cli::{
    args::Args, commands::run_command, configuration::get_configuration, logging::init_logging,
};
use tracing::info;

fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    init_logging(args.json).context("Could not initialize logging")?;

    let settings =
        get_configuration(&args.config_dir).context("Could not load configuration")?;
    settings.install().context("Invalid configuration")?;

    let cmd = args.cmd.unwrap_or_default();
    let json = args.json;
    let lines = match args.thread_stack_size {
        Some(stack_size) => {
            info!(stack_size, "Probing on a new thread");
            run_on_new_stack(stack_size, || {
                info!(
                    stack_size = stackprobe::stack_size(),
                    remaining_bytes = stackprobe::remaining_stack().remaining_bytes,
                    "Stack info in probe thread"
                );
                run_command(&cmd, json)
            })
            .context("Could not probe on a new thread")?
        }
        None => run_command(&cmd, json),
    };

    for line in lines {
        println!("{line}");
    }
    Ok(())
}
