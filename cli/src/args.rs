// SPDX-FileCopyrightText: 2025 Phoenix R&D GmbH <hello@phnx.im>
//
// SPDX-License-Identifier: AGPL-3.0-or-later

use std::path::PathBuf;

#[derive(clap::Parser)]
#[command(
    author,
    version,
    about = "Prints how much call stack the current thread has left"
)]
pub struct Args {
    /// Print reports as JSON
    #[arg(long, global = true)]
    pub json: bool,
    /// Run on a new thread with a stack of this many bytes
    #[arg(long, global = true)]
    pub thread_stack_size: Option<usize>,
    /// Directory containing an optional `stackprobe.yaml`
    #[arg(long, global = true, default_value = ".")]
    pub config_dir: PathBuf,
    #[command(subcommand)]
    pub cmd: Option<Command>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, clap::Subcommand)]
pub enum Command {
    /// Print the remaining stack once
    #[default]
    Report,
    /// Recurse and print the remaining stack along the way
    Descend {
        /// Number of frames to descend
        #[arg(long, default_value_t = 64)]
        depth: usize,
        /// Print a report every this many frames
        #[arg(long, default_value_t = 8)]
        step: usize,
        /// Bytes of stack each frame holds, rounded up to whole KiB
        #[arg(long, default_value_t = 1024)]
        frame_size: usize,
    },
}
