// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! pubwire - command-line client for pubsub channels.
//!
//! - `pubwire listen <channel>...` prints every payload as one JSON line
//! - `pubwire publish <channel> <json>` publishes once and exits
//!
//! Connection settings come from `<config dir>/pubwire/config.toml`,
//! overridden by `--endpoint`, `--api-key` and `--internal`.

mod cli;
mod commands;
pub mod error;
pub mod logging;
mod settings;

pub use cli::{Cli, Command, GlobalArgs};
pub use error::{Error, Result};

/// Runs a parsed command line.
pub async fn run(cli: Cli) -> Result<()> {
    let config = settings::load(&cli.global)?;

    match cli.command {
        Command::Listen { channels, count } => {
            commands::listen::run(&config, &channels, count).await
        }
        Command::Publish {
            channel,
            payload,
            timeout_secs,
        } => commands::publish::run(&config, &channel, &payload, timeout_secs).await,
    }
}
