// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

/// Parse a channel name, which must not be empty.
fn channel_name(s: &str) -> Result<String, String> {
    if s.is_empty() {
        Err("cannot be empty".to_string())
    } else {
        Ok(s.to_string())
    }
}

#[derive(Parser, Debug)]
#[command(name = "pubwire")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Publish to and listen on pubsub channels")]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalArgs,

    #[command(subcommand)]
    pub command: Command,
}

/// Connection options shared by every command.
#[derive(Args, Debug, Clone, Default)]
pub struct GlobalArgs {
    /// Config file (default: <config dir>/pubwire/config.toml)
    #[arg(long, global = true, value_name = "path")]
    pub config: Option<PathBuf>,

    /// Server endpoint, overrides the config file
    #[arg(long, global = true, value_name = "url")]
    pub endpoint: Option<String>,

    /// Access key, overrides the config file
    #[arg(long, global = true, value_name = "key")]
    pub api_key: Option<String>,

    /// Use the internal namespace
    #[arg(long, global = true)]
    pub internal: bool,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Print messages arriving on channels, one JSON value per line
    Listen {
        /// Channels to subscribe to
        #[arg(required = true, value_parser = channel_name)]
        channels: Vec<String>,

        /// Exit after this many messages
        #[arg(long, value_name = "n")]
        count: Option<usize>,
    },

    /// Publish a JSON payload to a channel
    Publish {
        /// Target channel
        #[arg(value_parser = channel_name)]
        channel: String,

        /// Payload, as JSON
        payload: String,

        /// Give up if no connection is made within this many seconds
        #[arg(long, default_value = "10", value_name = "secs")]
        timeout_secs: u64,
    },
}
