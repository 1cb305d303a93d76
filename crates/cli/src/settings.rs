// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Merges the config file with command-line overrides.

use std::path::PathBuf;

use pw_client::ClientConfig;

use crate::cli::GlobalArgs;
use crate::error::{Error, Result};

/// Loads the effective client configuration.
///
/// An explicit `--config` must exist. The default location is optional, in
/// which case `--endpoint` is required.
pub fn load(args: &GlobalArgs) -> Result<ClientConfig> {
    let path = args.config.clone().or_else(ClientConfig::default_path);

    let from_file = match &path {
        Some(path) if args.config.is_some() || path.exists() => Some(ClientConfig::load(path)?),
        _ => None,
    };

    let mut config = match (from_file, &args.endpoint) {
        (Some(mut config), Some(endpoint)) => {
            config.endpoint = endpoint.clone();
            config
        }
        (Some(config), None) => config,
        (None, Some(endpoint)) => ClientConfig::new(endpoint.clone()),
        (None, None) => return Err(Error::NoEndpoint(display_path(path))),
    };

    if let Some(api_key) = &args.api_key {
        config.api_key = Some(api_key.clone());
    }
    if args.internal {
        config.internal = true;
    }

    Ok(config)
}

fn display_path(path: Option<PathBuf>) -> String {
    path.map(|p| p.display().to_string())
        .unwrap_or_else(|| "the config file".to_string())
}

#[cfg(test)]
#[path = "settings_tests.rs"]
mod tests;
