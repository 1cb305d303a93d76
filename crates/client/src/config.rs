// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Client configuration file.
//!
//! Configuration is stored in `<config dir>/pubwire/config.toml`:
//! - `endpoint`: HTTP endpoint of the server (required)
//! - `api_key`: access key; without it sessions never connect
//! - `internal`: connect to the internal namespace
//! - `[reconnect]`: backoff parameters
//! - `[queue]`: optional bound on publishes queued while offline

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use pw_core::{Credentials, Namespace};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::backoff::RetryPolicy;
use crate::queue::{OverflowPolicy, QueueLimit};
use crate::session::PubsubConfig;

const CONFIG_DIR_NAME: &str = "pubwire";
const CONFIG_FILE_NAME: &str = "config.toml";

/// Errors reading the configuration file.
#[derive(Debug, Error)]
pub enum ConfigFileError {
    #[error("cannot read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("invalid config {path}: {source}\n  hint: see `[reconnect]` and `[queue]` for the accepted keys")]
    Toml {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

/// Contents of `config.toml`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientConfig {
    /// HTTP endpoint, e.g. `https://api.example.com`.
    pub endpoint: String,
    /// Access key sent as `api_key`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    /// Use the internal `/_/pubsub` namespace.
    #[serde(default)]
    pub internal: bool,
    #[serde(default)]
    pub reconnect: ReconnectConfig,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub queue: Option<QueueConfig>,
}

/// Reconnect backoff settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReconnectConfig {
    /// Delay after the first failure, grows linearly (default: 5000).
    #[serde(default = "default_base_delay_ms")]
    pub base_delay_ms: u64,
    /// Upper bound on the delay (default: 60000).
    #[serde(default = "default_max_delay_ms")]
    pub max_delay_ms: u64,
}

impl Default for ReconnectConfig {
    fn default() -> Self {
        ReconnectConfig {
            base_delay_ms: default_base_delay_ms(),
            max_delay_ms: default_max_delay_ms(),
        }
    }
}

fn default_base_delay_ms() -> u64 {
    5000
}

fn default_max_delay_ms() -> u64 {
    60_000
}

/// Offline queue bound.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueueConfig {
    pub max_len: usize,
    #[serde(default)]
    pub overflow: OverflowPolicy,
}

impl ClientConfig {
    /// Config with only an endpoint set.
    pub fn new(endpoint: impl Into<String>) -> Self {
        ClientConfig {
            endpoint: endpoint.into(),
            api_key: None,
            internal: false,
            reconnect: ReconnectConfig::default(),
            queue: None,
        }
    }

    /// Default config file location, if the platform has a config dir.
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join(CONFIG_DIR_NAME).join(CONFIG_FILE_NAME))
    }

    /// Reads and parses `path`.
    pub fn load(path: &Path) -> Result<Self, ConfigFileError> {
        let content = fs::read_to_string(path).map_err(|source| ConfigFileError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&content).map_err(|source| ConfigFileError::Toml {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn from_toml_str(content: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(content)
    }

    pub fn credentials(&self) -> Credentials {
        Credentials {
            endpoint: self.endpoint.clone(),
            access_key: self.api_key.clone(),
        }
    }

    pub fn namespace(&self) -> Namespace {
        if self.internal {
            Namespace::Internal
        } else {
            Namespace::Public
        }
    }

    /// Session settings derived from this file.
    pub fn pubsub_config(&self) -> PubsubConfig {
        PubsubConfig {
            namespace: self.namespace(),
            retry: RetryPolicy::from_millis(
                self.reconnect.base_delay_ms,
                self.reconnect.max_delay_ms,
            ),
            queue_limit: self.queue.map(|queue| QueueLimit {
                max_len: queue.max_len,
                overflow: queue.overflow,
            }),
        }
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
