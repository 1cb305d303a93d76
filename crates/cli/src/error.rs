// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

use thiserror::Error;

use pw_client::{ConfigFileError, PubsubError};

/// Errors reported by the `pubwire` commands.
#[derive(Debug, Error)]
pub enum Error {
    #[error("no endpoint configured\n  hint: pass --endpoint or set `endpoint` in {0}")]
    NoEndpoint(String),

    #[error(transparent)]
    ConfigFile(#[from] ConfigFileError),

    #[error(transparent)]
    Pubsub(#[from] PubsubError),

    #[error("invalid payload: {0}\n  hint: the payload must be JSON, quote strings like '\"hello\"'")]
    InvalidPayload(serde_json::Error),

    #[error("timed out after {0}s waiting for the connection")]
    Timeout(u64),
}

/// Result type for `pubwire` commands.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
