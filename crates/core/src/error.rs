// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Error types for pw-core operations.

use thiserror::Error;

/// All possible errors that can occur in pw-core operations.
#[derive(Debug, Error)]
pub enum Error {
    #[error("missing access key\n  hint: configure an api key before connecting")]
    MissingAccessKey,

    #[error("invalid endpoint '{endpoint}': {reason}")]
    InvalidEndpoint { endpoint: String, reason: String },

    #[error("unsupported endpoint scheme '{0}'\n  hint: valid schemes are: http, https, ws, wss")]
    UnsupportedScheme(String),

    #[error("malformed frame: {0}")]
    MalformedFrame(String),

    #[error("frame is missing field '{0}'")]
    MissingField(&'static str),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Returns true for errors caused by missing or unusable connection settings.
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            Error::MissingAccessKey | Error::InvalidEndpoint { .. } | Error::UnsupportedScheme(_)
        )
    }

    /// Returns true for errors caused by a frame the peer sent.
    pub fn is_protocol(&self) -> bool {
        matches!(
            self,
            Error::MalformedFrame(_) | Error::MissingField(_) | Error::Json(_)
        )
    }
}

/// A specialized Result type for pw-core operations.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
