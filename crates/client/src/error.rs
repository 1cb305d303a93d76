// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

use thiserror::Error;

use crate::queue::QueueError;

/// Errors a caller of the pubsub session can see.
///
/// Transport failures never appear here: they are recovered by reconnecting.
#[derive(Debug, Error)]
pub enum PubsubError {
    /// Missing access key or unusable endpoint.
    #[error("{0}")]
    Config(#[from] pw_core::Error),

    #[error("missing channel\n  hint: channel names must be non-empty")]
    MissingChannel,

    #[error("{0}")]
    Queue(#[from] QueueError),

    #[error("payload is not serializable: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("subscription was removed before a message arrived")]
    Cancelled,
}

/// Result type for pubsub session operations.
pub type PubsubResult<T> = Result<T, PubsubError>;
