// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Wire frames exchanged over the pubsub socket.
//!
//! Every frame is a single JSON text message:
//! - Client sends `sub`, `unsub` and `pub` actions
//! - Server delivers `{"channel": ..., "data": ...}` for subscribed channels

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{Error, Result};

/// Frames sent from client to server.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum ClientFrame {
    /// Start receiving messages for a channel.
    Sub { channel: String },

    /// Stop receiving messages for a channel.
    Unsub { channel: String },

    /// Publish a payload to every subscriber of a channel.
    Pub { channel: String, data: Value },
}

impl ClientFrame {
    /// Creates a Sub frame.
    pub fn sub(channel: impl Into<String>) -> Self {
        ClientFrame::Sub {
            channel: channel.into(),
        }
    }

    /// Creates an Unsub frame.
    pub fn unsub(channel: impl Into<String>) -> Self {
        ClientFrame::Unsub {
            channel: channel.into(),
        }
    }

    /// Creates a Pub frame.
    pub fn publish(channel: impl Into<String>, data: Value) -> Self {
        ClientFrame::Pub {
            channel: channel.into(),
            data,
        }
    }

    /// Channel the frame refers to.
    pub fn channel(&self) -> &str {
        match self {
            ClientFrame::Sub { channel }
            | ClientFrame::Unsub { channel }
            | ClientFrame::Pub { channel, .. } => channel,
        }
    }

    /// Serializes the frame to JSON.
    pub fn to_json(&self) -> std::result::Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Deserializes the frame from JSON.
    pub fn from_json(s: &str) -> std::result::Result<Self, serde_json::Error> {
        serde_json::from_str(s)
    }
}

/// Frame delivered from server to client.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ServerFrame {
    /// Channel the payload was published on.
    pub channel: String,
    /// Published payload, any JSON value (including `null`).
    pub data: Value,
}

impl ServerFrame {
    /// Creates a frame.
    pub fn new(channel: impl Into<String>, data: Value) -> Self {
        ServerFrame {
            channel: channel.into(),
            data,
        }
    }

    /// Parses an inbound text frame.
    ///
    /// `data` must be present but may be `null`; `channel` must be a string.
    pub fn parse(text: &str) -> Result<Self> {
        let value: Value = serde_json::from_str(text)?;
        let Value::Object(mut fields) = value else {
            return Err(Error::MalformedFrame("expected a JSON object".to_string()));
        };

        let channel = match fields.remove("channel") {
            Some(Value::String(channel)) => channel,
            Some(other) => {
                return Err(Error::MalformedFrame(format!(
                    "channel must be a string, got {}",
                    other
                )))
            }
            None => return Err(Error::MissingField("channel")),
        };
        let data = fields.remove("data").ok_or(Error::MissingField("data"))?;

        Ok(ServerFrame { channel, data })
    }

    /// Serializes the frame to JSON.
    pub fn to_json(&self) -> std::result::Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

#[cfg(test)]
#[path = "protocol_tests.rs"]
mod tests;
