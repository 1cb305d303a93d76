// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

use std::sync::Arc;
use std::time::Duration;

use pw_client::ClientConfig;
use serde_json::Value;
use tokio::sync::Notify;
use tracing::info;

use super::{open_session, shut_down};
use crate::error::{Error, Result};

/// Parses a command-line payload as JSON.
pub fn parse_payload(payload: &str) -> Result<Value> {
    serde_json::from_str(payload).map_err(Error::InvalidPayload)
}

/// Publishes one payload and waits until it has been handed to the socket.
///
/// The publish is queued before connecting, so the replay that precedes the
/// open notification writes it.
pub async fn run(
    config: &ClientConfig,
    channel: &str,
    payload: &str,
    timeout_secs: u64,
) -> Result<()> {
    let data = parse_payload(payload)?;
    let (session, transport) = open_session(config);

    let opened = Arc::new(Notify::new());
    let signal = Arc::clone(&opened);
    session.on_open(move || signal.notify_one());

    session.publish(channel, &data)?;
    session.connect()?;

    let waited = tokio::time::timeout(Duration::from_secs(timeout_secs), opened.notified()).await;
    shut_down(&session, &transport).await;

    match waited {
        Ok(()) => {
            info!("Published to '{}'", channel);
            Ok(())
        }
        Err(_) => Err(Error::Timeout(timeout_secs)),
    }
}

#[cfg(test)]
#[path = "publish_tests.rs"]
mod tests;
