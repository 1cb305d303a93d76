// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

pub mod listen;
pub mod publish;

use std::time::Duration;

use pw_client::{ClientConfig, Pubsub, WebSocketTransport};

/// How long to wait for sockets to flush after closing.
const SHUTDOWN_GRACE: Duration = Duration::from_secs(2);

/// A session on a fresh WebSocket transport.
///
/// The transport is returned too so the caller can wait for its sockets on
/// exit.
fn open_session(config: &ClientConfig) -> (Pubsub, WebSocketTransport) {
    let transport = WebSocketTransport::new();
    let session = Pubsub::with_transport(
        config.pubsub_config(),
        config.credentials(),
        transport.clone(),
    );
    (session, transport)
}

/// Closes the session and gives its socket a moment to finish writing.
async fn shut_down(session: &Pubsub, transport: &WebSocketTransport) {
    session.close();
    if tokio::time::timeout(SHUTDOWN_GRACE, transport.shutdown())
        .await
        .is_err()
    {
        tracing::warn!("Socket did not shut down within {:?}", SHUTDOWN_GRACE);
    }
}
