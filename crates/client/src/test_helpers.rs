// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Shared test helpers for client tests.

#![allow(clippy::unwrap_used)]

use std::sync::{Arc, Mutex};

use pw_core::Credentials;
use serde_json::{json, Value};

use crate::session::{Pubsub, PubsubConfig};
use crate::transport_tests::{MockSocketHandle, MockTransport};

pub const ENDPOINT: &str = "https://pubsub.example.com";
pub const ACCESS_KEY: &str = "test-key";

/// Credentials with an access key.
pub fn credentials() -> Credentials {
    Credentials::new(ENDPOINT, ACCESS_KEY)
}

/// A session on a mock transport, not yet connected.
pub fn mock_session() -> (Pubsub, MockTransport) {
    mock_session_with(PubsubConfig::default())
}

pub fn mock_session_with(config: PubsubConfig) -> (Pubsub, MockTransport) {
    let transport = MockTransport::new();
    let session = Pubsub::with_transport(config, credentials(), transport.clone());
    (session, transport)
}

/// Connect and complete the handshake, returning the open socket.
pub fn connected(session: &Pubsub, transport: &MockTransport) -> MockSocketHandle {
    session.connect().unwrap();
    let socket = transport.last_socket();
    socket.open();
    socket
}

pub fn sub_frame(channel: &str) -> Value {
    json!({ "action": "sub", "channel": channel })
}

pub fn unsub_frame(channel: &str) -> Value {
    json!({ "action": "unsub", "channel": channel })
}

pub fn pub_frame(channel: &str, data: Value) -> Value {
    json!({ "action": "pub", "channel": channel, "data": data })
}

/// Handler that records every payload it receives.
pub fn recorder() -> (
    Arc<Mutex<Vec<Value>>>,
    impl Fn(&Value) + Send + Sync + 'static,
) {
    let received = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&received);
    (received, move |data: &Value| {
        sink.lock().unwrap().push(data.clone())
    })
}
