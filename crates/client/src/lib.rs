// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Reconnecting publish/subscribe client.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────┐     ┌──────────────────┐     ┌─────────────┐
//! │   Pubsub    │────►│ ConnectionManager│────►│  Transport  │
//! │  (session)  │     │  (state, retry)  │     │   (trait)   │
//! └─────────────┘     └──────────────────┘     └─────────────┘
//!     │      │                ▲                       │
//!     ▼      ▼                │ replay                │ events
//! ┌────────┐ ┌──────────┐     │                       ▼
//! │Registry│ │  Queue   │─────┘                ┌─────────────┐
//! └────────┘ └──────────┘                      │ Dispatcher  │
//!                                              └─────────────┘
//! ```
//!
//! # Features
//!
//! - Multiple handlers per channel, dispatched in registration order
//! - Publishes queued while offline and flushed in order on connect
//! - Subscriptions replayed after every reconnect
//! - Linear capped backoff, cancelled deterministically by `close()`
//! - Injectable transport trait for testing

pub mod backoff;
pub mod config;
pub mod connection;
pub mod container;
pub mod dispatcher;
pub mod error;
pub mod listeners;
pub mod queue;
pub mod registry;
pub mod session;
pub mod transport;

pub use backoff::RetryPolicy;
pub use config::{ClientConfig, ConfigFileError};
pub use connection::ConnectionState;
pub use container::PubsubContainer;
pub use error::{PubsubError, PubsubResult};
pub use listeners::ListenerId;
pub use pw_core::{CredentialProvider, Credentials, Namespace};
pub use queue::{OverflowPolicy, QueueError, QueueLimit};
pub use registry::HandlerId;
pub use session::{Pubsub, PubsubConfig};
pub use transport::{
    EventSink, Socket, SocketEvent, SocketEvents, Transport, TransportError, WebSocketTransport,
};

#[cfg(test)]
mod test_helpers;

#[cfg(test)]
mod transport_tests;
