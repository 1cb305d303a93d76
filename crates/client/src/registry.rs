// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Subscription registry: which handlers listen on which channel.
//!
//! The registry is the source of truth for the wire subscription set. Channels
//! and the handlers within a channel keep their insertion order; handler order
//! is dispatch order and channel order is replay order.

use std::fmt;
use std::sync::Arc;

use serde_json::Value;

/// Callback invoked with the payload of each message on a channel.
pub type Handler = Arc<dyn Fn(&Value) + Send + Sync>;

/// Opaque token identifying one registered handler.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct HandlerId(u64);

impl fmt::Display for HandlerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "handler-{}", self.0)
    }
}

/// Effect of a registry mutation on the wire subscription set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelChange {
    /// The channel got its first handler; a `sub` frame is due.
    Activated,
    /// The channel lost its last handler; an `unsub` frame is due.
    Deactivated,
    /// The wire subscription set is unaffected.
    Unchanged,
}

struct Registration {
    id: HandlerId,
    handler: Handler,
}

struct Subscription {
    channel: String,
    handlers: Vec<Registration>,
}

/// Mapping from channel name to its ordered handlers.
///
/// A channel is present only while it has at least one handler.
#[derive(Default)]
pub struct SubscriptionRegistry {
    subscriptions: Vec<Subscription>,
    next_id: u64,
}

impl SubscriptionRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    fn position(&self, channel: &str) -> Option<usize> {
        self.subscriptions.iter().position(|s| s.channel == channel)
    }

    /// Appends a handler to a channel, creating the channel if absent.
    pub fn subscribe(&mut self, channel: &str, handler: Handler) -> (HandlerId, ChannelChange) {
        let id = HandlerId(self.next_id);
        self.next_id += 1;
        let registration = Registration { id, handler };

        match self.position(channel) {
            Some(index) => {
                self.subscriptions[index].handlers.push(registration);
                (id, ChannelChange::Unchanged)
            }
            None => {
                self.subscriptions.push(Subscription {
                    channel: channel.to_string(),
                    handlers: vec![registration],
                });
                (id, ChannelChange::Activated)
            }
        }
    }

    /// Removes one handler, or every handler of the channel when `handler` is `None`.
    ///
    /// Unknown channels and unknown handler ids leave the registry untouched.
    pub fn unsubscribe(&mut self, channel: &str, handler: Option<HandlerId>) -> ChannelChange {
        let Some(index) = self.position(channel) else {
            return ChannelChange::Unchanged;
        };

        if let Some(id) = handler {
            let handlers = &mut self.subscriptions[index].handlers;
            let before = handlers.len();
            handlers.retain(|r| r.id != id);
            if handlers.len() == before || !handlers.is_empty() {
                return ChannelChange::Unchanged;
            }
        }

        self.subscriptions.remove(index);
        ChannelChange::Deactivated
    }

    /// Returns true if at least one handler is registered for `channel`.
    pub fn has_handlers(&self, channel: &str) -> bool {
        self.position(channel).is_some()
    }

    /// Channels with at least one handler, in insertion order.
    pub fn active_channels(&self) -> Vec<String> {
        self.subscriptions
            .iter()
            .map(|s| s.channel.clone())
            .collect()
    }

    /// Handlers currently registered for `channel`, in registration order.
    pub fn handlers(&self, channel: &str) -> Vec<Handler> {
        self.position(channel)
            .map(|index| {
                self.subscriptions[index]
                    .handlers
                    .iter()
                    .map(|r| Arc::clone(&r.handler))
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Number of handlers registered for `channel`.
    pub fn handler_count(&self, channel: &str) -> usize {
        self.position(channel)
            .map(|index| self.subscriptions[index].handlers.len())
            .unwrap_or(0)
    }

    /// Removes every channel and handler.
    pub fn clear(&mut self) {
        self.subscriptions.clear();
    }

    /// Number of active channels.
    pub fn len(&self) -> usize {
        self.subscriptions.len()
    }

    /// Check if no channel is active.
    pub fn is_empty(&self) -> bool {
        self.subscriptions.is_empty()
    }
}

impl fmt::Debug for SubscriptionRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map()
            .entries(
                self.subscriptions
                    .iter()
                    .map(|s| (&s.channel, s.handlers.len())),
            )
            .finish()
    }
}
