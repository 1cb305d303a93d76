// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Connection lifecycle listeners.
//!
//! - `open` listeners fire when the session enters `Connected`
//! - `close` listeners fire when the session leaves `Connected`

use std::fmt;
use std::sync::Arc;

use tracing::error;

use crate::dispatcher::invoke_isolated;

/// Callback for connection lifecycle events.
pub type Listener = Arc<dyn Fn() + Send + Sync>;

/// Opaque token identifying a registered listener.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

impl fmt::Display for ListenerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "listener-{}", self.0)
    }
}

/// Lifecycle event a listener is attached to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum LifecycleEvent {
    Open,
    Close,
}

impl LifecycleEvent {
    fn name(self) -> &'static str {
        match self {
            LifecycleEvent::Open => "open",
            LifecycleEvent::Close => "close",
        }
    }
}

#[derive(Default)]
pub(crate) struct Listeners {
    entries: Vec<(ListenerId, LifecycleEvent, Listener)>,
    next_id: u64,
}

impl Listeners {
    pub fn add(&mut self, event: LifecycleEvent, listener: Listener) -> ListenerId {
        let id = ListenerId(self.next_id);
        self.next_id += 1;
        self.entries.push((id, event, listener));
        id
    }

    pub fn remove(&mut self, id: ListenerId) -> bool {
        let before = self.entries.len();
        self.entries.retain(|(entry_id, _, _)| *entry_id != id);
        self.entries.len() != before
    }

    /// Listeners for `event`, in registration order.
    pub fn for_event(&self, event: LifecycleEvent) -> Vec<Listener> {
        self.entries
            .iter()
            .filter(|(_, entry_event, _)| *entry_event == event)
            .map(|(_, _, listener)| Arc::clone(listener))
            .collect()
    }
}

/// Calls each listener, logging panics.
pub(crate) fn emit(event: LifecycleEvent, listeners: &[Listener]) {
    for listener in listeners {
        let target = format!("{} listener", event.name());
        if let Err(e) = invoke_isolated(&target, || listener()) {
            error!("{}", e);
        }
    }
}
