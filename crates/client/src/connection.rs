// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Connection state machine for the pubsub socket.
//!
//! The manager owns the single active socket, the connection state and the
//! retry counter. It never touches the registry or the queue on its own; the
//! session hands them in for the replay that follows every open.
//!
//! # Transitions
//!
//! ```text
//!                 open()                socket opened
//! Disconnected ──────────► Connecting ─────────────────► Connected
//!      ▲                     │    ▲                          │
//!      │ close()             │    │ retry due                │ socket lost
//!      │                     ▼    │                          ▼
//!      └──────────────── Reconnecting ◄──────────────────────┘
//! ```
//!
//! Every socket gets a generation number. Events for a socket that is no
//! longer the active one are stale and ignored, so a late close from an
//! abandoned socket can never schedule a second reconnect.

use std::time::Duration;

use pw_core::ClientFrame;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};
use url::Url;

use crate::backoff::{RetryPolicy, RetryState};
use crate::queue::{OutboundQueue, QueuedPublish};
use crate::registry::SubscriptionRegistry;
use crate::transport::{Socket, SocketEvents, Transport, TransportError, TransportResult};

/// Socket generation number.
pub type Generation = u64;

/// State of the pubsub connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    /// Not connected and not trying to.
    Disconnected,
    /// A socket is being opened.
    Connecting,
    /// The socket is open and the replay has completed.
    Connected,
    /// Waiting `delay` before the next attempt after `attempt` consecutive failures.
    Reconnecting { attempt: u32, delay: Duration },
}

impl ConnectionState {
    /// Short lowercase name for logs and status output.
    pub fn name(&self) -> &'static str {
        match self {
            ConnectionState::Disconnected => "disconnected",
            ConnectionState::Connecting => "connecting",
            ConnectionState::Connected => "connected",
            ConnectionState::Reconnecting { .. } => "reconnecting",
        }
    }
}

impl std::fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConnectionState::Reconnecting { attempt, delay } => write!(
                f,
                "reconnecting (attempt {}, in {}ms)",
                attempt,
                delay.as_millis()
            ),
            other => f.write_str(other.name()),
        }
    }
}

/// A reconnect timer armed by [`ConnectionManager::schedule_retry`].
///
/// The caller sleeps for `delay` unless `cancel` fires first, then reports
/// back with [`ConnectionManager::take_due_retry`].
#[derive(Debug, Clone)]
pub struct ScheduledRetry {
    /// Identifies this timer.
    pub epoch: u64,
    /// Time to wait.
    pub delay: Duration,
    /// Fired when the timer is superseded or the connection is closed.
    pub cancel: CancellationToken,
}

/// Frames written during a replay.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReplaySummary {
    /// `sub` frames sent.
    pub subscribed: usize,
    /// Queued `pub` frames sent.
    pub flushed: usize,
}

struct ActiveSocket {
    generation: Generation,
    socket: Box<dyn Socket>,
}

struct PendingRetry {
    epoch: u64,
    cancel: CancellationToken,
}

/// Owner of the socket and the connection state.
pub struct ConnectionManager {
    state: ConnectionState,
    policy: RetryPolicy,
    retry: RetryState,
    socket: Option<ActiveSocket>,
    pending_retry: Option<PendingRetry>,
    next_generation: Generation,
    next_retry_epoch: u64,
}

impl ConnectionManager {
    /// Create a disconnected manager.
    pub fn new(policy: RetryPolicy) -> Self {
        ConnectionManager {
            state: ConnectionState::Disconnected,
            policy,
            retry: RetryState::new(),
            socket: None,
            pending_retry: None,
            next_generation: 1,
            next_retry_epoch: 1,
        }
    }

    /// Get the current connection state.
    pub fn state(&self) -> ConnectionState {
        self.state
    }

    /// Check if connected.
    pub fn is_connected(&self) -> bool {
        self.state == ConnectionState::Connected
    }

    /// Consecutive failures since the last successful open.
    pub fn retry_attempt(&self) -> u32 {
        self.retry.attempt()
    }

    /// Reconnect delay parameters.
    pub fn policy(&self) -> RetryPolicy {
        self.policy
    }

    /// Generation of the active socket, if any.
    pub fn current_generation(&self) -> Option<Generation> {
        self.socket.as_ref().map(|active| active.generation)
    }

    /// Returns true if `generation` names the active socket.
    pub fn is_current(&self, generation: Generation) -> bool {
        self.current_generation() == Some(generation)
    }

    /// Starts opening a socket.
    ///
    /// Returns `Ok(false)` without doing anything when already connecting or
    /// connected. A pending reconnect timer is cancelled. On error no socket
    /// is held and the caller decides whether to schedule a retry.
    pub fn open<F>(
        &mut self,
        url: &Url,
        transport: &dyn Transport,
        events: F,
    ) -> TransportResult<bool>
    where
        F: FnOnce(Generation) -> SocketEvents,
    {
        if matches!(
            self.state,
            ConnectionState::Connecting | ConnectionState::Connected
        ) {
            return Ok(false);
        }

        self.cancel_retry();

        let generation = self.next_generation;
        self.next_generation += 1;

        // Redact the access key from logs
        debug!(
            "Opening pubsub socket #{} to {}{}",
            generation,
            url.host_str().unwrap_or_default(),
            url.path()
        );

        let socket = transport.open(url, events(generation))?;
        self.socket = Some(ActiveSocket { generation, socket });
        self.state = ConnectionState::Connecting;
        Ok(true)
    }

    /// Connecting → Connected for the socket `generation`.
    ///
    /// Returns false for stale generations or when not connecting. The
    /// caller must run [`replay`](Self::replay) before releasing the lock.
    pub fn mark_open(&mut self, generation: Generation) -> bool {
        if !self.is_current(generation) || self.state != ConnectionState::Connecting {
            return false;
        }
        self.state = ConnectionState::Connected;
        self.retry.reset();
        info!("Pubsub socket #{} connected", generation);
        true
    }

    /// Re-subscribes every active channel, then flushes the queue in order.
    ///
    /// On a send failure the unsent publishes go back to the head of the
    /// queue and the error is returned; the socket is not released here.
    pub fn replay(
        &mut self,
        registry: &SubscriptionRegistry,
        queue: &mut OutboundQueue,
    ) -> TransportResult<ReplaySummary> {
        let mut summary = ReplaySummary::default();

        for channel in registry.active_channels() {
            self.send(&ClientFrame::sub(channel))?;
            summary.subscribed += 1;
        }

        let mut pending = queue.drain_in_order().into_iter();
        while let Some(publish) = pending.next() {
            let frame = ClientFrame::publish(publish.channel.clone(), publish.data.clone());
            if let Err(e) = self.send(&frame) {
                let mut unsent: Vec<QueuedPublish> = vec![publish];
                unsent.extend(pending);
                queue.requeue_front(unsent);
                return Err(e);
            }
            summary.flushed += 1;
        }

        Ok(summary)
    }

    /// Writes a frame to the open socket.
    pub fn send(&mut self, frame: &ClientFrame) -> TransportResult<()> {
        if self.state != ConnectionState::Connected {
            return Err(TransportError::ConnectionClosed);
        }
        let active = self
            .socket
            .as_mut()
            .ok_or(TransportError::ConnectionClosed)?;
        let text = frame
            .to_json()
            .map_err(|e| TransportError::SendFailed(e.to_string()))?;
        active.socket.send(text)
    }

    /// Releases the socket `generation` after it closed or failed.
    ///
    /// Returns `None` for stale generations, otherwise whether the connection
    /// was `Connected`. The state becomes `Disconnected`; the caller follows
    /// up with [`schedule_retry`](Self::schedule_retry).
    pub fn socket_lost(&mut self, generation: Generation) -> Option<bool> {
        if !self.is_current(generation) {
            return None;
        }
        let was_connected = self.state == ConnectionState::Connected;
        if let Some(mut active) = self.socket.take() {
            active.socket.close();
        }
        self.state = ConnectionState::Disconnected;
        Some(was_connected)
    }

    /// Records a failure and arms the next reconnect.
    pub fn schedule_retry(&mut self) -> ScheduledRetry {
        self.cancel_retry();

        let delay = self.retry.next_delay(&self.policy);
        let attempt = self.retry.attempt();
        let epoch = self.next_retry_epoch;
        self.next_retry_epoch += 1;

        let cancel = CancellationToken::new();
        self.pending_retry = Some(PendingRetry {
            epoch,
            cancel: cancel.clone(),
        });
        self.state = ConnectionState::Reconnecting { attempt, delay };

        ScheduledRetry {
            epoch,
            delay,
            cancel,
        }
    }

    /// Claims the reconnect timer `epoch` once it has elapsed.
    ///
    /// Returns false if the timer was cancelled or superseded in the
    /// meantime, in which case no attempt may be made.
    pub fn take_due_retry(&mut self, epoch: u64) -> bool {
        let due = matches!(self.state, ConnectionState::Reconnecting { .. })
            && self
                .pending_retry
                .as_ref()
                .is_some_and(|pending| pending.epoch == epoch);
        if due {
            self.pending_retry = None;
        }
        due
    }

    /// Closes the socket and cancels any pending reconnect.
    ///
    /// Returns whether the connection was `Connected`. Terminal until the
    /// next [`open`](Self::open).
    pub fn close(&mut self) -> bool {
        self.cancel_retry();
        let was_connected = self.state == ConnectionState::Connected;
        if let Some(mut active) = self.socket.take() {
            debug!("Closing pubsub socket #{}", active.generation);
            active.socket.close();
        }
        self.state = ConnectionState::Disconnected;
        self.retry.reset();
        was_connected
    }

    fn cancel_retry(&mut self) {
        if let Some(pending) = self.pending_retry.take() {
            pending.cancel.cancel();
        }
    }
}

impl std::fmt::Debug for ConnectionManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConnectionManager")
            .field("state", &self.state)
            .field("policy", &self.policy)
            .field("retry", &self.retry)
            .field("socket", &self.current_generation())
            .finish()
    }
}
