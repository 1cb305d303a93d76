// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Pubsub session: the public subscribe/publish surface.
//!
//! Provides a high-level interface for:
//! - Subscribing handlers to channels (replayed after every reconnect)
//! - Publishing payloads (queued while disconnected)
//! - Connecting, closing and reconfiguring credentials
//! - Automatic reconnection with linear capped backoff
//!
//! All session state (connection, registry, queue) sits behind one mutex.
//! Socket events and caller operations take that lock for the whole of a
//! transition, so the replay that follows an open completes before any
//! concurrent `subscribe` or `publish` can write to the socket. Handlers and
//! listeners always run after the lock is released.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};

use pw_core::{resolve, ClientFrame, CredentialProvider, Credentials, Namespace};
use serde::Serialize;
use serde_json::Value;
use tokio::runtime::Handle;
use tokio::sync::oneshot;
use tracing::{debug, info, warn};

use crate::backoff::RetryPolicy;
use crate::connection::{ConnectionManager, ConnectionState, Generation};
use crate::dispatcher;
use crate::error::{PubsubError, PubsubResult};
use crate::listeners::{self, LifecycleEvent, ListenerId, Listeners};
use crate::queue::{OutboundQueue, QueueLimit, QueuedPublish};
use crate::registry::{ChannelChange, HandlerId, SubscriptionRegistry};
use crate::transport::{EventSink, SocketEvent, SocketEvents, Transport, WebSocketTransport};

/// Configuration for a pubsub session.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PubsubConfig {
    /// Namespace the session connects to.
    pub namespace: Namespace,
    /// Reconnect delay parameters.
    pub retry: RetryPolicy,
    /// Bound on publishes queued while disconnected; unbounded when `None`.
    pub queue_limit: Option<QueueLimit>,
}

impl PubsubConfig {
    /// Default configuration for the internal namespace.
    pub fn internal() -> Self {
        PubsubConfig {
            namespace: Namespace::Internal,
            ..Self::default()
        }
    }
}

struct Inner {
    credentials: Credentials,
    registry: SubscriptionRegistry,
    queue: OutboundQueue,
    connection: ConnectionManager,
}

struct Shared {
    inner: Mutex<Inner>,
    listeners: Mutex<Listeners>,
    transport: Arc<dyn Transport>,
    namespace: Namespace,
    /// Runtime for reconnect timers; captured at construction.
    runtime: Option<Handle>,
}

/// Lifecycle notification to emit once the session lock is released.
#[must_use]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Notify {
    None,
    Open,
    Close,
}

/// Reconnecting pubsub session.
///
/// Cloning is cheap; clones share the same connection.
#[derive(Clone)]
pub struct Pubsub {
    shared: Arc<Shared>,
}

impl Pubsub {
    /// Create a session with the default WebSocket transport.
    ///
    /// Does not connect; call [`connect`](Self::connect).
    pub fn new(config: PubsubConfig, credentials: Credentials) -> Self {
        Self::with_transport(config, credentials, WebSocketTransport::new())
    }

    /// Create a session with a custom transport.
    pub fn with_transport<T>(config: PubsubConfig, credentials: Credentials, transport: T) -> Self
    where
        T: Transport + 'static,
    {
        let inner = Inner {
            credentials,
            registry: SubscriptionRegistry::new(),
            queue: OutboundQueue::with_limit(config.queue_limit),
            connection: ConnectionManager::new(config.retry),
        };

        Pubsub {
            shared: Arc::new(Shared {
                inner: Mutex::new(inner),
                listeners: Mutex::new(Listeners::default()),
                transport: Arc::new(transport),
                namespace: config.namespace,
                runtime: Handle::try_current().ok(),
            }),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.shared
            .inner
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    fn lock_listeners(&self) -> MutexGuard<'_, Listeners> {
        self.shared
            .listeners
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    /// Namespace this session connects to.
    pub fn namespace(&self) -> Namespace {
        self.shared.namespace
    }

    /// Current credentials.
    pub fn credentials(&self) -> Credentials {
        self.lock().credentials.clone()
    }

    /// Get the current connection state.
    pub fn state(&self) -> ConnectionState {
        self.lock().connection.state()
    }

    /// Check if connected.
    pub fn is_connected(&self) -> bool {
        self.lock().connection.is_connected()
    }

    /// Get the number of publishes waiting for a connection.
    pub fn pending_publishes(&self) -> usize {
        self.lock().queue.len()
    }

    /// Returns true if at least one handler is registered for `channel`.
    pub fn has_handlers(&self, channel: &str) -> bool {
        self.lock().registry.has_handlers(channel)
    }

    /// Channels with at least one handler, in subscription order.
    pub fn active_channels(&self) -> Vec<String> {
        self.lock().registry.active_channels()
    }

    /// Registers `handler` for messages on `channel`.
    ///
    /// The first handler of a channel sends a `sub` frame when connected;
    /// otherwise the subscription is sent by the replay on the next open.
    pub fn subscribe<F>(&self, channel: &str, handler: F) -> PubsubResult<HandlerId>
    where
        F: Fn(&Value) + Send + Sync + 'static,
    {
        validate_channel(channel)?;

        let mut inner = self.lock();
        let (id, change) = inner.registry.subscribe(channel, Arc::new(handler));
        debug!("Subscribed {} to '{}'", id, channel);

        let notify = if change == ChannelChange::Activated {
            self.send_now(&mut inner, ClientFrame::sub(channel))
        } else {
            Notify::None
        };
        drop(inner);

        self.emit(notify);
        Ok(id)
    }

    /// Alias for [`subscribe`](Self::subscribe).
    pub fn on<F>(&self, channel: &str, handler: F) -> PubsubResult<HandlerId>
    where
        F: Fn(&Value) + Send + Sync + 'static,
    {
        self.subscribe(channel, handler)
    }

    /// Removes one handler, or all handlers of `channel` when `handler` is `None`.
    ///
    /// When the channel loses its last handler an `unsub` frame is sent if
    /// connected. Unknown channels and handlers are ignored.
    pub fn unsubscribe(&self, channel: &str, handler: Option<HandlerId>) -> PubsubResult<()> {
        validate_channel(channel)?;

        let mut inner = self.lock();
        let change = inner.registry.unsubscribe(channel, handler);

        let notify = if change == ChannelChange::Deactivated {
            debug!("Channel '{}' has no handlers left", channel);
            self.send_now(&mut inner, ClientFrame::unsub(channel))
        } else {
            Notify::None
        };
        drop(inner);

        self.emit(notify);
        Ok(())
    }

    /// Alias for [`unsubscribe`](Self::unsubscribe).
    pub fn off(&self, channel: &str, handler: Option<HandlerId>) -> PubsubResult<()> {
        self.unsubscribe(channel, handler)
    }

    /// Publishes `payload` on `channel`.
    ///
    /// Sent immediately when connected, otherwise queued and flushed in
    /// order on the next open.
    pub fn publish<T>(&self, channel: &str, payload: &T) -> PubsubResult<()>
    where
        T: Serialize + ?Sized,
    {
        validate_channel(channel)?;
        let data = serde_json::to_value(payload)?;
        let publish = QueuedPublish {
            channel: channel.to_string(),
            data,
        };

        let mut inner = self.lock();
        let mut notify = Notify::None;

        if inner.connection.is_connected() {
            let frame = ClientFrame::publish(publish.channel.clone(), publish.data.clone());
            match inner.connection.send(&frame) {
                Ok(()) => {
                    debug!("Published to '{}'", channel);
                    return Ok(());
                }
                Err(e) => {
                    warn!("Publish to '{}' failed, queueing: {}", channel, e);
                    notify = self.drop_current(&mut inner);
                }
            }
        }

        let result = inner.queue.enqueue(publish);
        if result.is_ok() {
            debug!(
                "Queued publish to '{}' ({} pending)",
                channel,
                inner.queue.len()
            );
        }
        drop(inner);

        self.emit(notify);
        result.map(|_| ()).map_err(PubsubError::from)
    }

    /// Waits for the next message on `channel` and returns its payload.
    ///
    /// The temporary handler is removed when the future completes or is
    /// dropped. Resolves to [`PubsubError::Cancelled`] if the handler is
    /// removed by someone else first, e.g. by [`reset`](Self::reset).
    pub async fn once(&self, channel: &str) -> PubsubResult<Value> {
        let (tx, rx) = oneshot::channel::<Value>();
        let slot = Mutex::new(Some(tx));

        let id = self.subscribe(channel, move |data| {
            let sender = slot.lock().unwrap_or_else(PoisonError::into_inner).take();
            if let Some(sender) = sender {
                let _ = sender.send(data.clone());
            }
        })?;

        let _guard = OnceGuard {
            session: self.clone(),
            channel: channel.to_string(),
            id,
        };

        rx.await.map_err(|_| PubsubError::Cancelled)
    }

    /// Starts connecting.
    ///
    /// No-op when already connecting or connected. From `Reconnecting` the
    /// pending timer is skipped and a socket is opened right away.
    ///
    /// # Errors
    ///
    /// Returns [`PubsubError::Config`] when no access key is configured or
    /// the endpoint is unusable; the session stays as it was.
    pub fn connect(&self) -> PubsubResult<()> {
        let mut inner = self.lock();
        if !inner.credentials.has_access_key() {
            debug!("Not connecting: no access key");
            return Err(pw_core::Error::MissingAccessKey.into());
        }
        if matches!(
            inner.connection.state(),
            ConnectionState::Connecting | ConnectionState::Connected
        ) {
            return Ok(());
        }
        self.start_connect(&mut inner)
    }

    /// Closes the connection and cancels any pending reconnect.
    ///
    /// Subscriptions and queued publishes are kept; a later
    /// [`connect`](Self::connect) replays them.
    pub fn close(&self) {
        let was_connected = self.lock().connection.close();
        info!("Pubsub session closed");
        if was_connected {
            self.emit(Notify::Close);
        }
    }

    /// Closes the connection and forgets every subscription.
    pub fn reset(&self) {
        let was_connected = {
            let mut inner = self.lock();
            let was_connected = inner.connection.close();
            inner.registry.clear();
            was_connected
        };
        info!("Pubsub session reset");
        if was_connected {
            self.emit(Notify::Close);
        }
    }

    /// Replaces the credentials.
    ///
    /// Without an access key the session closes and the missing key is
    /// reported. With changed credentials any connection is restarted
    /// against the new endpoint; unchanged credentials behave like
    /// [`connect`](Self::connect).
    pub fn reconfigure(&self, credentials: Credentials) -> PubsubResult<()> {
        let mut inner = self.lock();
        let changed = inner.credentials != credentials;
        inner.credentials = credentials;

        if !inner.credentials.has_access_key() {
            let was_connected = inner.connection.close();
            drop(inner);
            info!("Pubsub credentials cleared, session closed");
            if was_connected {
                self.emit(Notify::Close);
            }
            return Err(pw_core::Error::MissingAccessKey.into());
        }

        if changed {
            let was_connected = inner.connection.close();
            let result = self.start_connect(&mut inner);
            drop(inner);
            if was_connected {
                self.emit(Notify::Close);
            }
            return result;
        }

        drop(inner);
        self.connect()
    }

    /// Reconfigures from a credential provider snapshot.
    pub fn reconfigure_from(&self, provider: &dyn CredentialProvider) -> PubsubResult<()> {
        self.reconfigure(Credentials::from_provider(provider))
    }

    /// Registers a listener fired each time the session becomes connected.
    pub fn on_open<F>(&self, listener: F) -> ListenerId
    where
        F: Fn() + Send + Sync + 'static,
    {
        self.lock_listeners()
            .add(LifecycleEvent::Open, Arc::new(listener))
    }

    /// Registers a listener fired each time the session stops being connected.
    pub fn on_close<F>(&self, listener: F) -> ListenerId
    where
        F: Fn() + Send + Sync + 'static,
    {
        self.lock_listeners()
            .add(LifecycleEvent::Close, Arc::new(listener))
    }

    /// Detaches a listener. Returns false if it was not registered.
    pub fn remove_listener(&self, id: ListenerId) -> bool {
        self.lock_listeners().remove(id)
    }

    // ── Internal transitions ──────────────────────────────────────────────────

    /// Opens a socket for the current credentials.
    fn start_connect(&self, inner: &mut Inner) -> PubsubResult<()> {
        let url = resolve(&inner.credentials, self.shared.namespace)?;
        let sink_target = Arc::downgrade(&self.shared);

        let opened = inner
            .connection
            .open(&url, self.shared.transport.as_ref(), |generation| {
                SocketEvents::new(Arc::new(SessionSink {
                    shared: sink_target,
                    generation,
                }))
            });

        if let Err(e) = opened {
            warn!("Failed to open pubsub socket: {}", e);
            self.schedule_retry(inner);
        }
        Ok(())
    }

    /// Sends a frame if connected; a failed send drops the connection.
    ///
    /// Nothing is lost on failure: the registry is replayed on reconnect.
    fn send_now(&self, inner: &mut Inner, frame: ClientFrame) -> Notify {
        if !inner.connection.is_connected() {
            return Notify::None;
        }
        match inner.connection.send(&frame) {
            Ok(()) => Notify::None,
            Err(e) => {
                warn!("Failed to send frame for '{}': {}", frame.channel(), e);
                self.drop_current(inner)
            }
        }
    }

    /// Abandons the active socket and schedules a reconnect.
    fn drop_current(&self, inner: &mut Inner) -> Notify {
        match inner.connection.current_generation() {
            Some(generation) => self.socket_lost(inner, generation),
            None => Notify::None,
        }
    }

    fn socket_lost(&self, inner: &mut Inner, generation: Generation) -> Notify {
        match inner.connection.socket_lost(generation) {
            None => Notify::None,
            Some(was_connected) => {
                self.schedule_retry(inner);
                if was_connected {
                    Notify::Close
                } else {
                    Notify::None
                }
            }
        }
    }

    fn schedule_retry(&self, inner: &mut Inner) {
        let retry = inner.connection.schedule_retry();
        info!(
            "Reconnecting pubsub in {}ms (attempt {})",
            retry.delay.as_millis(),
            inner.connection.retry_attempt()
        );

        let runtime = match self.shared.runtime.clone().or_else(|| Handle::try_current().ok()) {
            Some(runtime) => runtime,
            None => {
                warn!("No tokio runtime available, reconnect will wait for connect()");
                return;
            }
        };

        let target = Arc::downgrade(&self.shared);
        runtime.spawn(async move {
            tokio::select! {
                _ = retry.cancel.cancelled() => {}
                _ = tokio::time::sleep(retry.delay) => {
                    if let Some(shared) = target.upgrade() {
                        Pubsub { shared }.retry_due(retry.epoch);
                    }
                }
            }
        });
    }

    fn retry_due(&self, epoch: u64) {
        let mut inner = self.lock();
        if !inner.connection.take_due_retry(epoch) {
            debug!("Reconnect timer {} superseded", epoch);
            return;
        }
        if let Err(e) = self.start_connect(&mut inner) {
            warn!("Reconnect abandoned: {}", e);
            let _ = inner.connection.close();
        }
    }

    fn handle_event(&self, generation: Generation, event: SocketEvent) {
        match event {
            SocketEvent::Opened => self.handle_opened(generation),
            SocketEvent::Message(text) => self.handle_message(generation, &text),
            SocketEvent::Closed(reason) => {
                info!(
                    "Pubsub socket #{} closed: {}",
                    generation,
                    reason.as_deref().unwrap_or("no reason")
                );
                self.handle_lost(generation);
            }
            SocketEvent::Error(error) => {
                warn!("Pubsub socket #{} failed: {}", generation, error);
                self.handle_lost(generation);
            }
        }
    }

    /// Connecting → Connected, replaying subscriptions and the queue.
    fn handle_opened(&self, generation: Generation) {
        let mut inner = self.lock();
        if !inner.connection.mark_open(generation) {
            debug!("Ignoring open from stale socket #{}", generation);
            return;
        }

        let Inner {
            registry,
            queue,
            connection,
            ..
        } = &mut *inner;

        let notify = match connection.replay(registry, queue) {
            Ok(summary) => {
                info!(
                    "Replayed {} subscriptions and {} queued publishes",
                    summary.subscribed, summary.flushed
                );
                Notify::Open
            }
            Err(e) => {
                warn!("Replay on socket #{} failed: {}", generation, e);
                let _ = self.socket_lost(&mut inner, generation);
                Notify::None
            }
        };
        drop(inner);

        self.emit(notify);
    }

    fn handle_message(&self, generation: Generation, text: &str) {
        if !self.lock().connection.is_current(generation) {
            debug!("Ignoring message from stale socket #{}", generation);
            return;
        }
        dispatcher::on_frame(text, |channel| self.lock().registry.handlers(channel));
    }

    fn handle_lost(&self, generation: Generation) {
        let notify = {
            let mut inner = self.lock();
            self.socket_lost(&mut inner, generation)
        };
        self.emit(notify);
    }

    fn emit(&self, notify: Notify) {
        let event = match notify {
            Notify::None => return,
            Notify::Open => LifecycleEvent::Open,
            Notify::Close => LifecycleEvent::Close,
        };
        let targets = self.lock_listeners().for_event(event);
        listeners::emit(event, &targets);
    }
}

impl std::fmt::Debug for Pubsub {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let inner = self.lock();
        f.debug_struct("Pubsub")
            .field("namespace", &self.shared.namespace)
            .field("connection", &inner.connection)
            .field("registry", &inner.registry)
            .field("pending", &inner.queue.len())
            .finish()
    }
}

/// Routes events of one socket back into its session.
struct SessionSink {
    shared: Weak<Shared>,
    generation: Generation,
}

impl EventSink for SessionSink {
    fn deliver(&self, event: SocketEvent) {
        if let Some(shared) = self.shared.upgrade() {
            Pubsub { shared }.handle_event(self.generation, event);
        }
    }
}

/// Removes the temporary handler of [`Pubsub::once`].
struct OnceGuard {
    session: Pubsub,
    channel: String,
    id: HandlerId,
}

impl Drop for OnceGuard {
    fn drop(&mut self) {
        let _ = self.session.unsubscribe(&self.channel, Some(self.id));
    }
}

fn validate_channel(channel: &str) -> PubsubResult<()> {
    if channel.is_empty() {
        return Err(PubsubError::MissingChannel);
    }
    Ok(())
}
