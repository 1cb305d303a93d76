// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Transport abstraction for the pubsub socket.
//!
//! Provides a trait-based socket layer that enables:
//! - Real WebSocket connections for production
//! - Mock sockets for unit testing
//!
//! A [`Transport`] opens a [`Socket`] and reports what happens to it through
//! [`SocketEvents`]. Events are delivered asynchronously: an implementation
//! must never report an event from inside `open`, `send` or `close`.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use futures_util::{SinkExt, StreamExt};
use tokio::runtime::Handle;
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::Message;
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;
use tracing::debug;
use url::Url;

/// Error type for transport operations.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// Connection failed.
    #[error("connection failed: {0}")]
    ConnectionFailed(String),

    /// Connection closed unexpectedly.
    #[error("connection closed")]
    ConnectionClosed,

    /// Send failed.
    #[error("send failed: {0}")]
    SendFailed(String),

    /// Receive failed.
    #[error("receive failed: {0}")]
    ReceiveFailed(String),
}

/// Result type for transport operations.
pub type TransportResult<T> = Result<T, TransportError>;

/// Something that happened to an open socket.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SocketEvent {
    /// The handshake completed; frames may be sent.
    Opened,
    /// A text frame arrived.
    Message(String),
    /// The peer or the network closed the connection.
    Closed(Option<String>),
    /// The socket failed; no further events follow.
    Error(String),
}

/// Receiver of socket events.
pub trait EventSink: Send + Sync {
    /// Handles one event.
    fn deliver(&self, event: SocketEvent);
}

/// Handle a transport uses to report events for one socket.
#[derive(Clone)]
pub struct SocketEvents {
    sink: Arc<dyn EventSink>,
}

impl SocketEvents {
    /// Wraps an event sink.
    pub fn new(sink: Arc<dyn EventSink>) -> Self {
        SocketEvents { sink }
    }

    /// Reports a completed handshake.
    pub fn opened(&self) {
        self.sink.deliver(SocketEvent::Opened);
    }

    /// Reports an inbound text frame.
    pub fn message(&self, text: impl Into<String>) {
        self.sink.deliver(SocketEvent::Message(text.into()));
    }

    /// Reports a closed connection.
    pub fn closed(&self, reason: Option<String>) {
        self.sink.deliver(SocketEvent::Closed(reason));
    }

    /// Reports a socket failure.
    pub fn error(&self, error: impl Into<String>) {
        self.sink.deliver(SocketEvent::Error(error.into()));
    }
}

impl std::fmt::Debug for SocketEvents {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SocketEvents").finish_non_exhaustive()
    }
}

/// One message-oriented connection.
pub trait Socket: Send {
    /// Hands a text frame to the connection. Never blocks.
    fn send(&mut self, frame: String) -> TransportResult<()>;

    /// Closes the connection. No events are reported afterwards.
    fn close(&mut self);

    /// Check if the handshake completed and the socket is not closed.
    fn is_open(&self) -> bool;
}

/// Socket provider.
///
/// This trait abstracts over the actual transport mechanism, allowing
/// for easy testing with mock implementations.
pub trait Transport: Send + Sync {
    /// Starts opening a socket to `url`.
    ///
    /// Returns as soon as the attempt is underway; the outcome arrives as an
    /// `Opened` or `Error` event.
    fn open(&self, url: &Url, events: SocketEvents) -> TransportResult<Box<dyn Socket>>;
}

/// WebSocket transport implementation using tokio-tungstenite.
///
/// Each socket runs in its own task on the tokio runtime. Clones share the
/// set of socket tasks.
#[derive(Debug, Clone, Default)]
pub struct WebSocketTransport {
    /// Runtime for socket tasks; the ambient runtime when `None`.
    runtime: Option<Handle>,
    tasks: TaskTracker,
}

impl WebSocketTransport {
    /// Create a new WebSocket transport using the ambient tokio runtime.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a WebSocket transport spawning socket tasks on `runtime`.
    pub fn with_runtime(runtime: Handle) -> Self {
        WebSocketTransport {
            runtime: Some(runtime),
            tasks: TaskTracker::new(),
        }
    }

    /// Waits until every socket task has finished.
    ///
    /// Sockets must be closed first, otherwise this waits for the peer to
    /// hang up. Frames handed to a socket before it was closed are written
    /// out before its task ends.
    pub async fn shutdown(&self) {
        self.tasks.close();
        self.tasks.wait().await;
    }
}

impl Transport for WebSocketTransport {
    fn open(&self, url: &Url, events: SocketEvents) -> TransportResult<Box<dyn Socket>> {
        let runtime = match &self.runtime {
            Some(handle) => handle.clone(),
            None => Handle::try_current()
                .map_err(|e| TransportError::ConnectionFailed(e.to_string()))?,
        };

        let (frames_tx, frames_rx) = mpsc::unbounded_channel();
        let cancel = CancellationToken::new();
        let open = Arc::new(AtomicBool::new(false));

        self.tasks.spawn_on(
            run_socket(
                url.to_string(),
                events,
                frames_rx,
                cancel.clone(),
                Arc::clone(&open),
            ),
            &runtime,
        );

        Ok(Box::new(WebSocketSocket {
            frames: frames_tx,
            cancel,
            open,
        }))
    }
}

/// Caller side of a socket task.
struct WebSocketSocket {
    frames: mpsc::UnboundedSender<String>,
    cancel: CancellationToken,
    open: Arc<AtomicBool>,
}

impl Socket for WebSocketSocket {
    fn send(&mut self, frame: String) -> TransportResult<()> {
        if self.cancel.is_cancelled() {
            return Err(TransportError::ConnectionClosed);
        }
        self.frames
            .send(frame)
            .map_err(|_| TransportError::ConnectionClosed)
    }

    fn close(&mut self) {
        self.open.store(false, Ordering::Release);
        self.cancel.cancel();
    }

    fn is_open(&self) -> bool {
        self.open.load(Ordering::Acquire)
    }
}

impl Drop for WebSocketSocket {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

/// Socket task: connect, then pump frames both ways until closed.
async fn run_socket(
    url: String,
    events: SocketEvents,
    mut frames: mpsc::UnboundedReceiver<String>,
    cancel: CancellationToken,
    open: Arc<AtomicBool>,
) {
    let connect_result = tokio::select! {
        _ = cancel.cancelled() => return,
        result = tokio_tungstenite::connect_async(url.as_str()) => result,
    };

    let ws_stream = match connect_result {
        Ok((ws_stream, _)) => ws_stream,
        Err(e) => {
            events.error(TransportError::ConnectionFailed(e.to_string()).to_string());
            return;
        }
    };

    let (mut sink, mut stream) = ws_stream.split();
    open.store(true, Ordering::Release);
    events.opened();

    loop {
        tokio::select! {
            _ = cancel.cancelled() => {
                // Frames handed over before close() still go out
                while let Ok(frame) = frames.try_recv() {
                    if sink.send(Message::Text(frame.into())).await.is_err() {
                        break;
                    }
                }
                let _ = sink.close().await;
                open.store(false, Ordering::Release);
                return;
            }

            frame = frames.recv() => {
                match frame {
                    Some(frame) => {
                        if let Err(e) = sink.send(Message::Text(frame.into())).await {
                            open.store(false, Ordering::Release);
                            events.error(TransportError::SendFailed(e.to_string()).to_string());
                            return;
                        }
                    }
                    None => {
                        // Socket handle dropped
                        let _ = sink.close().await;
                        open.store(false, Ordering::Release);
                        return;
                    }
                }
            }

            msg = stream.next() => {
                match msg {
                    Some(Ok(Message::Text(text))) => {
                        events.message(text.as_str());
                    }
                    Some(Ok(Message::Close(frame))) => {
                        open.store(false, Ordering::Release);
                        events.closed(frame.map(|f| f.reason.as_str().to_string()));
                        return;
                    }
                    Some(Ok(other)) => {
                        // Ping/pong are answered by tungstenite; binary frames are not part of the protocol
                        debug!("Ignoring non-text websocket frame: {:?}", other);
                    }
                    Some(Err(e)) => {
                        open.store(false, Ordering::Release);
                        events.error(TransportError::ReceiveFailed(e.to_string()).to_string());
                        return;
                    }
                    None => {
                        open.store(false, Ordering::Release);
                        events.closed(None);
                        return;
                    }
                }
            }
        }
    }
}
