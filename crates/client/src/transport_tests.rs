// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Tests for the transport module.

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::panic)]

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use serde_json::{json, Value};
use tokio::net::TcpListener;
use tokio_tungstenite::tungstenite::Message;
use url::Url;

use super::transport::{
    EventSink, Socket, SocketEvent, SocketEvents, Transport, TransportError, TransportResult,
    WebSocketTransport,
};

/// Mock transport for testing without real sockets.
///
/// Clones share state, so a test can keep one clone after handing another
/// to a session.
#[derive(Clone, Default)]
pub struct MockTransport {
    state: Arc<Mutex<MockState>>,
}

#[derive(Default)]
struct MockState {
    sockets: Vec<MockSocketHandle>,
    /// Number of upcoming `open` calls that fail.
    failing_opens: usize,
}

/// Test-side view of one socket opened through [`MockTransport`].
#[derive(Clone)]
pub struct MockSocketHandle {
    url: Url,
    events: SocketEvents,
    sent: Arc<Mutex<Vec<String>>>,
    open: Arc<AtomicBool>,
    closed: Arc<AtomicBool>,
    fail_sends: Arc<AtomicBool>,
}

struct MockSocket {
    sent: Arc<Mutex<Vec<String>>>,
    open: Arc<AtomicBool>,
    closed: Arc<AtomicBool>,
    fail_sends: Arc<AtomicBool>,
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make the next `count` opens fail immediately.
    pub fn fail_next_opens(&self, count: usize) {
        self.state.lock().unwrap().failing_opens = count;
    }

    /// Number of sockets opened so far.
    pub fn open_count(&self) -> usize {
        self.state.lock().unwrap().sockets.len()
    }

    /// The `index`-th socket opened.
    pub fn socket(&self, index: usize) -> MockSocketHandle {
        self.state.lock().unwrap().sockets[index].clone()
    }

    /// The most recently opened socket.
    pub fn last_socket(&self) -> MockSocketHandle {
        self.state.lock().unwrap().sockets.last().cloned().unwrap()
    }
}

impl Transport for MockTransport {
    fn open(&self, url: &Url, events: SocketEvents) -> TransportResult<Box<dyn Socket>> {
        let mut state = self.state.lock().unwrap();
        if state.failing_opens > 0 {
            state.failing_opens -= 1;
            return Err(TransportError::ConnectionFailed("mock failure".into()));
        }

        let handle = MockSocketHandle {
            url: url.clone(),
            events,
            sent: Arc::new(Mutex::new(Vec::new())),
            open: Arc::new(AtomicBool::new(false)),
            closed: Arc::new(AtomicBool::new(false)),
            fail_sends: Arc::new(AtomicBool::new(false)),
        };
        let socket = MockSocket {
            sent: Arc::clone(&handle.sent),
            open: Arc::clone(&handle.open),
            closed: Arc::clone(&handle.closed),
            fail_sends: Arc::clone(&handle.fail_sends),
        };
        state.sockets.push(handle);
        Ok(Box::new(socket))
    }
}

impl Socket for MockSocket {
    fn send(&mut self, frame: String) -> TransportResult<()> {
        if self.closed.load(Ordering::SeqCst) {
            return Err(TransportError::ConnectionClosed);
        }
        if self.fail_sends.load(Ordering::SeqCst) {
            return Err(TransportError::SendFailed("mock send failure".into()));
        }
        self.sent.lock().unwrap().push(frame);
        Ok(())
    }

    fn close(&mut self) {
        self.open.store(false, Ordering::SeqCst);
        self.closed.store(true, Ordering::SeqCst);
    }

    fn is_open(&self) -> bool {
        self.open.load(Ordering::SeqCst)
    }
}

impl MockSocketHandle {
    pub fn url(&self) -> &Url {
        &self.url
    }

    /// Complete the handshake.
    pub fn open(&self) {
        self.open.store(true, Ordering::SeqCst);
        self.events.opened();
    }

    /// Deliver an inbound text frame.
    pub fn receive(&self, text: &str) {
        self.events.message(text);
    }

    /// Deliver an inbound `{channel, data}` frame.
    pub fn receive_frame(&self, channel: &str, data: Value) {
        self.receive(&json!({ "channel": channel, "data": data }).to_string());
    }

    /// Simulate the peer closing the connection.
    pub fn close_from_peer(&self) {
        self.open.store(false, Ordering::SeqCst);
        self.events.closed(Some("going away".into()));
    }

    /// Simulate a network failure.
    pub fn fail(&self, error: &str) {
        self.open.store(false, Ordering::SeqCst);
        self.events.error(error);
    }

    /// Make every later send fail.
    pub fn fail_sends(&self) {
        self.fail_sends.store(true, Ordering::SeqCst);
    }

    /// Raw frames written to this socket.
    pub fn sent(&self) -> Vec<String> {
        self.sent.lock().unwrap().clone()
    }

    /// Frames written to this socket, parsed.
    pub fn sent_json(&self) -> Vec<Value> {
        self.sent()
            .iter()
            .map(|frame| serde_json::from_str(frame).unwrap())
            .collect()
    }

    /// Whether the session closed this socket.
    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }
}

/// Sink recording every event it receives.
#[derive(Default)]
struct RecordingSink {
    events: Mutex<Vec<SocketEvent>>,
    notify: tokio::sync::Notify,
}

impl EventSink for RecordingSink {
    fn deliver(&self, event: SocketEvent) {
        self.events.lock().unwrap().push(event);
        self.notify.notify_one();
    }
}

impl RecordingSink {
    fn events(&self) -> Vec<SocketEvent> {
        self.events.lock().unwrap().clone()
    }

    async fn wait_for(&self, count: usize) -> Vec<SocketEvent> {
        tokio::time::timeout(Duration::from_secs(5), async {
            loop {
                let events = self.events();
                if events.len() >= count {
                    return events;
                }
                self.notify.notified().await;
            }
        })
        .await
        .unwrap()
    }
}

#[test]
fn test_socket_events_forward_to_sink() {
    let sink = Arc::new(RecordingSink::default());
    let events = SocketEvents::new(sink.clone());

    events.opened();
    events.message("hello");
    events.closed(None);
    events.error("boom");

    assert_eq!(
        sink.events(),
        vec![
            SocketEvent::Opened,
            SocketEvent::Message("hello".into()),
            SocketEvent::Closed(None),
            SocketEvent::Error("boom".into()),
        ]
    );
}

#[test]
fn test_mock_transport_records_sends() {
    let transport = MockTransport::new();
    let sink = Arc::new(RecordingSink::default());
    let url = Url::parse("ws://localhost:1234/pubsub").unwrap();

    let mut socket = transport.open(&url, SocketEvents::new(sink)).unwrap();
    let handle = transport.last_socket();
    assert!(!socket.is_open());

    handle.open();
    assert!(socket.is_open());

    socket.send("frame".into()).unwrap();
    assert_eq!(handle.sent(), vec!["frame".to_string()]);

    socket.close();
    assert!(handle.is_closed());
    assert!(matches!(
        socket.send("late".into()),
        Err(TransportError::ConnectionClosed)
    ));
}

#[test]
fn test_mock_transport_failing_open() {
    let transport = MockTransport::new();
    transport.fail_next_opens(1);
    let url = Url::parse("ws://localhost:1234/pubsub").unwrap();

    let first = transport.open(&url, SocketEvents::new(Arc::new(RecordingSink::default())));
    assert!(matches!(first, Err(TransportError::ConnectionFailed(_))));
    assert_eq!(transport.open_count(), 0);

    let second = transport.open(&url, SocketEvents::new(Arc::new(RecordingSink::default())));
    assert!(second.is_ok());
    assert_eq!(transport.open_count(), 1);
}

#[tokio::test]
async fn test_websocket_transport_exchanges_frames() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let server = tokio::spawn(async move {
        let (stream, _) = listener.accept().await.unwrap();
        let mut ws = tokio_tungstenite::accept_async(stream).await.unwrap();

        let received = match ws.next().await {
            Some(Ok(Message::Text(text))) => text.as_str().to_string(),
            other => panic!("unexpected frame: {:?}", other),
        };
        ws.send(Message::Text(
            r#"{"channel":"room1","data":"hi"}"#.into(),
        ))
        .await
        .unwrap();
        ws.close(None).await.unwrap();
        received
    });

    let sink = Arc::new(RecordingSink::default());
    let url = Url::parse(&format!("ws://{}/pubsub", addr)).unwrap();
    let mut socket = WebSocketTransport::new()
        .open(&url, SocketEvents::new(sink.clone()))
        .unwrap();

    let events = sink.wait_for(1).await;
    assert_eq!(events[0], SocketEvent::Opened);
    assert!(socket.is_open());

    socket
        .send(r#"{"action":"sub","channel":"room1"}"#.into())
        .unwrap();

    let events = sink.wait_for(3).await;
    assert_eq!(
        events[1],
        SocketEvent::Message(r#"{"channel":"room1","data":"hi"}"#.into())
    );
    assert!(matches!(events[2], SocketEvent::Closed(_)));

    let received = server.await.unwrap();
    assert_eq!(received, r#"{"action":"sub","channel":"room1"}"#);
}

#[tokio::test]
async fn test_websocket_transport_reports_refused_connection() {
    // Bind then drop to get a port nothing listens on
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let sink = Arc::new(RecordingSink::default());
    let url = Url::parse(&format!("ws://{}/pubsub", addr)).unwrap();
    let socket = WebSocketTransport::new()
        .open(&url, SocketEvents::new(sink.clone()))
        .unwrap();

    let events = sink.wait_for(1).await;
    assert!(matches!(events[0], SocketEvent::Error(_)));
    assert!(!socket.is_open());
}

#[tokio::test]
async fn test_websocket_shutdown_flushes_frames_sent_before_close() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let server = tokio::spawn(async move {
        let (stream, _) = listener.accept().await.unwrap();
        let mut ws = tokio_tungstenite::accept_async(stream).await.unwrap();
        let mut texts = Vec::new();
        while let Some(Ok(msg)) = ws.next().await {
            if let Message::Text(text) = msg {
                texts.push(text.as_str().to_string());
            }
        }
        texts
    });

    let sink = Arc::new(RecordingSink::default());
    let url = Url::parse(&format!("ws://{}/pubsub", addr)).unwrap();
    let transport = WebSocketTransport::new();
    let mut socket = transport
        .open(&url, SocketEvents::new(sink.clone()))
        .unwrap();
    sink.wait_for(1).await;

    socket.send("one".into()).unwrap();
    socket.send("two".into()).unwrap();
    socket.close();
    tokio::time::timeout(Duration::from_secs(5), transport.shutdown())
        .await
        .unwrap();

    let texts = tokio::time::timeout(Duration::from_secs(5), server)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(texts, vec!["one".to_string(), "two".to_string()]);
}
