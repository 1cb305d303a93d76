// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Inbound frame dispatch.
//!
//! Malformed frames are logged and dropped. Handlers run in registration
//! order; a handler that panics is logged and the remaining handlers still
//! run.

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};

use pw_core::ServerFrame;
use tracing::{debug, error, warn};

use crate::registry::Handler;

/// Error raised by a caller-supplied callback.
#[derive(Debug, thiserror::Error)]
pub enum HandlerError {
    /// The callback panicked.
    #[error("{target} panicked: {message}")]
    Panicked { target: String, message: String },
}

/// Outcome of dispatching one frame.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DispatchReport {
    /// Channel the frame was published on.
    pub channel: String,
    /// Handlers that returned normally.
    pub delivered: usize,
    /// Handlers that panicked.
    pub failed: usize,
}

/// Parses `raw` and delivers the payload to the handlers `lookup` returns.
///
/// `lookup` is called after parsing, so it sees the registry as it is at
/// delivery time. Returns `None` for malformed frames.
pub fn on_frame<F>(raw: &str, lookup: F) -> Option<DispatchReport>
where
    F: FnOnce(&str) -> Vec<Handler>,
{
    let frame = match ServerFrame::parse(raw) {
        Ok(frame) => frame,
        Err(e) => {
            warn!("Dropping malformed pubsub frame: {}", e);
            return None;
        }
    };

    let handlers = lookup(&frame.channel);
    if handlers.is_empty() {
        debug!("No handlers for channel '{}'", frame.channel);
    }

    Some(dispatch(&frame, &handlers))
}

/// Invokes every handler with the frame payload.
pub fn dispatch(frame: &ServerFrame, handlers: &[Handler]) -> DispatchReport {
    let mut report = DispatchReport {
        channel: frame.channel.clone(),
        ..DispatchReport::default()
    };

    for handler in handlers {
        let target = format!("handler on channel '{}'", frame.channel);
        match invoke_isolated(&target, || handler(&frame.data)) {
            Ok(()) => report.delivered += 1,
            Err(e) => {
                error!("{}", e);
                report.failed += 1;
            }
        }
    }

    report
}

/// Runs `f`, turning a panic into a [`HandlerError`].
pub fn invoke_isolated<F>(target: &str, f: F) -> Result<(), HandlerError>
where
    F: FnOnce(),
{
    panic::catch_unwind(AssertUnwindSafe(f)).map_err(|payload| HandlerError::Panicked {
        target: target.to_string(),
        message: panic_message(payload.as_ref()),
    })
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "non-string panic payload".to_string()
    }
}
