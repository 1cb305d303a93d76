// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Outbound queue for publishes issued while disconnected.
//!
//! Entries live in memory only and are flushed to the server in submission
//! order when the connection opens. The queue is unbounded unless a
//! [`QueueLimit`] is configured.

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::warn;

/// Error type for queue operations.
#[derive(Debug, thiserror::Error)]
pub enum QueueError {
    /// Queue is at capacity and the overflow policy rejects new entries.
    #[error("outbound queue is full ({capacity} pending publishes)")]
    Full { capacity: usize },
}

/// Result type for queue operations.
pub type QueueResult<T> = Result<T, QueueError>;

/// A publish waiting for the connection.
#[derive(Debug, Clone, PartialEq)]
pub struct QueuedPublish {
    /// Target channel.
    pub channel: String,
    /// Payload.
    pub data: Value,
}

/// What happens to a publish that arrives when the queue is full.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum OverflowPolicy {
    /// Evict the oldest queued publish to make room.
    #[default]
    DropOldest,
    /// Refuse the new publish.
    Reject,
}

/// Capacity bound for the outbound queue.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueueLimit {
    /// Maximum number of queued publishes.
    pub max_len: usize,
    /// Behavior once `max_len` is reached.
    pub overflow: OverflowPolicy,
}

/// FIFO buffer of publishes.
#[derive(Debug, Default)]
pub struct OutboundQueue {
    entries: VecDeque<QueuedPublish>,
    limit: Option<QueueLimit>,
}

impl OutboundQueue {
    /// Creates an unbounded queue.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a queue with an optional capacity bound.
    pub fn with_limit(limit: Option<QueueLimit>) -> Self {
        OutboundQueue {
            entries: VecDeque::new(),
            limit,
        }
    }

    /// Appends a publish.
    ///
    /// Returns the evicted entry when the queue was full under
    /// [`OverflowPolicy::DropOldest`].
    pub fn enqueue(&mut self, publish: QueuedPublish) -> QueueResult<Option<QueuedPublish>> {
        let mut evicted = None;

        if let Some(limit) = self.limit {
            if self.entries.len() >= limit.max_len {
                match limit.overflow {
                    OverflowPolicy::Reject => {
                        return Err(QueueError::Full {
                            capacity: limit.max_len,
                        })
                    }
                    OverflowPolicy::DropOldest => {
                        evicted = self.entries.pop_front();
                        if let Some(ref dropped) = evicted {
                            warn!(
                                "Outbound queue full ({}), dropping oldest publish to '{}'",
                                limit.max_len, dropped.channel
                            );
                        }
                    }
                }
            }
        }

        // A zero-capacity DropOldest queue keeps nothing
        if self.limit.is_some_and(|limit| limit.max_len == 0) {
            return Ok(Some(publish));
        }

        self.entries.push_back(publish);
        Ok(evicted)
    }

    /// Removes and returns every entry in submission order.
    pub fn drain_in_order(&mut self) -> Vec<QueuedPublish> {
        self.entries.drain(..).collect()
    }

    /// Puts entries back at the head of the queue, ahead of anything queued since.
    ///
    /// Used when a flush is interrupted; the capacity bound is not applied.
    pub fn requeue_front(&mut self, publishes: Vec<QueuedPublish>) {
        for publish in publishes.into_iter().rev() {
            self.entries.push_front(publish);
        }
    }

    /// Get the number of queued publishes.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if the queue is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Clear all queued publishes.
    pub fn clear(&mut self) {
        self.entries.clear();
    }
}
