// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! A pair of sessions: one for application channels and one for the
//! internal namespace where per-device notifications arrive.

use std::sync::Arc;

use pw_core::{Credentials, Namespace};
use serde::Serialize;
use serde_json::Value;
use tracing::info;

use crate::error::PubsubResult;
use crate::listeners::ListenerId;
use crate::registry::{Handler, HandlerId};
use crate::session::{Pubsub, PubsubConfig};

/// Prefix of the internal channel carrying notifications for one device.
pub const DEVICE_CHANNEL_PREFIX: &str = "_sub_";

/// Internal channel name for `device_id`.
pub fn device_channel(device_id: &str) -> String {
    format!("{}{}", DEVICE_CHANNEL_PREFIX, device_id)
}

/// Public and internal pubsub sessions sharing one set of credentials.
///
/// Channel operations go to the public session. The internal session only
/// ever carries the device channel.
pub struct PubsubContainer {
    public: Pubsub,
    internal: Pubsub,
    auto_pubsub: bool,
    device_handler: Handler,
}

impl PubsubContainer {
    /// Create both sessions with the default WebSocket transport.
    pub fn new(config: PubsubConfig, credentials: Credentials) -> Self {
        let public = Pubsub::new(
            PubsubConfig {
                namespace: Namespace::Public,
                ..config.clone()
            },
            credentials.clone(),
        );
        let internal = Pubsub::new(
            PubsubConfig {
                namespace: Namespace::Internal,
                ..config
            },
            credentials,
        );
        Self::from_sessions(public, internal)
    }

    /// Wraps existing sessions.
    pub fn from_sessions(public: Pubsub, internal: Pubsub) -> Self {
        PubsubContainer {
            public,
            internal,
            auto_pubsub: true,
            device_handler: Arc::new(|data: &Value| {
                info!("Received data for device subscription: {}", data);
            }),
        }
    }

    /// The public-namespace session.
    pub fn public(&self) -> &Pubsub {
        &self.public
    }

    /// The internal-namespace session.
    pub fn internal(&self) -> &Pubsub {
        &self.internal
    }

    /// Whether [`reconfigure_if_needed`](Self::reconfigure_if_needed) acts.
    pub fn auto_pubsub(&self) -> bool {
        self.auto_pubsub
    }

    pub fn set_auto_pubsub(&mut self, enabled: bool) {
        self.auto_pubsub = enabled;
    }

    /// Replaces the handler for device notifications.
    ///
    /// Takes effect on the next [`reconfigure`](Self::reconfigure).
    pub fn set_device_handler<F>(&mut self, handler: F)
    where
        F: Fn(&Value) + Send + Sync + 'static,
    {
        self.device_handler = Arc::new(handler);
    }

    pub fn on<F>(&self, channel: &str, handler: F) -> PubsubResult<HandlerId>
    where
        F: Fn(&Value) + Send + Sync + 'static,
    {
        self.public.subscribe(channel, handler)
    }

    pub fn off(&self, channel: &str, handler: Option<HandlerId>) -> PubsubResult<()> {
        self.public.unsubscribe(channel, handler)
    }

    pub async fn once(&self, channel: &str) -> PubsubResult<Value> {
        self.public.once(channel).await
    }

    pub fn publish<T>(&self, channel: &str, payload: &T) -> PubsubResult<()>
    where
        T: Serialize + ?Sized,
    {
        self.public.publish(channel, payload)
    }

    pub fn has_handlers(&self, channel: &str) -> bool {
        self.public.has_handlers(channel)
    }

    pub fn on_open<F>(&self, listener: F) -> ListenerId
    where
        F: Fn() + Send + Sync + 'static,
    {
        self.public.on_open(listener)
    }

    pub fn on_close<F>(&self, listener: F) -> ListenerId
    where
        F: Fn() + Send + Sync + 'static,
    {
        self.public.on_close(listener)
    }

    /// Applies new credentials to both sessions.
    ///
    /// The internal session is reset and, when `device_id` is known,
    /// subscribed to the device channel before reconnecting. Both sessions
    /// are always reconfigured; the first error is returned.
    pub fn reconfigure(&self, credentials: Credentials, device_id: Option<&str>) -> PubsubResult<()> {
        self.internal.reset();
        if let Some(device_id) = device_id {
            let handler = Arc::clone(&self.device_handler);
            self.internal
                .subscribe(&device_channel(device_id), move |data| handler(data))?;
        }

        let internal = self.internal.reconfigure(credentials.clone());
        let public = self.public.reconfigure(credentials);
        internal.and(public)
    }

    /// [`reconfigure`](Self::reconfigure) unless auto pubsub is disabled.
    pub fn reconfigure_if_needed(
        &self,
        credentials: Credentials,
        device_id: Option<&str>,
    ) -> PubsubResult<()> {
        if !self.auto_pubsub {
            return Ok(());
        }
        self.reconfigure(credentials, device_id)
    }

    /// Closes both sessions.
    pub fn close(&self) {
        self.public.close();
        self.internal.close();
    }
}

impl std::fmt::Debug for PubsubContainer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PubsubContainer")
            .field("public", &self.public)
            .field("internal", &self.internal)
            .field("auto_pubsub", &self.auto_pubsub)
            .finish()
    }
}
