// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Endpoint resolution for the pubsub socket.
//!
//! The socket URL is derived from the configured HTTP endpoint:
//!
//! ```text
//! https://api.example.com  ──►  wss://api.example.com/pubsub?api_key=KEY
//! http://localhost:3000    ──►  ws://localhost:3000/_/pubsub?api_key=KEY   (internal)
//! ```
//!
//! Only the host and port of the endpoint survive; any path on the endpoint
//! is replaced by the namespace path.

use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::{Error, Result};

/// Query parameter carrying the access key.
pub const ACCESS_KEY_PARAM: &str = "api_key";

/// Which pubsub namespace a session talks to.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Namespace {
    /// Application channels (`/pubsub`).
    #[default]
    Public,
    /// Server-internal channels such as device notifications (`/_/pubsub`).
    Internal,
}

impl Namespace {
    /// URL path selecting this namespace.
    pub fn path(self) -> &'static str {
        match self {
            Namespace::Public => "/pubsub",
            Namespace::Internal => "/_/pubsub",
        }
    }
}

/// Source of the endpoint and access key.
///
/// Implemented by whatever owns the HTTP session; the pubsub engine only
/// reads from it.
pub trait CredentialProvider {
    /// Base endpoint, e.g. `https://api.example.com/`.
    fn endpoint(&self) -> String;

    /// Access key, if one has been configured.
    fn access_key(&self) -> Option<String>;
}

/// Snapshot of the connection credentials.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Credentials {
    /// Base endpoint.
    pub endpoint: String,
    /// Access key sent as the `api_key` query parameter.
    pub access_key: Option<String>,
}

impl Credentials {
    /// Creates credentials with an access key.
    pub fn new(endpoint: impl Into<String>, access_key: impl Into<String>) -> Self {
        Credentials {
            endpoint: endpoint.into(),
            access_key: Some(access_key.into()),
        }
    }

    /// Creates credentials without an access key.
    ///
    /// Sessions holding these refuse to connect.
    pub fn anonymous(endpoint: impl Into<String>) -> Self {
        Credentials {
            endpoint: endpoint.into(),
            access_key: None,
        }
    }

    /// Takes a snapshot from a provider.
    pub fn from_provider(provider: &dyn CredentialProvider) -> Self {
        Credentials {
            endpoint: provider.endpoint(),
            access_key: provider.access_key(),
        }
    }

    /// Returns true if a non-empty access key is present.
    pub fn has_access_key(&self) -> bool {
        self.access_key.as_deref().is_some_and(|key| !key.is_empty())
    }
}

impl CredentialProvider for Credentials {
    fn endpoint(&self) -> String {
        self.endpoint.clone()
    }

    fn access_key(&self) -> Option<String> {
        self.access_key.clone()
    }
}

/// Builds the socket URL for the given credentials and namespace.
///
/// # Errors
///
/// Returns [`Error::MissingAccessKey`] when no access key is present,
/// [`Error::InvalidEndpoint`] when the endpoint cannot be parsed or has no
/// host, and [`Error::UnsupportedScheme`] for schemes other than
/// http/https/ws/wss.
pub fn resolve(credentials: &Credentials, namespace: Namespace) -> Result<Url> {
    let key = credentials
        .access_key
        .as_deref()
        .filter(|key| !key.is_empty())
        .ok_or(Error::MissingAccessKey)?;

    let invalid = |reason: String| Error::InvalidEndpoint {
        endpoint: credentials.endpoint.clone(),
        reason,
    };

    let base = Url::parse(&credentials.endpoint).map_err(|e| invalid(e.to_string()))?;

    let scheme = match base.scheme() {
        "https" | "wss" => "wss",
        "http" | "ws" => "ws",
        other => return Err(Error::UnsupportedScheme(other.to_string())),
    };

    let host = base
        .host_str()
        .ok_or_else(|| invalid("missing host".to_string()))?;
    let authority = match base.port() {
        Some(port) => format!("{}:{}", host, port),
        None => host.to_string(),
    };

    let mut url = Url::parse(&format!("{}://{}{}", scheme, authority, namespace.path()))
        .map_err(|e| invalid(e.to_string()))?;
    url.query_pairs_mut().append_pair(ACCESS_KEY_PARAM, key);

    Ok(url)
}

#[cfg(test)]
#[path = "endpoint_tests.rs"]
mod tests;
