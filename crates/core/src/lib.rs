// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! pw-core: Shared primitives for the pubwire pubsub client
//!
//! This crate provides the wire frames, the endpoint resolver and the error
//! types used by both the pw-client library and the pubwire CLI.

pub mod endpoint;
pub mod error;
pub mod protocol;

pub use endpoint::{resolve, CredentialProvider, Credentials, Namespace};
pub use error::{Error, Result};
pub use protocol::{ClientFrame, ServerFrame};
