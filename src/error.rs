// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Error types for the bridge.
//!
//! The hierarchy mirrors how failures are handled:
//!
//! - [`ConnectError`] ends a connection attempt and is reported to the
//!   status listener. [`ConnectError::kind`] tells "fix your credentials"
//!   apart from "host unreachable".
//! - [`RpcError`] is returned to callers of outbound calls, who log it and
//!   carry on.
//! - [`DecodeError`] and [`DeliveryError`] are recovered locally by the
//!   inbound event path and only ever logged.

use std::time::Duration;

use thiserror::Error;

/// The main error type for this library.
#[derive(Debug, Error)]
pub enum Error {
    /// Establishing the session failed.
    #[error("connect error: {0}")]
    Connect(#[from] ConnectError),

    /// An outbound remote call failed.
    #[error("remote call error: {0}")]
    Rpc(#[from] RpcError),

    /// An update payload could not be decoded.
    #[error("decode error: {0}")]
    Decode(#[from] DecodeError),

    /// The transport reported a failure.
    #[error("transport error: {0}")]
    Transport(#[from] TransportError),

    /// A value was outside its allowed domain.
    #[error("value error: {0}")]
    Value(#[from] ValueError),

    /// The bridge configuration is invalid.
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),
}

/// Broad classification of a connection failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FailureKind {
    /// Bad credentials or an unknown login. Terminal until the
    /// configuration changes.
    Configuration,
    /// Host unreachable or a transport-level failure.
    Communication,
}

/// Errors that abort a connection attempt.
#[derive(Debug, Error)]
pub enum ConnectError {
    /// The configuration was rejected before any I/O.
    #[error(transparent)]
    InvalidConfig(#[from] ConfigError),

    /// No account in `settings.json` matches the configured login.
    #[error("no SysAP account (JID) found for login '{login}'")]
    IdentityNotFound {
        /// The login that was looked up.
        login: String,
    },

    /// Fetching or parsing `settings.json` failed.
    #[error("identity lookup failed: {0}")]
    IdentityLookup(String),

    /// The matching account carries an address that does not parse.
    #[error("SysAP account for login '{login}' has an invalid JID: {source}")]
    InvalidIdentity {
        /// The login that was looked up.
        login: String,
        /// Why the address was rejected.
        #[source]
        source: ValueError,
    },

    /// Opening the transport failed.
    #[error("cannot connect to SysAP at {host}: {source}")]
    Transport {
        /// The configured host.
        host: String,
        /// The underlying transport failure.
        #[source]
        source: TransportError,
    },

    /// The SysAP rejected the credentials.
    #[error("login on SysAP with login name '{login}' failed: {source}")]
    Authentication {
        /// The configured login.
        login: String,
        /// The underlying transport failure.
        #[source]
        source: TransportError,
    },

    /// The attempt was cancelled by a dispose.
    #[error("connection attempt cancelled")]
    Cancelled,
}

impl ConnectError {
    /// Returns whether this failure is a configuration or communication
    /// problem.
    #[must_use]
    pub fn kind(&self) -> FailureKind {
        match self {
            Self::InvalidConfig(_)
            | Self::IdentityNotFound { .. }
            | Self::InvalidIdentity { .. }
            | Self::Authentication { .. } => FailureKind::Configuration,
            Self::IdentityLookup(_) | Self::Transport { .. } | Self::Cancelled => {
                FailureKind::Communication
            }
        }
    }
}

/// Errors returned by outbound remote calls.
#[derive(Debug, Error)]
pub enum RpcError {
    /// The session is not online; no I/O was attempted.
    #[error("bridge is not connected")]
    NotConnected,

    /// The call did not complete in time.
    #[error("remote call timed out after {} ms", .0.as_millis())]
    Timeout(Duration),

    /// The transport failed the call.
    #[error("remote call failed: {0}")]
    Remote(#[from] TransportError),
}

/// Errors reported by a [`Transport`](crate::transport::Transport)
/// implementation.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TransportError {
    /// The connection could not be established.
    #[error("connection failed: {0}")]
    ConnectionFailed(String),

    /// Authentication was rejected.
    #[error("authentication failed: {0}")]
    AuthenticationFailed(String),

    /// The session is closed.
    #[error("session closed")]
    Closed,

    /// The remote side answered a call with an error.
    #[error("remote error: {0}")]
    Remote(String),

    /// Sending a stanza failed.
    #[error("send failed: {0}")]
    Send(String),

    /// The peer did not answer in time.
    #[error("no answer within {} ms", .0.as_millis())]
    Timeout(Duration),
}

/// Errors decoding an inbound update payload.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DecodeError {
    /// The escaped payload contained an invalid entity.
    #[error("invalid escape sequence: {0}")]
    Escape(String),

    /// The payload is not well-formed XML.
    #[error("malformed XML: {0}")]
    Xml(String),

    /// A datapoint is missing a required part.
    #[error("datapoint {context} is missing {field}")]
    MissingField {
        /// Where in the tree the datapoint sits.
        context: String,
        /// The missing part.
        field: &'static str,
    },
}

/// Error raised by a delivery target.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("delivery failed: {0}")]
pub struct DeliveryError(pub String);

impl DeliveryError {
    /// Creates a delivery error from any message.
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }
}

/// Errors related to value validation.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValueError {
    /// A numeric value is outside the allowed range.
    #[error("value {actual} is out of range [{min}, {max}]")]
    OutOfRange {
        /// Minimum allowed value.
        min: u16,
        /// Maximum allowed value.
        max: u16,
        /// The actual value that was provided.
        actual: u16,
    },

    /// An invalid on/off string was provided.
    #[error("invalid on/off state: {0}")]
    InvalidOnOff(String),

    /// A datapoint address did not have the `serial/channel/datapoint` form.
    #[error("invalid datapoint address: {0}")]
    InvalidAddress(String),

    /// A session address was not of the form `local@domain[/resource]`.
    #[error("invalid JID: {0}")]
    InvalidJid(String),
}

/// Errors in the bridge configuration.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// A required field is empty.
    #[error("missing required field: {0}")]
    MissingField(&'static str),

    /// The configuration document could not be parsed.
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

/// A specialized Result type for this library.
pub type Result<T> = std::result::Result<T, Error>;
