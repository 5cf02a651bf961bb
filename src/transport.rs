// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! The messaging session used by the bridge.
//!
//! The bridge does not speak the wire protocol itself. A [`Transport`]
//! opens an authenticated websocket session to the SysAP, hands inbound
//! stanzas to the bridge as [`TransportEvent`]s and performs remote calls.
//!
//! ```text
//! Transport::connect ──► mpsc::Receiver<TransportEvent> ──► session event loop
//!                                                              │
//!         Transport::send ◄── presence approvals, IQ acks ◄────┘
//!         Transport::call ◄── RpcGateway (setDatapoint, getAll)
//! ```

use std::future::Future;
use std::time::Duration;

use tokio::sync::mpsc;

use crate::config::BridgeConfig;
use crate::error::TransportError;
use crate::protocol::{Jid, RpcCall, RpcValue, SYSAP_DOMAIN, UPDATE_NAMESPACE};

/// Parameters for opening the websocket session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportSettings {
    /// SysAP host.
    pub host: String,
    /// Websocket port.
    pub port: u16,
    /// Websocket path.
    pub path: String,
    /// Messaging domain.
    pub domain: String,
    /// SASL mechanism.
    pub mechanism: String,
    /// Limit for establishing the connection.
    pub connect_timeout: Duration,
    /// Limit for a single stanza round trip.
    pub response_timeout: Duration,
    /// Log every inbound stanza.
    pub trace: bool,
}

impl TransportSettings {
    /// Websocket path of the SysAP.
    pub const PATH: &'static str = "/xmpp-websocket/";
    /// SASL mechanism accepted by the SysAP.
    pub const MECHANISM: &'static str = "SCRAM-SHA-1";
    /// Default connection timeout.
    pub const CONNECT_TIMEOUT: Duration = Duration::from_secs(30);
    /// Default response timeout.
    pub const RESPONSE_TIMEOUT: Duration = Duration::from_secs(30);

    /// Returns the websocket URL.
    #[must_use]
    pub fn websocket_url(&self) -> String {
        format!("ws://{}:{}{}", self.host, self.port, self.path)
    }
}

impl From<&BridgeConfig> for TransportSettings {
    fn from(config: &BridgeConfig) -> Self {
        Self {
            host: config.host().to_string(),
            port: config.port(),
            path: Self::PATH.to_string(),
            domain: SYSAP_DOMAIN.to_string(),
            mechanism: Self::MECHANISM.to_string(),
            connect_timeout: Self::CONNECT_TIMEOUT,
            response_timeout: Self::RESPONSE_TIMEOUT,
            trace: config.transport_trace(),
        }
    }
}

/// Connection status changes reported by the transport.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TransportStatus {
    /// The stream is open but not yet authenticated.
    Connected,
    /// The session (re-)authenticated.
    Authenticated,
    /// The connection dropped.
    Disconnected,
}

/// Type of a presence stanza.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PresenceKind {
    /// Peer is available.
    Available,
    /// Peer went away.
    Unavailable,
    /// Peer asks to subscribe to our presence.
    Subscribe,
    /// Peer approved our subscription.
    Subscribed,
    /// Peer cancels its subscription.
    Unsubscribe,
    /// Peer revoked our subscription.
    Unsubscribed,
}

/// Type of an IQ stanza.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IqKind {
    /// Query.
    Get,
    /// Request to change something.
    Set,
    /// Answer.
    Result,
    /// Failure.
    Error,
}

/// Payload of a pubsub item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ItemPayload {
    /// An update item; `data` is the escaped project document.
    Update {
        /// Escaped project document.
        data: String,
    },
    /// Any other payload, kept verbatim for logging.
    Other(String),
}

/// One pubsub item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PubsubItem {
    /// Item id, if any.
    pub id: Option<String>,
    /// Item payload.
    pub payload: ItemPayload,
}

impl PubsubItem {
    /// Creates an update item carrying `data`.
    #[must_use]
    pub fn update(data: impl Into<String>) -> Self {
        Self {
            id: None,
            payload: ItemPayload::Update { data: data.into() },
        }
    }
}

/// An inbound event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportEvent {
    /// A pubsub event message.
    Message {
        /// Sender address as received.
        from: String,
        /// Pubsub node.
        node: String,
        /// Items in the event.
        items: Vec<PubsubItem>,
    },
    /// A presence stanza.
    Presence {
        /// Sender.
        from: Jid,
        /// Presence type.
        kind: PresenceKind,
    },
    /// An IQ stanza.
    Iq {
        /// Stanza id, echoed in the answer.
        id: String,
        /// Sender, if given.
        from: Option<Jid>,
        /// IQ type.
        kind: IqKind,
    },
    /// A connection status change.
    Status(TransportStatus),
}

impl TransportEvent {
    /// Builds an update message from the SysAP with the given items.
    #[must_use]
    pub fn update(items: impl IntoIterator<Item = PubsubItem>) -> Self {
        Self::Message {
            from: format!("pubsub.{SYSAP_DOMAIN}"),
            node: UPDATE_NAMESPACE.to_string(),
            items: items.into_iter().collect(),
        }
    }
}

/// An outbound stanza that needs no answer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutboundStanza {
    /// Ask `to` for a presence subscription.
    PresenceSubscribe {
        /// Peer to subscribe to.
        to: Jid,
    },
    /// Approve a presence subscription request from `to`.
    PresenceApprove {
        /// Requesting peer.
        to: Jid,
    },
    /// Answer an IQ `set` with an empty result.
    IqResult {
        /// Original sender.
        to: Option<Jid>,
        /// Original stanza id.
        id: String,
    },
}

/// An authenticated messaging session to the SysAP.
///
/// Implementations own the websocket stream. A single transport value is
/// reused across reconnects: `connect` replaces any previous stream.
pub trait Transport: Send + Sync + 'static {
    /// Opens the stream for `jid` and returns its inbound events.
    ///
    /// The receiver ends when the stream is closed.
    ///
    /// # Errors
    ///
    /// Returns `TransportError::ConnectionFailed` if the SysAP cannot be
    /// reached.
    fn connect(
        &self,
        settings: &TransportSettings,
        jid: &Jid,
    ) -> impl Future<Output = Result<mpsc::Receiver<TransportEvent>, TransportError>> + Send;

    /// Authenticates the open stream.
    ///
    /// # Errors
    ///
    /// Returns `TransportError::AuthenticationFailed` if the credentials
    /// are rejected.
    fn login(
        &self,
        user: &str,
        password: &str,
    ) -> impl Future<Output = Result<(), TransportError>> + Send;

    /// Sends a stanza.
    ///
    /// # Errors
    ///
    /// Returns `TransportError::Send` or `TransportError::Closed`.
    fn send(&self, stanza: OutboundStanza)
    -> impl Future<Output = Result<(), TransportError>> + Send;

    /// Performs a remote call and waits for its answer.
    ///
    /// # Errors
    ///
    /// Returns `TransportError::Remote` if the peer answers with an error.
    fn call(
        &self,
        to: &Jid,
        call: &RpcCall,
    ) -> impl Future<Output = Result<RpcValue, TransportError>> + Send;

    /// Closes the stream. Closing a closed transport does nothing.
    fn close(&self) -> impl Future<Output = ()> + Send;
}
