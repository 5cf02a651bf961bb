// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Connection lifecycle and the inbound event loop.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use crate::config::BridgeConfig;
use crate::dispatch::Dispatcher;
use crate::error::{ConnectError, DecodeError, TransportError};
use crate::protocol::{IdentityResolver, Jid, UPDATE_NAMESPACE, decode_update};
use crate::transport::{
    IqKind, ItemPayload, OutboundStanza, PresenceKind, PubsubItem, Transport, TransportEvent,
    TransportSettings, TransportStatus,
};

use super::state::{SessionState, StatusDetail, StatusListener, StatusReport};

/// Time limits for the transport steps of a connect.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConnectTimeouts {
    /// Limit for opening the transport.
    pub connect: Duration,
    /// Limit for the login round trip and the initial presence.
    pub response: Duration,
}

impl Default for ConnectTimeouts {
    fn default() -> Self {
        Self {
            connect: TransportSettings::CONNECT_TIMEOUT,
            response: TransportSettings::RESPONSE_TIMEOUT,
        }
    }
}

/// Owns the session with the SysAP.
///
/// Cheap to clone; clones share the same session.
pub struct SessionManager<T> {
    inner: Arc<SessionInner<T>>,
}

struct SessionInner<T> {
    config: BridgeConfig,
    timeouts: ConnectTimeouts,
    transport: Arc<T>,
    dispatcher: Dispatcher,
    state: watch::Sender<SessionState>,
    last_report: Mutex<StatusReport>,
    listener: Option<Arc<dyn StatusListener>>,
    /// Serializes connect and dispose.
    lifecycle: tokio::sync::Mutex<()>,
    /// Cancelled by dispose; replaced afterwards so later connects run.
    cancel: Mutex<CancellationToken>,
    active: Mutex<Option<ActiveSession>>,
}

/// The session currently owning the transport.
struct ActiveSession {
    id: Uuid,
    jid: Jid,
    task: JoinHandle<()>,
}

/// Outcome of a successful establish.
struct Established {
    jid: Jid,
    /// Cancelled once the inbound stream of the session ends.
    stream_end: CancellationToken,
}

impl<T> Clone for SessionManager<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T: Transport> SessionManager<T> {
    /// Creates a disconnected session manager.
    #[must_use]
    pub fn new(
        config: BridgeConfig,
        timeouts: ConnectTimeouts,
        transport: Arc<T>,
        dispatcher: Dispatcher,
        state: watch::Sender<SessionState>,
        listener: Option<Arc<dyn StatusListener>>,
    ) -> Self {
        state.send_replace(SessionState::Disconnected);
        Self {
            inner: Arc::new(SessionInner {
                config,
                timeouts,
                transport,
                dispatcher,
                state,
                last_report: Mutex::new(StatusReport::default()),
                listener,
                lifecycle: tokio::sync::Mutex::new(()),
                cancel: Mutex::new(CancellationToken::new()),
                active: Mutex::new(None),
            }),
        }
    }

    /// Returns the current state.
    #[must_use]
    pub fn state(&self) -> SessionState {
        *self.inner.state.borrow()
    }

    /// Returns a receiver following every state change.
    #[must_use]
    pub fn watch_state(&self) -> watch::Receiver<SessionState> {
        self.inner.state.subscribe()
    }

    /// Returns the most recent status report.
    #[must_use]
    pub fn status(&self) -> StatusReport {
        self.inner.last_report.lock().clone()
    }

    /// Returns the address of the current session, if any.
    #[must_use]
    pub fn jid(&self) -> Option<Jid> {
        self.inner.active.lock().as_ref().map(|s| s.jid.clone())
    }

    /// Establishes a fresh session, replacing any existing one.
    ///
    /// # Errors
    ///
    /// Returns the `ConnectError` that ended the attempt. It has already
    /// been reported to the status listener, except for
    /// `ConnectError::Cancelled`, which is followed by the report of the
    /// dispose that cancelled it.
    pub async fn connect(&self) -> Result<(), ConnectError> {
        let cancel = self.inner.cancel.lock().clone();
        let _guard = tokio::select! {
            guard = self.inner.lifecycle.lock() => guard,
            () = cancel.cancelled() => return Err(ConnectError::Cancelled),
        };

        if self.teardown().await {
            self.transition(
                SessionState::Disconnected,
                StatusDetail::None,
                Some("Reconnecting".to_string()),
            );
        }

        let outcome = tokio::select! {
            outcome = self.establish() => outcome,
            () = cancel.cancelled() => Err(ConnectError::Cancelled),
        };

        match outcome {
            Ok(Established { jid, stream_end }) => {
                tracing::info!(host = %self.inner.config.host(), jid = %jid, "Connected to SysAP");
                self.transition(SessionState::Online, StatusDetail::None, None);
                // The stream may have ended between login and going online.
                if stream_end.is_cancelled() {
                    self.handle_status(TransportStatus::Disconnected);
                }
                Ok(())
            }
            Err(ConnectError::Cancelled) => {
                tracing::debug!(host = %self.inner.config.host(), "Connect cancelled by dispose");
                self.teardown().await;
                Err(ConnectError::Cancelled)
            }
            Err(e) => {
                tracing::warn!(
                    host = %self.inner.config.host(),
                    kind = ?e.kind(),
                    error = %e,
                    "Connecting to SysAP failed"
                );
                self.teardown().await;
                self.transition(
                    SessionState::Disconnected,
                    StatusDetail::from(e.kind()),
                    Some(e.to_string()),
                );
                Err(e)
            }
        }
    }

    /// Ends the session and reports the bridge as removed.
    ///
    /// Safe to call repeatedly and before any connect. A connect still in
    /// progress is cancelled first.
    pub async fn dispose(&self) {
        {
            let mut cancel = self.inner.cancel.lock();
            cancel.cancel();
            *cancel = CancellationToken::new();
        }
        let _guard = self.inner.lifecycle.lock().await;

        let had_session = self.teardown().await;
        let already_removed = {
            let last = self.inner.last_report.lock();
            last.state == SessionState::Disconnected && last.detail == StatusDetail::Removed
        };
        if already_removed && !had_session {
            tracing::debug!("Bridge already disposed");
            return;
        }

        tracing::info!(host = %self.inner.config.host(), "Bridge removed");
        self.transition(
            SessionState::Disconnected,
            StatusDetail::Removed,
            Some("Bridge removed".to_string()),
        );
    }

    /// Handles one inbound event as if it came from the current session.
    pub async fn handle_event(&self, event: TransportEvent) {
        if self.inner.config.transport_trace() {
            tracing::debug!(event = ?event, "Inbound transport event");
        }

        match event {
            TransportEvent::Message { from, node, items } => {
                self.handle_message(&from, &node, items);
            }
            TransportEvent::Presence { from, kind } => self.handle_presence(from, kind).await,
            TransportEvent::Iq { id, from, kind } => self.handle_iq(id, from, kind).await,
            TransportEvent::Status(status) => self.handle_status(status),
        }
    }

    /// Resolves the account, opens the transport and logs in.
    async fn establish(&self) -> Result<Established, ConnectError> {
        let config = &self.inner.config;
        config.validate()?;

        self.transition(SessionState::Connecting, StatusDetail::None, None);

        let jid = IdentityResolver::new(config.host())?
            .resolve(config.login())
            .await?;

        let mut settings = TransportSettings::from(config);
        settings.connect_timeout = self.inner.timeouts.connect;
        settings.response_timeout = self.inner.timeouts.response;
        let transport_error = |source: TransportError| ConnectError::Transport {
            host: config.host().to_string(),
            source,
        };

        tracing::debug!(url = %settings.websocket_url(), jid = %jid, "Opening transport");
        let events = tokio::time::timeout(
            settings.connect_timeout,
            self.inner.transport.connect(&settings, &jid),
        )
        .await
        .map_err(|_| transport_error(TransportError::Timeout(settings.connect_timeout)))?
        .map_err(transport_error)?;

        let stream_end = self.start_event_loop(jid.clone(), events);

        self.transition(SessionState::Authenticating, StatusDetail::None, None);

        let login = tokio::time::timeout(
            settings.response_timeout,
            self.inner.transport.login(jid.local(), config.password()),
        );
        tokio::select! {
            biased;
            result = login => match result {
                Ok(Ok(())) => {}
                Ok(Err(source)) => {
                    return Err(ConnectError::Authentication {
                        login: config.login().to_string(),
                        source,
                    });
                }
                Err(_) => {
                    return Err(transport_error(TransportError::Timeout(
                        settings.response_timeout,
                    )));
                }
            },
            () = stream_end.cancelled() => return Err(transport_error(TransportError::Closed)),
        }
        if stream_end.is_cancelled() {
            return Err(transport_error(TransportError::Closed));
        }

        let peer = Jid::rpc_peer();
        let subscribe = self
            .inner
            .transport
            .send(OutboundStanza::PresenceSubscribe { to: peer.clone() });
        match tokio::time::timeout(settings.response_timeout, subscribe).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => {
                tracing::warn!(peer = %peer, error = %e, "Presence subscription failed");
            }
            Err(_) => tracing::warn!(peer = %peer, "Presence subscription timed out"),
        }

        Ok(Established { jid, stream_end })
    }

    fn start_event_loop(
        &self,
        jid: Jid,
        events: mpsc::Receiver<TransportEvent>,
    ) -> CancellationToken {
        let id = Uuid::new_v4();
        let stream_end = CancellationToken::new();
        let mut active = self.inner.active.lock();
        let task = tokio::spawn(run_event_loop(
            self.clone(),
            id,
            events,
            stream_end.clone(),
        ));
        *active = Some(ActiveSession { id, jid, task });
        stream_end
    }

    /// Stops the event loop and closes the transport.
    ///
    /// Returns `true` if a session was active. State changes are left to
    /// the caller.
    async fn teardown(&self) -> bool {
        let previous = self.inner.active.lock().take();
        let Some(session) = previous else {
            return false;
        };

        tracing::debug!(session = %session.id, jid = %session.jid, "Tearing down session");
        session.task.abort();
        self.inner.transport.close().await;
        true
    }

    fn is_current(&self, id: Uuid) -> bool {
        self.inner
            .active
            .lock()
            .as_ref()
            .is_some_and(|session| session.id == id)
    }

    fn transition(&self, state: SessionState, detail: StatusDetail, message: Option<String>) {
        self.inner.state.send_replace(state);
        let report = StatusReport::new(state, detail, message);
        *self.inner.last_report.lock() = report.clone();
        tracing::debug!(state = %state, detail = ?detail, "Session state changed");
        if let Some(listener) = &self.inner.listener {
            listener.on_status(&report);
        }
    }

    fn handle_status(&self, status: TransportStatus) {
        let state = self.state();
        match status {
            TransportStatus::Disconnected if state == SessionState::Online => {
                tracing::warn!(host = %self.inner.config.host(), "Connection to SysAP lost");
                self.transition(
                    SessionState::Lost,
                    StatusDetail::ConnectionLost,
                    Some("XMPP connection lost".to_string()),
                );
            }
            TransportStatus::Authenticated if state == SessionState::Lost => {
                tracing::info!(host = %self.inner.config.host(), "Connection to SysAP restored");
                self.transition(SessionState::Online, StatusDetail::None, None);
            }
            other => {
                tracing::debug!(status = ?other, state = %state, "Ignoring transport status");
            }
        }
    }

    fn handle_message(&self, from: &str, node: &str, items: Vec<PubsubItem>) {
        if node != UPDATE_NAMESPACE {
            tracing::trace!(from = %from, node = %node, "Ignoring message on foreign node");
            return;
        }

        for item in items {
            match item.payload {
                ItemPayload::Update { data } => self.dispatch_update(&data),
                ItemPayload::Other(payload) => {
                    tracing::trace!(item = ?item.id, payload = %payload, "Ignoring non-update item");
                }
            }
        }
    }

    fn dispatch_update(&self, data: &str) {
        for result in decode_update(data) {
            match result {
                Ok(update) => {
                    self.inner.dispatcher.dispatch(
                        &update.serial,
                        &update.channel,
                        &update.datapoint,
                        &update.value,
                    );
                }
                Err(e @ DecodeError::MissingField { .. }) => {
                    tracing::warn!(error = %e, "Skipping malformed datapoint");
                }
                Err(e) => {
                    tracing::error!(error = %e, "Cannot decode update payload");
                }
            }
        }
    }

    async fn handle_presence(&self, from: Jid, kind: PresenceKind) {
        if kind != PresenceKind::Subscribe {
            tracing::trace!(from = %from, kind = ?kind, "Ignoring presence");
            return;
        }

        tracing::debug!(from = %from, "Approving presence subscription");
        if let Err(e) = self
            .inner
            .transport
            .send(OutboundStanza::PresenceApprove { to: from.clone() })
            .await
        {
            tracing::warn!(from = %from, error = %e, "Approving presence subscription failed");
        }
    }

    async fn handle_iq(&self, id: String, from: Option<Jid>, kind: IqKind) {
        if kind != IqKind::Set {
            tracing::trace!(id = %id, kind = ?kind, "Ignoring IQ");
            return;
        }

        if let Err(e) = self
            .inner
            .transport
            .send(OutboundStanza::IqResult { to: from, id: id.clone() })
            .await
        {
            tracing::warn!(id = %id, error = %e, "Acknowledging IQ failed");
        }
    }
}

impl<T> fmt::Debug for SessionManager<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionManager")
            .field("host", &self.inner.config.host())
            .field("state", &*self.inner.state.borrow())
            .finish_non_exhaustive()
    }
}

/// Drains the inbound events of one session.
async fn run_event_loop<T: Transport>(
    session: SessionManager<T>,
    id: Uuid,
    mut events: mpsc::Receiver<TransportEvent>,
    stream_end: CancellationToken,
) {
    tracing::debug!(session = %id, "Event loop started");

    while let Some(event) = events.recv().await {
        if !session.is_current(id) {
            tracing::debug!(session = %id, "Dropping event from stale session");
            return;
        }
        session.handle_event(event).await;
    }

    tracing::debug!(session = %id, "Transport event stream ended");
    stream_end.cancel();
    if session.is_current(id) {
        session.handle_status(TransportStatus::Disconnected);
    }
}
