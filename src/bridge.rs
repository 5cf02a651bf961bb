// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! The bridge facade used by device collaborators.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;

use crate::config::BridgeConfig;
use crate::dispatch::{DispatchOutcome, Dispatcher};
use crate::error::{ConfigError, ConnectError, RpcError};
use crate::gateway::RpcGateway;
use crate::session::{ConnectTimeouts, SessionManager, SessionState, StatusListener, StatusReport};
use crate::subscription::{LogicalChannel, Subscription, SubscriptionTable, UpdateTarget};
use crate::transport::{Transport, TransportEvent};
use crate::types::{Converter, DatapointAddress, SubscriptionKey};

/// A bridge to one SysAP.
///
/// Cheap to clone; clones share the session and the subscription table.
///
/// # Examples
///
/// ```ignore
/// use std::sync::Arc;
/// use fah_bridge::{Bridge, BridgeConfig, Converter, LogicalChannel, SubscriptionKey};
/// use tokio::sync::mpsc;
///
/// let bridge = Bridge::builder()
///     .config(BridgeConfig::new("192.168.1.10", "installer", "secret"))
///     .transport(my_transport)
///     .status_listener(|report: &fah_bridge::StatusReport| {
///         println!("bridge is {}", report.state);
///     })
///     .build()?;
///
/// let (tx, mut rx) = mpsc::unbounded_channel();
/// bridge.register(
///     SubscriptionKey::new("ABB700D12345", "ch0000", "odp0000"),
///     LogicalChannel::new("switch"),
///     Arc::new(tx),
///     Converter::OnOff,
/// );
///
/// bridge.connect().await?;
/// while let Some(update) = rx.recv().await {
///     println!("{} = {}", update.channel.id(), update.value);
/// }
/// ```
pub struct Bridge<T> {
    inner: Arc<BridgeInner<T>>,
}

struct BridgeInner<T> {
    config: BridgeConfig,
    table: Arc<SubscriptionTable>,
    dispatcher: Dispatcher,
    session: SessionManager<T>,
    gateway: RpcGateway<T>,
}

impl<T> Clone for Bridge<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T: Transport> Bridge<T> {
    /// Creates a builder.
    #[must_use]
    pub fn builder() -> BridgeBuilder<T> {
        BridgeBuilder::default()
    }

    /// Creates a bridge with default settings and no status listener.
    #[must_use]
    pub fn new(config: BridgeConfig, transport: T) -> Self {
        Self::assemble(
            config,
            Arc::new(transport),
            None,
            ConnectTimeouts::default(),
            RpcGateway::<T>::DEFAULT_TIMEOUT,
        )
    }

    fn assemble(
        config: BridgeConfig,
        transport: Arc<T>,
        listener: Option<Arc<dyn StatusListener>>,
        timeouts: ConnectTimeouts,
        rpc_timeout: Duration,
    ) -> Self {
        let (state_tx, state_rx) = watch::channel(SessionState::Disconnected);
        let table = Arc::new(SubscriptionTable::new());
        let gateway = RpcGateway::with_timeout(Arc::clone(&transport), state_rx, rpc_timeout);
        let dispatcher = Dispatcher::new(Arc::clone(&table), Arc::new(gateway.clone()));
        let session = SessionManager::new(
            config.clone(),
            timeouts,
            transport,
            dispatcher.clone(),
            state_tx,
            listener,
        );

        Self {
            inner: Arc::new(BridgeInner {
                config,
                table,
                dispatcher,
                session,
                gateway,
            }),
        }
    }

    /// Connects to the SysAP, replacing any existing session.
    ///
    /// # Errors
    ///
    /// Returns the failure that ended the attempt; see
    /// [`ConnectError::kind`].
    pub async fn connect(&self) -> Result<(), ConnectError> {
        self.inner.session.connect().await
    }

    /// Ends the session and reports the bridge as removed.
    ///
    /// Cancels a connect that is still in progress. Subscriptions are kept.
    pub async fn dispose(&self) {
        self.inner.session.dispose().await;
    }

    /// Registers `target` for updates of `key`.
    ///
    /// Returns the subscription that was replaced, if any.
    pub fn register(
        &self,
        key: SubscriptionKey,
        channel: LogicalChannel,
        target: Arc<dyn UpdateTarget>,
        converter: Converter,
    ) -> Option<Arc<Subscription>> {
        self.inner.table.register(key, channel, target, converter)
    }

    /// Removes the subscription for `key`.
    pub fn unregister(&self, key: &SubscriptionKey) -> bool {
        self.inner.table.unregister(key)
    }

    /// Feeds one datapoint value through the dispatch path.
    pub fn notify(
        &self,
        serial: &str,
        channel: &str,
        datapoint: &str,
        raw: &str,
    ) -> DispatchOutcome {
        self.inner.dispatcher.dispatch(serial, channel, datapoint, raw)
    }

    /// Handles an inbound transport event.
    ///
    /// The event loop calls this for every event of the active session; it
    /// may also be called directly from any task.
    pub async fn handle_event(&self, event: TransportEvent) {
        self.inner.session.handle_event(event).await;
    }

    /// Writes `value` to a datapoint.
    ///
    /// # Errors
    ///
    /// See [`RpcGateway::set_datapoint`].
    pub async fn set_datapoint(
        &self,
        address: &DatapointAddress,
        value: &str,
    ) -> Result<(), RpcError> {
        self.inner.gateway.set_datapoint(address, value).await
    }

    /// Fetches the full project description.
    ///
    /// # Errors
    ///
    /// See [`RpcGateway::get_all`].
    pub async fn get_all(&self) -> Result<String, RpcError> {
        self.inner.gateway.get_all().await
    }

    /// Returns the response of the last successful [`get_all`](Self::get_all).
    #[must_use]
    pub fn last_response(&self) -> Option<String> {
        self.inner.gateway.last_response()
    }

    /// Returns `true` if the session is online.
    #[must_use]
    pub fn is_online(&self) -> bool {
        self.state().is_online()
    }

    /// Returns the session state.
    #[must_use]
    pub fn state(&self) -> SessionState {
        self.inner.session.state()
    }

    /// Returns a receiver following every state change.
    #[must_use]
    pub fn watch_state(&self) -> watch::Receiver<SessionState> {
        self.inner.session.watch_state()
    }

    /// Returns the most recent status report.
    #[must_use]
    pub fn status(&self) -> StatusReport {
        self.inner.session.status()
    }

    /// Returns whether collaborators should create placeholder things.
    #[must_use]
    pub fn dummy_things_enabled(&self) -> bool {
        self.inner.config.dummy_things_enabled()
    }

    /// Returns the configuration.
    #[must_use]
    pub fn config(&self) -> &BridgeConfig {
        &self.inner.config
    }

    /// Returns the subscription table.
    #[must_use]
    pub fn subscriptions(&self) -> &Arc<SubscriptionTable> {
        &self.inner.table
    }
}

impl<T> fmt::Debug for Bridge<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Bridge")
            .field("config", &self.inner.config)
            .field("session", &self.inner.session)
            .field("subscriptions", &self.inner.table)
            .finish_non_exhaustive()
    }
}

/// Builder for [`Bridge`].
pub struct BridgeBuilder<T> {
    config: Option<BridgeConfig>,
    transport: Option<Arc<T>>,
    listener: Option<Arc<dyn StatusListener>>,
    timeouts: ConnectTimeouts,
    rpc_timeout: Option<Duration>,
}

impl<T> Default for BridgeBuilder<T> {
    fn default() -> Self {
        Self {
            config: None,
            transport: None,
            listener: None,
            timeouts: ConnectTimeouts::default(),
            rpc_timeout: None,
        }
    }
}

impl<T: Transport> BridgeBuilder<T> {
    /// Sets the configuration.
    #[must_use]
    pub fn config(mut self, config: BridgeConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Sets the transport.
    #[must_use]
    pub fn transport(mut self, transport: T) -> Self {
        self.transport = Some(Arc::new(transport));
        self
    }

    /// Sets a transport shared with other code.
    #[must_use]
    pub fn shared_transport(mut self, transport: Arc<T>) -> Self {
        self.transport = Some(transport);
        self
    }

    /// Sets the listener for status transitions.
    #[must_use]
    pub fn status_listener(mut self, listener: impl StatusListener + 'static) -> Self {
        self.listener = Some(Arc::new(listener));
        self
    }

    /// Overrides the limit for opening the transport.
    #[must_use]
    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.timeouts.connect = timeout;
        self
    }

    /// Overrides the limit for the login round trip.
    #[must_use]
    pub fn login_timeout(mut self, timeout: Duration) -> Self {
        self.timeouts.response = timeout;
        self
    }

    /// Overrides the remote call timeout.
    #[must_use]
    pub fn rpc_timeout(mut self, timeout: Duration) -> Self {
        self.rpc_timeout = Some(timeout);
        self
    }

    /// Builds the bridge. Connecting is a separate step.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::MissingField` if the configuration or the
    /// transport is not set.
    pub fn build(self) -> Result<Bridge<T>, ConfigError> {
        let config = self.config.ok_or(ConfigError::MissingField("config"))?;
        let transport = self
            .transport
            .ok_or(ConfigError::MissingField("transport"))?;

        Ok(Bridge::assemble(
            config,
            transport,
            self.listener,
            self.timeouts,
            self.rpc_timeout
                .unwrap_or(RpcGateway::<T>::DEFAULT_TIMEOUT),
        ))
    }
}

impl<T> fmt::Debug for BridgeBuilder<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BridgeBuilder")
            .field("config", &self.config)
            .field("has_transport", &self.transport.is_some())
            .field("has_listener", &self.listener.is_some())
            .field("timeouts", &self.timeouts)
            .field("rpc_timeout", &self.rpc_timeout)
            .finish()
    }
}
