// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Outbound remote calls to the SysAP.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::sync::watch;

use crate::dispatch::EchoWriter;
use crate::error::RpcError;
use crate::protocol::{Jid, RpcCall, RpcValue};
use crate::session::SessionState;
use crate::transport::Transport;
use crate::types::DatapointAddress;

/// Issues `setDatapoint` and `getAll` calls over the active transport.
///
/// Calls fail fast with [`RpcError::NotConnected`] unless the session is
/// online, and are bounded by a timeout.
pub struct RpcGateway<T> {
    inner: Arc<GatewayInner<T>>,
}

struct GatewayInner<T> {
    transport: Arc<T>,
    state: watch::Receiver<SessionState>,
    peer: Jid,
    timeout: Duration,
    last_response: Mutex<Option<String>>,
}

impl<T> Clone for RpcGateway<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T: Transport> RpcGateway<T> {
    /// Default limit for a remote call.
    pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(20);

    /// Creates a gateway with the default timeout.
    #[must_use]
    pub fn new(transport: Arc<T>, state: watch::Receiver<SessionState>) -> Self {
        Self::with_timeout(transport, state, Self::DEFAULT_TIMEOUT)
    }

    /// Creates a gateway with a custom timeout.
    #[must_use]
    pub fn with_timeout(
        transport: Arc<T>,
        state: watch::Receiver<SessionState>,
        timeout: Duration,
    ) -> Self {
        Self {
            inner: Arc::new(GatewayInner {
                transport,
                state,
                peer: Jid::rpc_peer(),
                timeout,
                last_response: Mutex::new(None),
            }),
        }
    }

    /// Returns `true` if the session is online.
    #[must_use]
    pub fn is_online(&self) -> bool {
        self.inner.state.borrow().is_online()
    }

    /// Returns the call timeout.
    #[must_use]
    pub fn timeout(&self) -> Duration {
        self.inner.timeout
    }

    /// Writes `value` to a datapoint.
    ///
    /// # Errors
    ///
    /// Returns `RpcError::NotConnected` if the session is not online,
    /// `RpcError::Timeout` or `RpcError::Remote` if the call fails.
    pub async fn set_datapoint(
        &self,
        address: &DatapointAddress,
        value: &str,
    ) -> Result<(), RpcError> {
        self.call(RpcCall::set_datapoint(address, value)).await?;
        Ok(())
    }

    /// Fetches the full project description and keeps it as the last
    /// response.
    ///
    /// # Errors
    ///
    /// Same as [`set_datapoint`](Self::set_datapoint).
    pub async fn get_all(&self) -> Result<String, RpcError> {
        let response = match self.call(RpcCall::get_all()).await? {
            RpcValue::String(s) => s,
            other => other.to_string(),
        };
        *self.inner.last_response.lock() = Some(response.clone());
        Ok(response)
    }

    /// Returns the response of the last successful `getAll`.
    #[must_use]
    pub fn last_response(&self) -> Option<String> {
        self.inner.last_response.lock().clone()
    }

    async fn call(&self, call: RpcCall) -> Result<RpcValue, RpcError> {
        if !self.is_online() {
            tracing::debug!(call = %call.method(), "Not online, skipping remote call");
            return Err(RpcError::NotConnected);
        }

        tracing::debug!(peer = %self.inner.peer, call = %call, "Sending remote call");

        let request = self.inner.transport.call(&self.inner.peer, &call);
        match tokio::time::timeout(self.inner.timeout, request).await {
            Ok(Ok(value)) => {
                tracing::trace!(call = %call.method(), response = %value, "Remote call answered");
                Ok(value)
            }
            Ok(Err(e)) => Err(RpcError::Remote(e)),
            Err(_) => Err(RpcError::Timeout(self.inner.timeout)),
        }
    }
}

impl<T: Transport> EchoWriter for RpcGateway<T> {
    fn echo(&self, address: DatapointAddress, value: String) {
        let Ok(runtime) = tokio::runtime::Handle::try_current() else {
            tracing::warn!(address = %address, "No runtime available for echo write");
            return;
        };

        let gateway = self.clone();
        runtime.spawn(async move {
            if let Err(e) = gateway.set_datapoint(&address, &value).await {
                tracing::warn!(address = %address, value = %value, error = %e, "Echo write failed");
            }
        });
    }
}

impl<T> fmt::Debug for RpcGateway<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RpcGateway")
            .field("peer", &self.inner.peer)
            .field("timeout", &self.inner.timeout)
            .finish_non_exhaustive()
    }
}
