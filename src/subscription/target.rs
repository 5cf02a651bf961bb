// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Delivery targets for typed updates.

use tokio::sync::mpsc;

use crate::error::DeliveryError;
use crate::types::Value;

/// Kind of a logical channel, as far as the dispatcher cares.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ChannelKind {
    /// Regular channel: updates are delivered, nothing else.
    #[default]
    Standard,
    /// Input channel of a software-only switch. Input updates are echoed to
    /// the switch's own output datapoint.
    VirtualSwitch,
}

/// The application-level channel a subscription feeds.
///
/// # Examples
///
/// ```
/// use fah_bridge::subscription::{ChannelKind, LogicalChannel};
///
/// let channel = LogicalChannel::new("switch");
/// assert_eq!(channel.kind(), ChannelKind::Standard);
///
/// let virtual_switch = LogicalChannel::virtual_switch("virtualswitch");
/// assert!(virtual_switch.is_virtual_switch());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct LogicalChannel {
    id: String,
    kind: ChannelKind,
}

impl LogicalChannel {
    /// Creates a standard channel.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            kind: ChannelKind::Standard,
        }
    }

    /// Creates a virtual switch input channel.
    #[must_use]
    pub fn virtual_switch(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            kind: ChannelKind::VirtualSwitch,
        }
    }

    /// Returns the channel id.
    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Returns the channel kind.
    #[must_use]
    pub fn kind(&self) -> ChannelKind {
        self.kind
    }

    /// Returns `true` for virtual switch channels.
    #[must_use]
    pub fn is_virtual_switch(&self) -> bool {
        self.kind == ChannelKind::VirtualSwitch
    }
}

/// A typed update as sent through a channel-based target.
#[derive(Debug, Clone, PartialEq)]
pub struct ChannelUpdate {
    /// The channel the value belongs to.
    pub channel: LogicalChannel,
    /// The converted value.
    pub value: Value,
}

/// Receives typed values for a logical channel.
///
/// Implemented for closures and for unbounded mpsc senders of
/// [`ChannelUpdate`].
pub trait UpdateTarget: Send + Sync {
    /// Accepts a value for `channel`.
    ///
    /// # Errors
    ///
    /// Returns `DeliveryError` if the target cannot take the value. The
    /// dispatcher logs it and moves on.
    fn deliver(&self, channel: &LogicalChannel, value: Value) -> Result<(), DeliveryError>;
}

impl<F> UpdateTarget for F
where
    F: Fn(&LogicalChannel, Value) -> Result<(), DeliveryError> + Send + Sync,
{
    fn deliver(&self, channel: &LogicalChannel, value: Value) -> Result<(), DeliveryError> {
        self(channel, value)
    }
}

impl UpdateTarget for mpsc::UnboundedSender<ChannelUpdate> {
    fn deliver(&self, channel: &LogicalChannel, value: Value) -> Result<(), DeliveryError> {
        self.send(ChannelUpdate {
            channel: channel.clone(),
            value,
        })
        .map_err(|_| DeliveryError::new(format!("receiver for '{}' dropped", channel.id())))
    }
}
