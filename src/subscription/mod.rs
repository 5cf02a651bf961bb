// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Subscriptions of application channels to SysAP datapoints.
//!
//! # Overview
//!
//! - [`SubscriptionTable`] - Concurrent map from [`SubscriptionKey`] to [`Subscription`]
//! - [`UpdateTarget`] - Capability to accept a typed value for a [`LogicalChannel`]
//! - [`LogicalChannel`] - Application channel id plus its [`ChannelKind`]
//!
//! Subscriptions are independent of the session: they survive reconnects
//! and are only removed by an explicit unregister.
//!
//! # Usage
//!
//! ```
//! use std::sync::Arc;
//! use fah_bridge::subscription::{ChannelUpdate, LogicalChannel, SubscriptionTable};
//! use fah_bridge::types::{Converter, SubscriptionKey};
//! use tokio::sync::mpsc;
//!
//! let table = SubscriptionTable::new();
//! let (tx, _rx) = mpsc::unbounded_channel::<ChannelUpdate>();
//!
//! table.register(
//!     SubscriptionKey::new("ABB700D12345", "ch0000", "odp0000"),
//!     LogicalChannel::new("switch"),
//!     Arc::new(tx),
//!     Converter::OnOff,
//! );
//! assert_eq!(table.len(), 1);
//! ```
//!
//! [`SubscriptionKey`]: crate::types::SubscriptionKey

mod table;
mod target;

pub use table::{Subscription, SubscriptionTable};
pub use target::{ChannelKind, ChannelUpdate, LogicalChannel, UpdateTarget};
