// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! `fah_bridge` - push-update bridge for the free@home System Access Point.
//!
//! The SysAP pushes datapoint changes over a persistent messaging session.
//! This library keeps that session alive, decodes the update events and
//! routes every datapoint value to the application channel registered for
//! it, converted to a typed [`Value`].
//!
//! # Features
//!
//! - **Session lifecycle**: account lookup, login, loss detection and
//!   status reporting with distinct configuration and communication failures
//! - **Update dispatch**: `(serial, channel, datapoint)` routing with typed
//!   converters, contained delivery failures
//! - **Outbound calls**: `setDatapoint` and `getAll` with a 20 s timeout
//! - **Virtual switches**: input datapoints are echoed to the switch output
//!
//! The messaging stack itself is supplied by the application through the
//! [`Transport`] trait.
//!
//! # Quick Start
//!
//! ```ignore
//! use std::sync::Arc;
//! use fah_bridge::{Bridge, BridgeConfig, Converter, LogicalChannel, SubscriptionKey};
//! use tokio::sync::mpsc;
//!
//! #[tokio::main]
//! async fn main() -> fah_bridge::Result<()> {
//!     let bridge = Bridge::new(
//!         BridgeConfig::new("192.168.1.10", "installer", "secret"),
//!         MyXmppTransport::default(),
//!     );
//!
//!     let (tx, mut rx) = mpsc::unbounded_channel();
//!     bridge.register(
//!         SubscriptionKey::new("ABB700D12345", "ch0000", "odp0000"),
//!         LogicalChannel::new("switch"),
//!         Arc::new(tx),
//!         Converter::OnOff,
//!     );
//!
//!     bridge.connect().await?;
//!     bridge
//!         .set_datapoint(&"ABB700D12345/ch0000/idp0000".parse()?, "1")
//!         .await?;
//!
//!     while let Some(update) = rx.recv().await {
//!         println!("{} is now {}", update.channel.id(), update.value);
//!     }
//!     Ok(())
//! }
//! ```

mod bridge;
pub mod config;
pub mod dispatch;
pub mod error;
pub mod gateway;
pub mod protocol;
pub mod schedule;
pub mod session;
pub mod subscription;
pub mod transport;
pub mod types;

pub use bridge::{Bridge, BridgeBuilder};
pub use config::BridgeConfig;
pub use dispatch::{DispatchOutcome, Dispatcher, EchoWriter};
pub use error::{
    ConfigError, ConnectError, DecodeError, DeliveryError, Error, FailureKind, Result, RpcError,
    TransportError, ValueError,
};
pub use gateway::RpcGateway;
pub use session::{ConnectTimeouts, SessionState, StatusDetail, StatusListener, StatusReport};
pub use subscription::{ChannelKind, ChannelUpdate, LogicalChannel, SubscriptionTable, UpdateTarget};
pub use transport::{Transport, TransportEvent, TransportSettings};
pub use types::{Converter, DatapointAddress, OnOff, Percent, SubscriptionKey, Value};
