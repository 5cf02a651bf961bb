// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Value and identifier types shared across the bridge.
//!
//! # Types
//!
//! - [`SubscriptionKey`] - `(serial, channel, datapoint)` triple used for routing
//! - [`DatapointAddress`] - `serial/channel/datapoint` address for outbound writes
//! - [`Value`] - Typed datapoint value ([`OnOff`], [`Percent`], decimal)
//! - [`Converter`] - Raw string to [`Value`] conversion

mod converter;
mod key;
mod value;

pub use converter::{Converter, ECO_MODE_ON, THERMOSTAT_OFF_SENTINEL};
pub use key::{DatapointAddress, SubscriptionKey};
pub use value::{OnOff, Percent, Value};
