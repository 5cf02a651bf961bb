// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Identifiers for protocol-level datapoints.

use std::fmt;
use std::str::FromStr;

use crate::error::ValueError;

/// Output datapoint that receives the echo of a virtual switch input.
pub(crate) const ECHO_OUTPUT_DATAPOINT: &str = "odp0000";

/// Marker contained in the id of input datapoints.
pub(crate) const INPUT_DATAPOINT_MARKER: &str = "idp";

/// Identifies one datapoint on one device channel.
///
/// Equality and hashing are structural. The canonical string form is
/// `serial_channel_datapoint`.
///
/// # Examples
///
/// ```
/// use fah_bridge::types::SubscriptionKey;
///
/// let key = SubscriptionKey::new("ABB700D12345", "ch0000", "odp0000");
/// assert_eq!(key.to_string(), "ABB700D12345_ch0000_odp0000");
/// assert_eq!(key.address().to_string(), "ABB700D12345/ch0000/odp0000");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriptionKey {
    serial: String,
    channel: String,
    datapoint: String,
}

impl SubscriptionKey {
    /// Creates a key from its three parts.
    #[must_use]
    pub fn new(
        serial: impl Into<String>,
        channel: impl Into<String>,
        datapoint: impl Into<String>,
    ) -> Self {
        Self {
            serial: serial.into(),
            channel: channel.into(),
            datapoint: datapoint.into(),
        }
    }

    /// Returns the device serial number.
    #[must_use]
    pub fn serial(&self) -> &str {
        &self.serial
    }

    /// Returns the channel id (e.g. `ch0000`).
    #[must_use]
    pub fn channel(&self) -> &str {
        &self.channel
    }

    /// Returns the datapoint id (e.g. `odp0000`).
    #[must_use]
    pub fn datapoint(&self) -> &str {
        &self.datapoint
    }

    /// Returns `true` if the datapoint id names an input datapoint.
    ///
    /// This is a plain substring test on `idp`.
    #[must_use]
    pub fn is_input(&self) -> bool {
        self.datapoint.contains(INPUT_DATAPOINT_MARKER)
    }

    /// Returns the outbound address of this datapoint.
    #[must_use]
    pub fn address(&self) -> DatapointAddress {
        DatapointAddress::new(&self.serial, &self.channel, &self.datapoint)
    }

    /// Returns the address a virtual switch echoes its input to.
    #[must_use]
    pub fn echo_address(&self) -> DatapointAddress {
        DatapointAddress::new(&self.serial, &self.channel, ECHO_OUTPUT_DATAPOINT)
    }
}

impl fmt::Display for SubscriptionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}_{}_{}", self.serial, self.channel, self.datapoint)
    }
}

/// Address of a datapoint in outbound calls: `serial/channel/datapoint`.
///
/// # Examples
///
/// ```
/// use fah_bridge::types::DatapointAddress;
///
/// let address: DatapointAddress = "ABB700D12345/ch0003/idp0000".parse().unwrap();
/// assert_eq!(address.channel(), "ch0003");
/// assert!("no-slashes".parse::<DatapointAddress>().is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DatapointAddress {
    serial: String,
    channel: String,
    datapoint: String,
}

impl DatapointAddress {
    /// Creates an address from its three parts.
    #[must_use]
    pub fn new(
        serial: impl Into<String>,
        channel: impl Into<String>,
        datapoint: impl Into<String>,
    ) -> Self {
        Self {
            serial: serial.into(),
            channel: channel.into(),
            datapoint: datapoint.into(),
        }
    }

    /// Returns the device serial number.
    #[must_use]
    pub fn serial(&self) -> &str {
        &self.serial
    }

    /// Returns the channel id.
    #[must_use]
    pub fn channel(&self) -> &str {
        &self.channel
    }

    /// Returns the datapoint id.
    #[must_use]
    pub fn datapoint(&self) -> &str {
        &self.datapoint
    }
}

impl fmt::Display for DatapointAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}/{}", self.serial, self.channel, self.datapoint)
    }
}

impl FromStr for DatapointAddress {
    type Err = ValueError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut parts = s.split('/');
        match (parts.next(), parts.next(), parts.next(), parts.next()) {
            (Some(serial), Some(channel), Some(datapoint), None)
                if !serial.is_empty() && !channel.is_empty() && !datapoint.is_empty() =>
            {
                Ok(Self::new(serial, channel, datapoint))
            }
            _ => Err(ValueError::InvalidAddress(s.to_string())),
        }
    }
}

impl From<&SubscriptionKey> for DatapointAddress {
    fn from(key: &SubscriptionKey) -> Self {
        key.address()
    }
}
