// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Typed datapoint values.
//!
//! The SysAP reports every datapoint as a string. Converters turn those
//! strings into the values defined here; [`Value::to_raw`] goes the other
//! way for outbound writes.

use std::fmt;
use std::str::FromStr;

use crate::error::ValueError;

/// Binary switch state.
///
/// # Examples
///
/// ```
/// use fah_bridge::types::OnOff;
///
/// assert_eq!("1".parse::<OnOff>().unwrap(), OnOff::On);
/// assert_eq!(OnOff::Off.as_raw(), "0");
/// assert!("2".parse::<OnOff>().is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OnOff {
    /// Switched off.
    Off,
    /// Switched on.
    On,
}

impl OnOff {
    /// Returns the protocol string for this state.
    #[must_use]
    pub const fn as_raw(&self) -> &'static str {
        match self {
            Self::Off => "0",
            Self::On => "1",
        }
    }

    /// Returns the display string for this state.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Off => "OFF",
            Self::On => "ON",
        }
    }
}

impl fmt::Display for OnOff {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OnOff {
    type Err = ValueError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "0" => Ok(Self::Off),
            "1" => Ok(Self::On),
            other => match other.to_ascii_uppercase().as_str() {
                "OFF" => Ok(Self::Off),
                "ON" => Ok(Self::On),
                _ => Err(ValueError::InvalidOnOff(s.to_string())),
            },
        }
    }
}

impl From<bool> for OnOff {
    fn from(value: bool) -> Self {
        if value { Self::On } else { Self::Off }
    }
}

/// A percentage (0-100), used for dimmer levels, blind positions and
/// actuator openings.
///
/// # Examples
///
/// ```
/// use fah_bridge::types::Percent;
///
/// let level = Percent::new(75).unwrap();
/// assert_eq!(level.value(), 75);
/// assert!(Percent::new(101).is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Percent(u8);

impl Percent {
    /// 0%.
    pub const MIN: Self = Self(0);

    /// 100%.
    pub const MAX: Self = Self(100);

    /// Creates a new percentage.
    ///
    /// # Errors
    ///
    /// Returns `ValueError::OutOfRange` if value exceeds 100.
    pub fn new(value: u8) -> Result<Self, ValueError> {
        if value > 100 {
            return Err(ValueError::OutOfRange {
                min: 0,
                max: 100,
                actual: u16::from(value),
            });
        }
        Ok(Self(value))
    }

    /// Parses a protocol string such as `"57"` or `"57.4"`.
    ///
    /// Fractions are rounded. Returns `None` for anything that is not a
    /// finite number in `0..=100`.
    #[must_use]
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub fn parse_raw(raw: &str) -> Option<Self> {
        let number: f64 = raw.trim().parse().ok()?;
        if !number.is_finite() {
            return None;
        }
        let rounded = number.round();
        if (0.0..=100.0).contains(&rounded) {
            Some(Self(rounded as u8))
        } else {
            None
        }
    }

    /// Returns the percentage value.
    #[must_use]
    pub const fn value(&self) -> u8 {
        self.0
    }
}

impl fmt::Display for Percent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}%", self.0)
    }
}

impl TryFrom<u8> for Percent {
    type Error = ValueError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

/// A typed datapoint value delivered to subscribers.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Value {
    /// Binary switch state.
    OnOff(OnOff),
    /// Percentage.
    Percent(Percent),
    /// Decimal measurement (temperatures, lux, ...).
    Decimal(f64),
}

impl Value {
    /// Returns the protocol string for writing this value back to the SysAP.
    ///
    /// # Examples
    ///
    /// ```
    /// use fah_bridge::types::{OnOff, Value};
    ///
    /// assert_eq!(Value::OnOff(OnOff::On).to_raw(), "1");
    /// assert_eq!(Value::Decimal(21.5).to_raw(), "21.5");
    /// ```
    #[must_use]
    pub fn to_raw(&self) -> String {
        match self {
            Self::OnOff(state) => state.as_raw().to_string(),
            Self::Percent(percent) => percent.value().to_string(),
            Self::Decimal(number) => number.to_string(),
        }
    }

    /// Returns the on/off state if this is an on/off value.
    #[must_use]
    pub fn as_on_off(&self) -> Option<OnOff> {
        match self {
            Self::OnOff(state) => Some(*state),
            _ => None,
        }
    }

    /// Returns the decimal if this is a decimal value.
    #[must_use]
    pub fn as_decimal(&self) -> Option<f64> {
        match self {
            Self::Decimal(number) => Some(*number),
            _ => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::OnOff(state) => write!(f, "{state}"),
            Self::Percent(percent) => write!(f, "{percent}"),
            Self::Decimal(number) => write!(f, "{number}"),
        }
    }
}

impl From<OnOff> for Value {
    fn from(state: OnOff) -> Self {
        Self::OnOff(state)
    }
}

impl From<Percent> for Value {
    fn from(percent: Percent) -> Self {
        Self::Percent(percent)
    }
}
