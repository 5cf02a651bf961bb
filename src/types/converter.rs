// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Converters from protocol strings to typed values.
//!
//! A converter returns `None` when the raw string has no representation in
//! its domain. The dispatcher treats that as "nothing to report" and skips
//! delivery.

use std::fmt;
use std::sync::Arc;

use super::value::{OnOff, Percent, Value};

/// Raw target temperature the SysAP reports when a thermostat is switched off.
pub const THERMOSTAT_OFF_SENTINEL: &str = "35";

/// Raw value of an active eco mode.
pub const ECO_MODE_ON: &str = "68";

type CustomFn = Arc<dyn Fn(&str) -> Option<Value> + Send + Sync>;

/// Converts a raw datapoint string into a typed [`Value`].
///
/// # Examples
///
/// ```
/// use fah_bridge::types::{Converter, OnOff, Value};
///
/// assert_eq!(Converter::OnOff.convert("1"), Some(Value::OnOff(OnOff::On)));
/// assert_eq!(Converter::Decimal.convert("21.5"), Some(Value::Decimal(21.5)));
///
/// // A thermostat reports "35" when it is switched off
/// assert_eq!(Converter::target_temperature().convert("35"), None);
/// ```
#[derive(Clone)]
pub enum Converter {
    /// `"1"` is on, `"0"` is off; anything else has no value.
    OnOff,
    /// Numeric percentage in `0..=100`.
    Percent,
    /// Any finite decimal number.
    Decimal,
    /// A decimal number, except for one sentinel string that means "no value".
    DecimalExcept {
        /// The raw string that yields no value.
        sentinel: String,
    },
    /// On when the raw string equals `on`, off for anything else.
    Flag {
        /// The raw string meaning "on".
        on: String,
    },
    /// Caller-supplied conversion.
    Custom(CustomFn),
}

impl Converter {
    /// Converter for thermostat target temperatures.
    #[must_use]
    pub fn target_temperature() -> Self {
        Self::DecimalExcept {
            sentinel: THERMOSTAT_OFF_SENTINEL.to_string(),
        }
    }

    /// Converter for the thermostat eco-mode datapoint.
    #[must_use]
    pub fn eco_mode() -> Self {
        Self::Flag {
            on: ECO_MODE_ON.to_string(),
        }
    }

    /// Wraps a closure as a converter.
    #[must_use]
    pub fn custom<F>(f: F) -> Self
    where
        F: Fn(&str) -> Option<Value> + Send + Sync + 'static,
    {
        Self::Custom(Arc::new(f))
    }

    /// Converts a raw protocol string.
    #[must_use]
    pub fn convert(&self, raw: &str) -> Option<Value> {
        match self {
            Self::OnOff => match raw.trim() {
                "1" => Some(Value::OnOff(OnOff::On)),
                "0" => Some(Value::OnOff(OnOff::Off)),
                _ => None,
            },
            Self::Percent => Percent::parse_raw(raw).map(Value::Percent),
            Self::Decimal => parse_decimal(raw),
            Self::DecimalExcept { sentinel } => {
                if raw.trim() == sentinel {
                    None
                } else {
                    parse_decimal(raw)
                }
            }
            Self::Flag { on } => Some(Value::OnOff(OnOff::from(raw.trim() == on))),
            Self::Custom(f) => f(raw),
        }
    }
}

fn parse_decimal(raw: &str) -> Option<Value> {
    raw.trim()
        .parse::<f64>()
        .ok()
        .filter(|n| n.is_finite())
        .map(Value::Decimal)
}

impl fmt::Debug for Converter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::OnOff => f.write_str("OnOff"),
            Self::Percent => f.write_str("Percent"),
            Self::Decimal => f.write_str("Decimal"),
            Self::DecimalExcept { sentinel } => f
                .debug_struct("DecimalExcept")
                .field("sentinel", sentinel)
                .finish(),
            Self::Flag { on } => f.debug_struct("Flag").field("on", on).finish(),
            Self::Custom(_) => f.write_str("Custom(..)"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn on_off_domain() {
        assert_eq!(Converter::OnOff.convert("1"), Some(Value::OnOff(OnOff::On)));
        assert_eq!(Converter::OnOff.convert("0"), Some(Value::OnOff(OnOff::Off)));
        assert_eq!(Converter::OnOff.convert("2"), None);
        assert_eq!(Converter::OnOff.convert(""), None);
    }

    #[test]
    fn percent_conversion() {
        let value = Converter::Percent.convert("80").unwrap();
        assert_eq!(value, Value::Percent(Percent::new(80).unwrap()));
        assert_eq!(Converter::Percent.convert("150"), None);
    }

    #[test]
    fn decimal_conversion() {
        assert_eq!(Converter::Decimal.convert("22.25"), Some(Value::Decimal(22.25)));
        assert_eq!(Converter::Decimal.convert("warm"), None);
        assert_eq!(Converter::Decimal.convert("inf"), None);
    }

    #[test]
    fn target_temperature_sentinel() {
        let converter = Converter::target_temperature();
        assert_eq!(converter.convert("35"), None);
        assert_eq!(converter.convert("21"), Some(Value::Decimal(21.0)));
        // 35.0 is not the sentinel string
        assert_eq!(converter.convert("35.0"), Some(Value::Decimal(35.0)));
    }

    #[test]
    fn eco_mode_flag() {
        let converter = Converter::eco_mode();
        assert_eq!(converter.convert("68"), Some(Value::OnOff(OnOff::On)));
        assert_eq!(converter.convert("65"), Some(Value::OnOff(OnOff::Off)));
        assert_eq!(converter.convert("garbage"), Some(Value::OnOff(OnOff::Off)));
    }

    #[test]
    fn custom_converter() {
        let converter = Converter::custom(|raw| (raw == "open").then_some(Value::OnOff(OnOff::On)));
        assert_eq!(converter.convert("open"), Some(Value::OnOff(OnOff::On)));
        assert_eq!(converter.convert("closed"), None);
        assert_eq!(format!("{converter:?}"), "Custom(..)");
    }
}
