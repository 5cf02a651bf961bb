// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Remote procedure calls understood by the SysAP.

use std::fmt;

use crate::types::DatapointAddress;

/// Method writing a single datapoint.
pub const SET_DATAPOINT: &str = "RemoteInterface.setDatapoint";

/// Method returning the full project description.
pub const GET_ALL: &str = "RemoteInterface.getAll";

/// Language requested from `getAll`.
pub const GET_ALL_LANGUAGE: &str = "de";

/// Protocol version requested from `getAll`.
pub const GET_ALL_VERSION: i32 = 4;

/// A parameter or result of a remote call.
#[derive(Debug, Clone, PartialEq)]
pub enum RpcValue {
    /// A string.
    String(String),
    /// A 32 bit integer.
    Int(i32),
    /// A double.
    Double(f64),
    /// A boolean.
    Bool(bool),
    /// An empty result.
    Nil,
}

impl RpcValue {
    /// Returns the string content, if this is a string.
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    /// Consumes the value, returning its string content if it is a string.
    #[must_use]
    pub fn into_string(self) -> Option<String> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }
}

impl fmt::Display for RpcValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::String(s) => write!(f, "{s:?}"),
            Self::Int(i) => write!(f, "{i}"),
            Self::Double(d) => write!(f, "{d}"),
            Self::Bool(b) => write!(f, "{b}"),
            Self::Nil => write!(f, "nil"),
        }
    }
}

impl From<&str> for RpcValue {
    fn from(s: &str) -> Self {
        Self::String(s.to_string())
    }
}

impl From<String> for RpcValue {
    fn from(s: String) -> Self {
        Self::String(s)
    }
}

impl From<i32> for RpcValue {
    fn from(i: i32) -> Self {
        Self::Int(i)
    }
}

impl From<bool> for RpcValue {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

/// A method name plus its parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct RpcCall {
    method: &'static str,
    params: Vec<RpcValue>,
}

impl RpcCall {
    /// `RemoteInterface.setDatapoint(address, value)`.
    #[must_use]
    pub fn set_datapoint(address: &DatapointAddress, value: impl Into<String>) -> Self {
        Self {
            method: SET_DATAPOINT,
            params: vec![
                RpcValue::String(address.to_string()),
                RpcValue::String(value.into()),
            ],
        }
    }

    /// `RemoteInterface.getAll("de", 4, 0, 0)`.
    #[must_use]
    pub fn get_all() -> Self {
        Self {
            method: GET_ALL,
            params: vec![
                RpcValue::from(GET_ALL_LANGUAGE),
                RpcValue::Int(GET_ALL_VERSION),
                RpcValue::Int(0),
                RpcValue::Int(0),
            ],
        }
    }

    /// Returns the method name.
    #[must_use]
    pub fn method(&self) -> &'static str {
        self.method
    }

    /// Returns the parameters.
    #[must_use]
    pub fn params(&self) -> &[RpcValue] {
        &self.params
    }
}

impl fmt::Display for RpcCall {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}(", self.method)?;
        for (i, param) in self.params.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{param}")?;
        }
        write!(f, ")")
    }
}
