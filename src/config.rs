// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Bridge configuration.

use std::fmt;

use serde::Deserialize;

use crate::error::ConfigError;

/// Connection parameters for one SysAP.
///
/// # Examples
///
/// ```
/// use fah_bridge::BridgeConfig;
///
/// let config = BridgeConfig::new("192.168.1.10", "installer", "secret")
///     .with_dummy_things(true);
/// assert!(config.validate().is_ok());
/// assert_eq!(config.port(), 5280);
///
/// let parsed = BridgeConfig::from_json(
///     r#"{"host":"192.168.1.10","login":"installer","password":"secret"}"#,
/// )
/// .unwrap();
/// assert_eq!(parsed.login(), "installer");
/// ```
#[derive(Clone, Deserialize)]
pub struct BridgeConfig {
    #[serde(default)]
    host: String,
    #[serde(default = "default_port")]
    port: u16,
    #[serde(default)]
    login: String,
    #[serde(default)]
    password: String,
    #[serde(default, alias = "dummyThingsEnabled")]
    dummy_things_enabled: bool,
    #[serde(
        default,
        alias = "console_debugger_enabled",
        alias = "consoleDebuggerEnabled",
        alias = "transportTrace"
    )]
    transport_trace: bool,
}

fn default_port() -> u16 {
    BridgeConfig::DEFAULT_PORT
}

impl BridgeConfig {
    /// Default websocket port of the SysAP.
    pub const DEFAULT_PORT: u16 = 5280;

    /// Creates a configuration with default port and flags.
    #[must_use]
    pub fn new(
        host: impl Into<String>,
        login: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            host: host.into(),
            port: Self::DEFAULT_PORT,
            login: login.into(),
            password: password.into(),
            dummy_things_enabled: false,
            transport_trace: false,
        }
    }

    /// Parses and validates a JSON configuration document.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Invalid` if the document cannot be parsed, or
    /// the error from [`validate`](Self::validate).
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self =
            serde_json::from_str(json).map_err(|e| ConfigError::Invalid(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Sets the websocket port.
    #[must_use]
    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// Enables or disables placeholder things for collaborators.
    #[must_use]
    pub fn with_dummy_things(mut self, enabled: bool) -> Self {
        self.dummy_things_enabled = enabled;
        self
    }

    /// Enables or disables logging of every inbound transport event.
    #[must_use]
    pub fn with_transport_trace(mut self, enabled: bool) -> Self {
        self.transport_trace = enabled;
        self
    }

    /// Checks that the required fields are present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::MissingField` for an empty host or login and
    /// `ConfigError::Invalid` for port 0.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.host.trim().is_empty() {
            return Err(ConfigError::MissingField("host"));
        }
        if self.login.trim().is_empty() {
            return Err(ConfigError::MissingField("login"));
        }
        if self.port == 0 {
            return Err(ConfigError::Invalid("port must not be 0".to_string()));
        }
        Ok(())
    }

    /// Returns the SysAP host.
    #[must_use]
    pub fn host(&self) -> &str {
        &self.host
    }

    /// Returns the websocket port.
    #[must_use]
    pub fn port(&self) -> u16 {
        self.port
    }

    /// Returns the login name.
    #[must_use]
    pub fn login(&self) -> &str {
        &self.login
    }

    /// Returns the password.
    #[must_use]
    pub fn password(&self) -> &str {
        &self.password
    }

    /// Returns whether placeholder things are enabled.
    #[must_use]
    pub fn dummy_things_enabled(&self) -> bool {
        self.dummy_things_enabled
    }

    /// Returns whether inbound transport events are logged.
    #[must_use]
    pub fn transport_trace(&self) -> bool {
        self.transport_trace
    }
}

impl fmt::Debug for BridgeConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BridgeConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("login", &self.login)
            .field("password", &"<redacted>")
            .field("dummy_things_enabled", &self.dummy_things_enabled)
            .field("transport_trace", &self.transport_trace)
            .finish()
    }
}
