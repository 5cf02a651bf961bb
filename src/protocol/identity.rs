// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Resolution of a login name to the SysAP session address.
//!
//! The SysAP publishes its user accounts at `/settings.json`:
//!
//! ```json
//! {"users": [{"name": "installer", "jid": "2ab4f8e0-77a1@busch-jaeger.de"}]}
//! ```

use std::time::Duration;

use reqwest::Client;
use serde::Deserialize;

use crate::error::ConnectError;
use crate::protocol::Jid;

/// Path of the account list on the SysAP.
pub const SETTINGS_PATH: &str = "/settings.json";

/// User agent sent with the lookup request.
pub const USER_AGENT: &str = "Mozilla/5.0";

/// The subset of `settings.json` used for identity lookup.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Settings {
    /// Known accounts.
    #[serde(default)]
    pub users: Vec<UserEntry>,
}

/// One account from `settings.json`.
#[derive(Debug, Clone, Deserialize)]
pub struct UserEntry {
    /// Login name.
    pub name: String,
    /// Session address of the account.
    pub jid: String,
}

impl Settings {
    /// Returns the JID of the account named `login`.
    ///
    /// If several accounts share the name, the last one wins.
    #[must_use]
    pub fn find_jid(&self, login: &str) -> Option<&str> {
        self.users
            .iter()
            .rev()
            .find(|user| user.name == login)
            .map(|user| user.jid.as_str())
    }
}

/// Looks up session addresses over HTTP.
///
/// # Examples
///
/// ```no_run
/// use fah_bridge::protocol::IdentityResolver;
///
/// # async fn example() -> Result<(), fah_bridge::ConnectError> {
/// let resolver = IdentityResolver::new("192.168.1.10")?;
/// let jid = resolver.resolve("installer").await?;
/// println!("logging in as {}", jid.local());
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct IdentityResolver {
    base_url: String,
    client: Client,
}

impl IdentityResolver {
    /// Default request timeout.
    pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(20);

    /// Creates a resolver for `host`.
    ///
    /// A bare host or IP address is reached over plain HTTP.
    ///
    /// # Errors
    ///
    /// Returns `ConnectError::IdentityLookup` if the HTTP client cannot be
    /// created.
    pub fn new(host: impl Into<String>) -> Result<Self, ConnectError> {
        Self::with_timeout(host, Self::DEFAULT_TIMEOUT)
    }

    /// Creates a resolver for `host` with a custom request timeout.
    ///
    /// # Errors
    ///
    /// Returns `ConnectError::IdentityLookup` if the HTTP client cannot be
    /// created.
    pub fn with_timeout(host: impl Into<String>, timeout: Duration) -> Result<Self, ConnectError> {
        let host = host.into();
        let base_url = if host.starts_with("http://") || host.starts_with("https://") {
            host.trim_end_matches('/').to_string()
        } else {
            format!("http://{host}")
        };

        let client = Client::builder()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| ConnectError::IdentityLookup(e.to_string()))?;

        Ok(Self { base_url, client })
    }

    /// Returns the URL of the account list.
    #[must_use]
    pub fn settings_url(&self) -> String {
        format!("{}{SETTINGS_PATH}", self.base_url)
    }

    /// Fetches and parses the account list.
    ///
    /// # Errors
    ///
    /// Returns `ConnectError::IdentityLookup` if the request fails, the
    /// SysAP answers with a non-success status or the body is not valid JSON.
    pub async fn fetch_settings(&self) -> Result<Settings, ConnectError> {
        let url = self.settings_url();
        tracing::debug!(url = %url, "Fetching SysAP settings");

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| ConnectError::IdentityLookup(e.to_string()))?;

        if !response.status().is_success() {
            return Err(ConnectError::IdentityLookup(format!(
                "HTTP {} - {}",
                response.status().as_u16(),
                response.status().canonical_reason().unwrap_or("Unknown")
            )));
        }

        let body = response
            .text()
            .await
            .map_err(|e| ConnectError::IdentityLookup(e.to_string()))?;

        serde_json::from_str(&body)
            .map_err(|e| ConnectError::IdentityLookup(format!("invalid settings.json: {e}")))
    }

    /// Resolves `login` to its session address.
    ///
    /// # Errors
    ///
    /// Returns `ConnectError::IdentityNotFound` if no account matches,
    /// `ConnectError::InvalidIdentity` if its JID does not parse, or
    /// `ConnectError::IdentityLookup` if the lookup itself fails.
    pub async fn resolve(&self, login: &str) -> Result<Jid, ConnectError> {
        let settings = self.fetch_settings().await?;

        let Some(jid) = settings.find_jid(login) else {
            return Err(ConnectError::IdentityNotFound {
                login: login.to_string(),
            });
        };

        let jid: Jid = jid.parse().map_err(|source| ConnectError::InvalidIdentity {
            login: login.to_string(),
            source,
        })?;

        tracing::debug!(login = %login, jid = %jid, "Resolved SysAP account");
        Ok(jid)
    }
}
