// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Session addresses (JIDs) of the form `local@domain/resource`.

use std::fmt;
use std::str::FromStr;

use crate::error::ValueError;

/// Domain served by every SysAP.
pub const SYSAP_DOMAIN: &str = "busch-jaeger.de";

/// Address of the SysAP's RPC endpoint.
pub const RPC_PEER: &str = "mrha@busch-jaeger.de/rpc";

/// A session address.
///
/// # Examples
///
/// ```
/// use fah_bridge::protocol::Jid;
///
/// let jid: Jid = "2ab4f8e0-77a1@busch-jaeger.de".parse().unwrap();
/// assert_eq!(jid.local(), "2ab4f8e0-77a1");
/// assert_eq!(jid.domain(), "busch-jaeger.de");
/// assert!(jid.resource().is_none());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Jid {
    local: String,
    domain: String,
    resource: Option<String>,
}

impl Jid {
    /// Returns the RPC peer address of the SysAP.
    #[must_use]
    pub fn rpc_peer() -> Self {
        Self {
            local: "mrha".to_string(),
            domain: SYSAP_DOMAIN.to_string(),
            resource: Some("rpc".to_string()),
        }
    }

    /// Returns the local part, used as the login user name.
    #[must_use]
    pub fn local(&self) -> &str {
        &self.local
    }

    /// Returns the domain part.
    #[must_use]
    pub fn domain(&self) -> &str {
        &self.domain
    }

    /// Returns the resource part, if any.
    #[must_use]
    pub fn resource(&self) -> Option<&str> {
        self.resource.as_deref()
    }

    /// Returns this address without its resource.
    #[must_use]
    pub fn bare(&self) -> Self {
        Self {
            local: self.local.clone(),
            domain: self.domain.clone(),
            resource: None,
        }
    }
}

impl fmt::Display for Jid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.local, self.domain)?;
        if let Some(resource) = &self.resource {
            write!(f, "/{resource}")?;
        }
        Ok(())
    }
}

impl FromStr for Jid {
    type Err = ValueError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let (bare, resource) = match s.split_once('/') {
            Some((bare, resource)) if !resource.is_empty() => (bare, Some(resource.to_string())),
            Some(_) => return Err(ValueError::InvalidJid(s.to_string())),
            None => (s, None),
        };
        let Some((local, domain)) = bare.split_once('@') else {
            return Err(ValueError::InvalidJid(s.to_string()));
        };
        if local.is_empty() || domain.is_empty() || domain.contains('@') {
            return Err(ValueError::InvalidJid(s.to_string()));
        }
        Ok(Self {
            local: local.to_string(),
            domain: domain.to_string(),
            resource,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_full_jid() {
        let jid: Jid = "mrha@busch-jaeger.de/rpc".parse().unwrap();
        assert_eq!(jid, Jid::rpc_peer());
        assert_eq!(jid.to_string(), RPC_PEER);
        assert_eq!(jid.bare().to_string(), "mrha@busch-jaeger.de");
    }

    #[test]
    fn parse_bare_jid() {
        let jid: Jid = " user@busch-jaeger.de ".parse().unwrap();
        assert_eq!(jid.local(), "user");
        assert_eq!(jid.to_string(), "user@busch-jaeger.de");
    }

    #[test]
    fn parse_invalid_jid() {
        assert!("no-at-sign".parse::<Jid>().is_err());
        assert!("@busch-jaeger.de".parse::<Jid>().is_err());
        assert!("user@".parse::<Jid>().is_err());
        assert!("user@domain/".parse::<Jid>().is_err());
        assert!("a@b@c".parse::<Jid>().is_err());
    }
}
