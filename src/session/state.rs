// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Session state and status reporting.

use std::fmt;

use chrono::{DateTime, Utc};

use crate::error::FailureKind;

/// Lifecycle state of the SysAP session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum SessionState {
    /// No session.
    #[default]
    Disconnected,
    /// Resolving the account and opening the transport.
    Connecting,
    /// Transport open, logging in.
    Authenticating,
    /// Logged in and receiving updates.
    Online,
    /// The connection dropped after being online.
    Lost,
}

impl SessionState {
    /// Returns `true` if outbound calls may be issued.
    #[must_use]
    pub fn is_online(self) -> bool {
        self == Self::Online
    }

    /// Returns a lowercase name for the state.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Disconnected => "disconnected",
            Self::Connecting => "connecting",
            Self::Authenticating => "authenticating",
            Self::Online => "online",
            Self::Lost => "lost",
        }
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Why the session is in its current state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum StatusDetail {
    /// Nothing to add.
    #[default]
    None,
    /// Unknown login or rejected credentials.
    ConfigurationError,
    /// SysAP unreachable.
    CommunicationError,
    /// The connection dropped.
    ConnectionLost,
    /// The bridge was disposed.
    Removed,
}

impl From<FailureKind> for StatusDetail {
    fn from(kind: FailureKind) -> Self {
        match kind {
            FailureKind::Configuration => Self::ConfigurationError,
            FailureKind::Communication => Self::CommunicationError,
        }
    }
}

/// A status transition as seen by the host application.
#[derive(Debug, Clone, PartialEq)]
pub struct StatusReport {
    /// The new state.
    pub state: SessionState,
    /// Why the state was entered.
    pub detail: StatusDetail,
    /// Human readable explanation.
    pub message: Option<String>,
    /// When the transition happened.
    pub at: DateTime<Utc>,
}

impl StatusReport {
    /// Creates a report stamped with the current time.
    #[must_use]
    pub fn new(state: SessionState, detail: StatusDetail, message: Option<String>) -> Self {
        Self {
            state,
            detail,
            message,
            at: Utc::now(),
        }
    }
}

impl Default for StatusReport {
    fn default() -> Self {
        Self::new(SessionState::Disconnected, StatusDetail::None, None)
    }
}

/// Receives every status transition of the bridge.
///
/// Called from the task that caused the transition; implementations must
/// not block.
pub trait StatusListener: Send + Sync {
    /// Handles one transition.
    fn on_status(&self, report: &StatusReport);
}

impl<F> StatusListener for F
where
    F: Fn(&StatusReport) + Send + Sync,
{
    fn on_status(&self, report: &StatusReport) {
        self(report);
    }
}
