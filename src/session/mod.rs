// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Session lifecycle with the SysAP.
//!
//! ```text
//!                connect()
//! Disconnected ───────────► Connecting ──► Authenticating ──► Online
//!      ▲                        │                │              │  ▲
//!      │        failure         │                │   disconnect │  │ re-authenticated
//!      └────────────────────────┴────────────────┘              ▼  │
//!      ◄──────────────────── dispose() ─────────────────────── Lost
//! ```
//!
//! Every transition is published on a `watch` channel and reported to the
//! optional [`StatusListener`]. A reconnect passes through `Disconnected`.
//! Opening the transport and logging in are bounded by [`ConnectTimeouts`],
//! and `dispose()` cancels a connect that is still in progress.

mod manager;
mod state;

pub use manager::{ConnectTimeouts, SessionManager};
pub use state::{SessionState, StatusDetail, StatusListener, StatusReport};
