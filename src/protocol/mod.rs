// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Wire-level pieces of the SysAP protocol.
//!
//! - [`Jid`]: session addresses
//! - [`IdentityResolver`]: login name to session address via `settings.json`
//! - [`RpcCall`] / [`RpcValue`]: the remote calls the bridge issues
//! - [`decode_update`]: update payloads to [`DatapointUpdate`] leaves
//!
//! The messaging session itself is provided by a
//! [`Transport`](crate::transport::Transport) implementation.

mod identity;
mod jid;
mod rpc;
mod update;

pub use identity::{IdentityResolver, SETTINGS_PATH, Settings, USER_AGENT, UserEntry};
pub use jid::{Jid, RPC_PEER, SYSAP_DOMAIN};
pub use rpc::{GET_ALL, GET_ALL_LANGUAGE, GET_ALL_VERSION, RpcCall, RpcValue, SET_DATAPOINT};
pub use update::{
    DatapointUpdate, UPDATE_NAMESPACE, decode_project, decode_update, unescape_payload,
};
