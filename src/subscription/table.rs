// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Concurrent subscription table.
//!
//! # Architecture
//!
//! ```text
//! update: ABB700D12345 / ch0000 / odp0000 = "1"
//!                     ↓
//!         SubscriptionTable.lookup(key)      (read lock, clone Arc, release)
//!                     ↓
//!         Arc<Subscription> { channel, converter, target }
//!                     ↓
//!         converter.convert("1") → Value::OnOff(On)
//!                     ↓
//!         target.deliver(channel, value)
//! ```

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use parking_lot::RwLock;

use crate::types::{Converter, SubscriptionKey};

use super::target::{LogicalChannel, UpdateTarget};

/// A registered interest in one datapoint.
pub struct Subscription {
    key: SubscriptionKey,
    channel: LogicalChannel,
    target: Arc<dyn UpdateTarget>,
    converter: Converter,
}

impl Subscription {
    /// Returns the key this subscription is registered under.
    #[must_use]
    pub fn key(&self) -> &SubscriptionKey {
        &self.key
    }

    /// Returns the logical channel fed by this subscription.
    #[must_use]
    pub fn channel(&self) -> &LogicalChannel {
        &self.channel
    }

    /// Returns the delivery target.
    #[must_use]
    pub fn target(&self) -> &Arc<dyn UpdateTarget> {
        &self.target
    }

    /// Returns the converter.
    #[must_use]
    pub fn converter(&self) -> &Converter {
        &self.converter
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("key", &self.key)
            .field("channel", &self.channel)
            .field("converter", &self.converter)
            .finish_non_exhaustive()
    }
}

/// Maps datapoint keys to their subscriber.
///
/// Holds at most one subscription per key. Registering an existing key
/// replaces the previous subscription.
///
/// Lookups hand out an `Arc<Subscription>` so callers never hold the lock
/// while converting, delivering or calling out.
#[derive(Default)]
pub struct SubscriptionTable {
    entries: RwLock<HashMap<SubscriptionKey, Arc<Subscription>>>,
}

impl SubscriptionTable {
    /// Creates an empty table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `target` for `key`.
    ///
    /// Returns the subscription that was replaced, if any.
    pub fn register(
        &self,
        key: SubscriptionKey,
        channel: LogicalChannel,
        target: Arc<dyn UpdateTarget>,
        converter: Converter,
    ) -> Option<Arc<Subscription>> {
        let subscription = Arc::new(Subscription {
            key: key.clone(),
            channel,
            target,
            converter,
        });
        let replaced = self.entries.write().insert(key, subscription);
        if let Some(old) = &replaced {
            tracing::debug!(
                key = %old.key,
                channel = %old.channel.id(),
                "Replacing existing subscription"
            );
        }
        replaced
    }

    /// Removes the subscription for `key`.
    ///
    /// Returns `true` if one was registered.
    pub fn unregister(&self, key: &SubscriptionKey) -> bool {
        self.entries.write().remove(key).is_some()
    }

    /// Returns the current subscription for `key`.
    #[must_use]
    pub fn lookup(&self, key: &SubscriptionKey) -> Option<Arc<Subscription>> {
        self.entries.read().get(key).cloned()
    }

    /// Returns the number of subscriptions.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    /// Returns `true` if nothing is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }

    /// Returns a snapshot of the registered keys.
    #[must_use]
    pub fn keys(&self) -> Vec<SubscriptionKey> {
        self.entries.read().keys().cloned().collect()
    }
}

impl fmt::Debug for SubscriptionTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SubscriptionTable")
            .field("len", &self.len())
            .finish()
    }
}
