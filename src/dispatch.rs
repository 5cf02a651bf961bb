// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Update dispatch: routes decoded datapoint updates to subscribers.
//!
//! For each `(serial, channel, datapoint, raw)` tuple the dispatcher:
//!
//! 1. looks up the subscription (unsubscribed points are dropped quietly),
//! 2. echoes virtual switch inputs to the switch's `odp0000` output,
//! 3. converts the raw string (no value means nothing to report),
//! 4. delivers the typed value, logging and swallowing target failures.

use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Arc;

use crate::subscription::SubscriptionTable;
use crate::types::{DatapointAddress, SubscriptionKey};

/// Issues the outbound write of a virtual switch echo.
///
/// Implementations must return promptly; the write itself happens in the
/// background.
pub trait EchoWriter: Send + Sync {
    /// Writes `value` to `address` without waiting for the result.
    fn echo(&self, address: DatapointAddress, value: String);
}

impl<F> EchoWriter for F
where
    F: Fn(DatapointAddress, String) + Send + Sync,
{
    fn echo(&self, address: DatapointAddress, value: String) {
        self(address, value);
    }
}

/// What happened to a dispatched update.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DispatchOutcome {
    /// No subscription for the key.
    Unsubscribed,
    /// The converter had no value for the raw string.
    Suppressed,
    /// The typed value was delivered.
    Delivered,
    /// The target failed; the failure was logged.
    DeliveryFailed,
}

/// Routes datapoint updates through the subscription table.
#[derive(Clone)]
pub struct Dispatcher {
    table: Arc<SubscriptionTable>,
    echo: Arc<dyn EchoWriter>,
}

impl Dispatcher {
    /// Creates a dispatcher reading from `table` and echoing through `echo`.
    #[must_use]
    pub fn new(table: Arc<SubscriptionTable>, echo: Arc<dyn EchoWriter>) -> Self {
        Self { table, echo }
    }

    /// Returns the subscription table.
    #[must_use]
    pub fn table(&self) -> &Arc<SubscriptionTable> {
        &self.table
    }

    /// Dispatches one datapoint update.
    ///
    /// Never fails: every problem is logged and reflected in the outcome.
    pub fn dispatch(
        &self,
        serial: &str,
        channel: &str,
        datapoint: &str,
        raw: &str,
    ) -> DispatchOutcome {
        let key = SubscriptionKey::new(serial, channel, datapoint);

        let Some(subscription) = self.table.lookup(&key) else {
            tracing::trace!(key = %key, "No subscription for datapoint");
            return DispatchOutcome::Unsubscribed;
        };

        if subscription.channel().is_virtual_switch() && key.is_input() {
            let address = key.echo_address();
            tracing::debug!(
                key = %key,
                address = %address,
                value = %raw,
                "Echoing virtual switch input"
            );
            self.echo.echo(address, raw.to_string());
        }

        let Some(value) = subscription.converter().convert(raw) else {
            tracing::debug!(key = %key, value = %raw, "Converter has no value, skipping delivery");
            return DispatchOutcome::Suppressed;
        };

        let channel = subscription.channel();
        let result = catch_unwind(AssertUnwindSafe(|| {
            subscription.target().deliver(channel, value)
        }));

        match result {
            Ok(Ok(())) => {
                tracing::debug!(key = %key, channel = %channel.id(), value = %value, "Delivered update");
                DispatchOutcome::Delivered
            }
            Ok(Err(e)) => {
                tracing::warn!(key = %key, channel = %channel.id(), error = %e, "Delivery failed");
                DispatchOutcome::DeliveryFailed
            }
            Err(_) => {
                tracing::warn!(key = %key, channel = %channel.id(), "Delivery target panicked");
                DispatchOutcome::DeliveryFailed
            }
        }
    }
}

impl std::fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dispatcher")
            .field("table", &self.table)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::DeliveryError;
    use crate::subscription::{LogicalChannel, UpdateTarget};
    use crate::types::{Converter, OnOff, Value};
    use parking_lot::Mutex;

    type Deliveries = Arc<Mutex<Vec<(String, Value)>>>;
    type Echoes = Arc<Mutex<Vec<(String, String)>>>;

    fn recording_target() -> (Arc<dyn UpdateTarget>, Deliveries) {
        let deliveries: Deliveries = Arc::default();
        let sink = Arc::clone(&deliveries);
        let target: Arc<dyn UpdateTarget> = Arc::new(move |channel: &LogicalChannel, value: Value| {
            sink.lock().push((channel.id().to_string(), value));
            Ok::<(), DeliveryError>(())
        });
        (target, deliveries)
    }

    fn dispatcher() -> (Dispatcher, Echoes) {
        let echoes: Echoes = Arc::default();
        let sink = Arc::clone(&echoes);
        let echo = Arc::new(move |address: DatapointAddress, value: String| {
            sink.lock().push((address.to_string(), value));
        });
        (
            Dispatcher::new(Arc::new(SubscriptionTable::new()), echo),
            echoes,
        )
    }

    #[test]
    fn unsubscribed_update_is_dropped() {
        let (dispatcher, echoes) = dispatcher();
        let outcome = dispatcher.dispatch("S1", "ch0000", "odp0000", "1");
        assert_eq!(outcome, DispatchOutcome::Unsubscribed);
        assert!(echoes.lock().is_empty());
    }

    #[test]
    fn delivers_converted_value() {
        let (dispatcher, _) = dispatcher();
        let (target, deliveries) = recording_target();
        dispatcher.table().register(
            SubscriptionKey::new("S1", "ch0000", "odp0000"),
            LogicalChannel::new("switch"),
            target,
            Converter::OnOff,
        );

        let outcome = dispatcher.dispatch("S1", "ch0000", "odp0000", "1");
        assert_eq!(outcome, DispatchOutcome::Delivered);
        assert_eq!(
            deliveries.lock().as_slice(),
            &[("switch".to_string(), Value::OnOff(OnOff::On))]
        );
    }

    #[test]
    fn sentinel_suppresses_delivery() {
        let (dispatcher, _) = dispatcher();
        let (target, deliveries) = recording_target();
        dispatcher.table().register(
            SubscriptionKey::new("S1", "ch0000", "odp0006"),
            LogicalChannel::new("targettemperature"),
            target,
            Converter::target_temperature(),
        );

        let outcome = dispatcher.dispatch("S1", "ch0000", "odp0006", "35");
        assert_eq!(outcome, DispatchOutcome::Suppressed);
        assert!(deliveries.lock().is_empty());
    }

    #[test]
    fn virtual_switch_input_is_echoed() {
        let (dispatcher, echoes) = dispatcher();
        let (target, deliveries) = recording_target();
        dispatcher.table().register(
            SubscriptionKey::new("6000D2CB27B2", "ch0000", "idp0000"),
            LogicalChannel::virtual_switch("virtualswitch"),
            target,
            Converter::OnOff,
        );

        let outcome = dispatcher.dispatch("6000D2CB27B2", "ch0000", "idp0000", "1");
        assert_eq!(outcome, DispatchOutcome::Delivered);
        assert_eq!(
            echoes.lock().as_slice(),
            &[("6000D2CB27B2/ch0000/odp0000".to_string(), "1".to_string())]
        );
        assert_eq!(deliveries.lock().len(), 1);
    }

    #[test]
    fn virtual_switch_output_is_not_echoed() {
        let (dispatcher, echoes) = dispatcher();
        let (target, _) = recording_target();
        dispatcher.table().register(
            SubscriptionKey::new("6000D2CB27B2", "ch0000", "odp0000"),
            LogicalChannel::virtual_switch("virtualswitch"),
            target,
            Converter::OnOff,
        );

        dispatcher.dispatch("6000D2CB27B2", "ch0000", "odp0000", "1");
        assert!(echoes.lock().is_empty());
    }

    #[test]
    fn standard_channel_input_is_not_echoed() {
        let (dispatcher, echoes) = dispatcher();
        let (target, _) = recording_target();
        dispatcher.table().register(
            SubscriptionKey::new("S1", "ch0000", "idp0000"),
            LogicalChannel::new("switch"),
            target,
            Converter::OnOff,
        );

        dispatcher.dispatch("S1", "ch0000", "idp0000", "1");
        assert!(echoes.lock().is_empty());
    }

    #[test]
    fn echo_happens_even_without_value() {
        let (dispatcher, echoes) = dispatcher();
        let (target, deliveries) = recording_target();
        dispatcher.table().register(
            SubscriptionKey::new("S1", "ch0000", "idp0000"),
            LogicalChannel::virtual_switch("virtualswitch"),
            target,
            Converter::OnOff,
        );

        let outcome = dispatcher.dispatch("S1", "ch0000", "idp0000", "7");
        assert_eq!(outcome, DispatchOutcome::Suppressed);
        assert_eq!(echoes.lock().len(), 1);
        assert!(deliveries.lock().is_empty());
    }

    #[test]
    fn failing_target_is_contained() {
        let (dispatcher, _) = dispatcher();
        let failing: Arc<dyn UpdateTarget> = Arc::new(|_: &LogicalChannel, _: Value| {
            Err(DeliveryError::new("thing handler gone"))
        });
        dispatcher.table().register(
            SubscriptionKey::new("S1", "ch0000", "odp0000"),
            LogicalChannel::new("switch"),
            failing,
            Converter::OnOff,
        );
        let (target, deliveries) = recording_target();
        dispatcher.table().register(
            SubscriptionKey::new("S1", "ch0001", "odp0000"),
            LogicalChannel::new("other"),
            target,
            Converter::OnOff,
        );

        assert_eq!(
            dispatcher.dispatch("S1", "ch0000", "odp0000", "1"),
            DispatchOutcome::DeliveryFailed
        );
        assert_eq!(
            dispatcher.dispatch("S1", "ch0001", "odp0000", "0"),
            DispatchOutcome::Delivered
        );
        assert_eq!(deliveries.lock().len(), 1);
    }

    #[test]
    fn panicking_target_is_contained() {
        let (dispatcher, _) = dispatcher();
        let panicking: Arc<dyn UpdateTarget> =
            Arc::new(|_: &LogicalChannel, _: Value| -> Result<(), DeliveryError> {
                panic!("target blew up")
            });
        dispatcher.table().register(
            SubscriptionKey::new("S1", "ch0000", "odp0000"),
            LogicalChannel::new("switch"),
            panicking,
            Converter::OnOff,
        );

        assert_eq!(
            dispatcher.dispatch("S1", "ch0000", "odp0000", "1"),
            DispatchOutcome::DeliveryFailed
        );
    }
}
