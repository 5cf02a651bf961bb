// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Delayed actions that are superseded by newer ones.
//!
//! Used for channels that fall back to a resting value after a while, such
//! as a scene trigger that reads `ON` for a few seconds and then resets.

use std::time::Duration;

use parking_lot::Mutex;
use tokio::task::JoinHandle;

/// Runs at most one pending action after a delay.
///
/// Scheduling a new action cancels the pending one. Dropping the timer
/// cancels it as well.
///
/// # Examples
///
/// ```
/// use std::time::Duration;
/// use fah_bridge::schedule::ResetTimer;
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() {
/// let timer = ResetTimer::new();
/// timer.schedule(Duration::from_secs(5), || println!("scene reset"));
/// assert!(timer.is_pending());
/// timer.cancel();
/// # }
/// ```
#[derive(Debug, Default)]
pub struct ResetTimer {
    pending: Mutex<Option<JoinHandle<()>>>,
}

impl ResetTimer {
    /// Creates an idle timer.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Runs `action` after `delay`, replacing any pending action.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn schedule<F>(&self, delay: Duration, action: F)
    where
        F: FnOnce() + Send + 'static,
    {
        let task = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            action();
        });

        if let Some(previous) = self.pending.lock().replace(task) {
            if !previous.is_finished() {
                tracing::trace!("Superseding pending reset");
            }
            previous.abort();
        }
    }

    /// Cancels the pending action.
    ///
    /// Returns `true` if an action was still waiting.
    pub fn cancel(&self) -> bool {
        match self.pending.lock().take() {
            Some(task) => {
                let waiting = !task.is_finished();
                task.abort();
                waiting
            }
            None => false,
        }
    }

    /// Returns `true` if an action is waiting to run.
    #[must_use]
    pub fn is_pending(&self) -> bool {
        self.pending
            .lock()
            .as_ref()
            .is_some_and(|task| !task.is_finished())
    }
}

impl Drop for ResetTimer {
    fn drop(&mut self) {
        if let Some(task) = self.pending.get_mut().take() {
            task.abort();
        }
    }
}
