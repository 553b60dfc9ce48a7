// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Poll pacing and Ctrl+C handling.

use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

use tokio::time::{Instant, Interval, MissedTickBehavior};

/// Resolves when the user presses Ctrl+C.
pub type Shutdown = Pin<Box<dyn Future<Output = std::io::Result<()>> + Send>>;

/// Returns a pinned Ctrl+C future; create it once so no signal is missed.
pub fn shutdown_signal() -> Shutdown {
    Box::pin(tokio::signal::ctrl_c())
}

/// Fires immediately, then every `period`, until Ctrl+C.
pub struct Ticker {
    interval: Interval,
    shutdown: Shutdown,
}

impl Ticker {
    pub fn new(period: Duration) -> Self {
        Self::with_interval(tokio::time::interval(period))
    }

    /// Like [`Ticker::new`], but the first tick waits one `period`.
    pub fn delayed(period: Duration) -> Self {
        Self::with_interval(tokio::time::interval_at(Instant::now() + period, period))
    }

    fn with_interval(mut interval: Interval) -> Self {
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        Self {
            interval,
            shutdown: shutdown_signal(),
        }
    }

    /// Waits for the next tick; `false` once Ctrl+C was pressed.
    pub async fn tick(&mut self) -> bool {
        tokio::select! {
            _ = self.interval.tick() => true,
            _ = &mut self.shutdown => {
                tracing::info!("Stopping");
                false
            }
        }
    }
}
