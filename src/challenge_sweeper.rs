// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Challenge Sweeper
//!
//! Background task that periodically drops expired sign-in challenges so the
//! in-memory store does not grow with abandoned attempts. Consumption checks
//! expiry on its own, so a late sweep never lets a stale nonce through.
//!
//! ## Shutdown
//!
//! Stops when its `tokio_util::sync::CancellationToken` is cancelled.

use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::auth::ChallengeStore;
use crate::config::DEFAULT_SWEEP_INTERVAL;

/// Periodic purge of expired challenges.
pub struct ChallengeSweeper {
    challenges: Arc<ChallengeStore>,
    interval: Duration,
}

impl ChallengeSweeper {
    pub fn new(challenges: Arc<ChallengeStore>) -> Self {
        Self {
            challenges,
            interval: DEFAULT_SWEEP_INTERVAL,
        }
    }

    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    /// Run until the cancellation token is triggered.
    ///
    /// ```rust,ignore
    /// tokio::spawn(sweeper.run(shutdown.clone()));
    /// ```
    pub async fn run(self, shutdown: CancellationToken) {
        info!(
            interval_secs = self.interval.as_secs(),
            "Challenge sweeper starting"
        );

        loop {
            tokio::select! {
                _ = tokio::time::sleep(self.interval) => {},
                _ = shutdown.cancelled() => {
                    info!("Challenge sweeper shutting down");
                    return;
                }
            }

            self.sweep();
        }
    }

    /// One purge pass. Returns the number of challenges removed.
    pub fn sweep(&self) -> usize {
        let removed = self.challenges.purge_expired();
        if removed > 0 {
            debug!(
                removed,
                outstanding = self.challenges.len(),
                "Purged expired challenges"
            );
        }
        removed
    }
}
