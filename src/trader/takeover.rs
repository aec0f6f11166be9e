//! Unilateral leadership takeover
//!
//! There is no election: a trader that loses its peer claims every post and
//! re-announces itself on each call.

use crate::common::{Result, TraderMetrics};
use crate::trader::notifier::{DependentNotifier, NotifyReport};
use crate::trader::state::StateHandle;
use std::sync::Arc;

#[derive(Debug, Clone)]
pub struct LeadershipTakeover {
    trader_id: u32,
    address: String,
    state: StateHandle,
    notifier: DependentNotifier,
    metrics: Arc<TraderMetrics>,
}

impl LeadershipTakeover {
    pub fn new(
        trader_id: u32,
        address: String,
        state: StateHandle,
        notifier: DependentNotifier,
        metrics: Arc<TraderMetrics>,
    ) -> Self {
        Self {
            trader_id,
            address,
            state,
            notifier,
            metrics,
        }
    }

    /// Become authoritative, then announce this trader to every seller.
    pub async fn take_over(&self) -> Result<NotifyReport> {
        let was_authoritative = self.state.claim_authority().await?;
        self.metrics.takeovers.inc();

        if was_authoritative {
            tracing::info!(
                trader = self.trader_id,
                "Already authoritative, re-announcing {}",
                self.address
            );
        } else {
            tracing::warn!(
                trader = self.trader_id,
                "Taking over all posts as the sole leader"
            );
        }

        let report = self.notifier.notify_all(&self.address).await;
        if !report.is_complete() {
            tracing::warn!(
                trader = self.trader_id,
                delivered = report.delivered.len(),
                failed = report.failed.len(),
                "Leader announcement reached only part of the roster"
            );
        }
        Ok(report)
    }
}
