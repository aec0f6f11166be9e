//! Leader-change broadcast to sellers
//!
//! Best effort: each rostered seller gets one attempt, failures are logged
//! and skipped, nothing is retried or rolled back.

use crate::common::{RpcClient, TraderMetrics};
use serde::Serialize;
use std::sync::Arc;

/// Outcome of one broadcast
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct NotifyReport {
    pub delivered: Vec<String>,
    pub failed: Vec<String>,
}

impl NotifyReport {
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty()
    }
}

#[derive(Debug, Clone)]
pub struct DependentNotifier {
    trader_id: u32,
    roster: Arc<Vec<String>>,
    client: RpcClient,
    metrics: Arc<TraderMetrics>,
}

impl DependentNotifier {
    pub fn new(
        trader_id: u32,
        roster: Vec<String>,
        client: RpcClient,
        metrics: Arc<TraderMetrics>,
    ) -> Self {
        Self {
            trader_id,
            roster: Arc::new(roster),
            client,
            metrics,
        }
    }

    /// Tell every seller in the roster that `new_leader` is authoritative.
    pub async fn notify_all(&self, new_leader: &str) -> NotifyReport {
        let mut report = NotifyReport::default();

        for seller in self.roster.iter() {
            match self.client.update_leader(seller, new_leader).await {
                Ok(ack) => {
                    tracing::info!(
                        trader = self.trader_id,
                        seller = %seller,
                        leader = %new_leader,
                        reply = %ack.message,
                        "Notified seller about new leader"
                    );
                    self.metrics.notifications_delivered.inc();
                    report.delivered.push(seller.clone());
                }
                Err(e) => {
                    tracing::warn!(
                        trader = self.trader_id,
                        seller = %seller,
                        "Failed to notify seller: {}",
                        e
                    );
                    self.metrics.notifications_failed.inc();
                    report.failed.push(seller.clone());
                }
            }
        }

        report
    }
}
