//! Peer liveness probing
//!
//! One probe per tick. A probe that cannot reach the peer counts as a miss;
//! once the miss threshold is met (one miss by default) the takeover runs on
//! that same tick. Failed probes are never retried before the next tick.

use crate::common::{Result, RpcClient, TraderMetrics};
use crate::trader::notifier::NotifyReport;
use crate::trader::state::StateHandle;
use crate::trader::takeover::LeadershipTakeover;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::{Instant, MissedTickBehavior};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProbeOutcome {
    /// The peer answered
    Acknowledged,
    /// The peer did not answer, threshold not reached yet
    Missed { consecutive: u32 },
    /// The peer was declared failed and the takeover ran
    TookOver(NotifyReport),
}

#[derive(Debug, Clone)]
pub struct HeartbeatMonitor {
    trader_id: u32,
    peer_addr: String,
    interval: Duration,
    miss_threshold: u32,
    client: RpcClient,
    state: StateHandle,
    takeover: LeadershipTakeover,
    metrics: Arc<TraderMetrics>,
}

impl HeartbeatMonitor {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        trader_id: u32,
        peer_addr: String,
        interval: Duration,
        miss_threshold: u32,
        client: RpcClient,
        state: StateHandle,
        takeover: LeadershipTakeover,
        metrics: Arc<TraderMetrics>,
    ) -> Self {
        Self {
            trader_id,
            peer_addr,
            interval,
            miss_threshold: miss_threshold.max(1),
            client,
            state,
            takeover,
            metrics,
        }
    }

    /// Send one probe and react to its outcome.
    pub async fn probe_once(&self) -> Result<ProbeOutcome> {
        self.metrics.heartbeats_sent.inc();
        match self.client.heartbeat(&self.peer_addr, self.trader_id).await {
            Ok(ack) => {
                self.state.peer_seen().await?;
                tracing::debug!(
                    trader = self.trader_id,
                    peer = %self.peer_addr,
                    reply = %ack.message,
                    "Heartbeat acknowledged by peer"
                );
                Ok(ProbeOutcome::Acknowledged)
            }
            Err(e) => {
                self.metrics.heartbeats_failed.inc();
                tracing::warn!(
                    trader = self.trader_id,
                    peer = %self.peer_addr,
                    "Heartbeat failed: {}",
                    e
                );

                if !self.state.probe_failed(self.miss_threshold).await? {
                    let consecutive = self.state.snapshot().await?.consecutive_misses;
                    return Ok(ProbeOutcome::Missed { consecutive });
                }

                tracing::warn!(
                    trader = self.trader_id,
                    peer = %self.peer_addr,
                    "Assuming peer failure"
                );
                let report = self.takeover.take_over().await?;
                Ok(ProbeOutcome::TookOver(report))
            }
        }
    }

    /// Probe forever, first probe one interval after start.
    pub async fn run(self) {
        let mut ticker = tokio::time::interval_at(Instant::now() + self.interval, self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        tracing::info!(
            trader = self.trader_id,
            peer = %self.peer_addr,
            interval_ms = self.interval.as_millis() as u64,
            miss_threshold = self.miss_threshold,
            "Heartbeat monitor started"
        );

        loop {
            ticker.tick().await;
            if let Err(e) = self.probe_once().await {
                tracing::error!(trader = self.trader_id, "Heartbeat tick failed: {}", e);
            }
        }
    }
}
