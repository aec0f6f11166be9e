//! Seller request delivery
//!
//! Each trigger prepares one numbered request and keeps sending it until a
//! trader acknowledges that exact number. Every attempt reads the believed
//! leader afresh, so a leader update received during the backoff redirects
//! the next attempt. Deliveries are serialized: a trigger that fires while a
//! request is still being retried is skipped.

use crate::common::{RpcClient, SellerMetrics, TradeRequest, TradeResponse};
use crate::seller::state::{RequestPhase, SellerState};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::{Instant, MissedTickBehavior};

/// A request acknowledged by a trader
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Delivery {
    pub request_id: u64,
    pub trader: String,
    pub attempts: u32,
    pub response: TradeResponse,
}

#[derive(Debug)]
pub struct DependentClient {
    state: Arc<SellerState>,
    client: RpcClient,
    backoff: Duration,
    item: String,
    quantity: u32,
    metrics: Arc<SellerMetrics>,
    slot: Mutex<()>,
}

impl DependentClient {
    pub fn new(
        state: Arc<SellerState>,
        client: RpcClient,
        backoff: Duration,
        item: String,
        quantity: u32,
        metrics: Arc<SellerMetrics>,
    ) -> Self {
        Self {
            state,
            client,
            backoff,
            item,
            quantity,
            metrics,
            slot: Mutex::new(()),
        }
    }

    pub fn state(&self) -> &Arc<SellerState> {
        &self.state
    }

    /// Build a request with a freshly allocated number.
    pub fn prepare(&self) -> TradeRequest {
        self.state.set_phase(RequestPhase::Preparing);
        TradeRequest {
            seller_id: self.state.seller_id(),
            post: self.state.post(),
            item: self.item.clone(),
            quantity: self.quantity,
            request_id: self.state.next_request_id(),
        }
    }

    /// Prepare and deliver one new request, waiting for any delivery in
    /// progress to finish first.
    pub async fn submit_next(&self) -> Delivery {
        let _slot = self.slot.lock().await;
        let req = self.prepare();
        self.metrics.requests_submitted.inc();
        self.deliver(&req).await
    }

    /// Send `req` until a trader acknowledges it. Never gives up.
    pub async fn deliver(&self, req: &TradeRequest) -> Delivery {
        let seller = self.state.seller_id();
        let mut attempts = 0u32;

        loop {
            self.state.set_phase(RequestPhase::Sending);
            let trader = self.state.leader();
            attempts += 1;

            match self.client.submit_request(&trader, req).await {
                Ok(res) if res.acknowledges(req.request_id) => {
                    tracing::info!(
                        seller,
                        trader = %trader,
                        attempts,
                        "Request {} processed successfully: {}",
                        req.request_id,
                        res.message
                    );
                    self.state.acknowledge(req.request_id);
                    self.state.set_phase(RequestPhase::Succeeded);
                    self.metrics.requests_acknowledged.inc();
                    return Delivery {
                        request_id: req.request_id,
                        trader,
                        attempts,
                        response: res,
                    };
                }
                Ok(res) => {
                    tracing::warn!(
                        seller,
                        trader = %trader,
                        "Trader response indicates request {} not processed (got id {}, processed={}). Retrying...",
                        req.request_id,
                        res.request_id,
                        res.processed
                    );
                }
                Err(e) if e.is_connect_failure() => {
                    tracing::warn!(
                        seller,
                        "Failed to connect to Trader at {}. Retrying...",
                        trader
                    );
                }
                Err(e) => {
                    tracing::warn!(
                        seller,
                        trader = %trader,
                        "Error sending request {}: {}. Retrying...",
                        req.request_id,
                        e
                    );
                }
            }

            self.metrics.attempts_retried.inc();
            tokio::time::sleep(self.backoff).await;
        }
    }

    /// Start a new delivery every `interval`, first one after one interval.
    pub async fn run(self: Arc<Self>, interval: Duration) {
        let mut ticker = tokio::time::interval_at(Instant::now() + interval, interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        tracing::info!(
            seller = self.state.seller_id(),
            interval_ms = interval.as_millis() as u64,
            backoff_ms = self.backoff.as_millis() as u64,
            "Request loop started"
        );

        loop {
            ticker.tick().await;
            self.submit_next().await;
        }
    }
}
