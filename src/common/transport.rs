//! Point-to-point RPC client
//!
//! Every call is a JSON POST to one of the routes below. Connections are
//! not pooled: each call dials the remote afresh, so a dead process is seen
//! as a connection failure on the very next call.

use crate::common::message::{
    Ack, HeartbeatRequest, LeaderUpdate, TradeRequest, TradeResponse,
};
use crate::common::utils::base_url;
use crate::common::{Error, Result, RpcConfig};
use serde::de::DeserializeOwned;
use serde::Serialize;

pub mod routes {
    pub const SUBMIT: &str = "/rpc/submit";
    pub const HEARTBEAT: &str = "/rpc/heartbeat";
    pub const FORWARD: &str = "/rpc/forward";
    pub const LEADER: &str = "/rpc/leader";
    pub const STATUS: &str = "/status";
    pub const HEALTH: &str = "/health";
    pub const METRICS: &str = "/metrics";
}

#[derive(Debug, Clone)]
pub struct RpcClient {
    http: reqwest::Client,
}

impl RpcClient {
    pub fn new(config: &RpcConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .connect_timeout(config.connect_timeout())
            .timeout(config.request_timeout())
            .pool_max_idle_per_host(0)
            .build()
            .map_err(|e| Error::Internal(format!("failed to build HTTP client: {}", e)))?;
        Ok(Self { http })
    }

    /// Seller → Trader
    pub async fn submit_request(&self, addr: &str, req: &TradeRequest) -> Result<TradeResponse> {
        self.call(addr, routes::SUBMIT, req).await
    }

    /// Trader → Trader liveness probe
    pub async fn heartbeat(&self, addr: &str, sender_id: u32) -> Result<Ack> {
        self.call(addr, routes::HEARTBEAT, &HeartbeatRequest { sender_id })
            .await
    }

    /// Trader → Trader copy of a processed request
    pub async fn forward_request(&self, addr: &str, req: &TradeRequest) -> Result<Ack> {
        self.call(addr, routes::FORWARD, req).await
    }

    /// Trader → Seller
    pub async fn update_leader(&self, addr: &str, new_address: &str) -> Result<Ack> {
        let update = LeaderUpdate {
            new_address: new_address.to_string(),
        };
        self.call(addr, routes::LEADER, &update).await
    }

    /// Status snapshot of any node
    pub async fn status(&self, addr: &str) -> Result<serde_json::Value> {
        let url = format!("{}{}", base_url(addr), routes::STATUS);
        let resp = self
            .http
            .get(&url)
            .send()
            .await
            .map_err(|e| Error::from_reqwest(addr, e))?;
        Self::decode(addr, resp).await
    }

    async fn call<B, R>(&self, addr: &str, route: &str, body: &B) -> Result<R>
    where
        B: Serialize + ?Sized,
        R: DeserializeOwned,
    {
        let url = format!("{}{}", base_url(addr), route);
        let resp = self
            .http
            .post(&url)
            .json(body)
            .send()
            .await
            .map_err(|e| Error::from_reqwest(addr, e))?;
        Self::decode(addr, resp).await
    }

    async fn decode<R: DeserializeOwned>(addr: &str, resp: reqwest::Response) -> Result<R> {
        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(Error::Rejected {
                addr: addr.to_string(),
                status: status.as_u16(),
                body,
            });
        }
        resp.json::<R>()
            .await
            .map_err(|e| Error::from_reqwest(addr, e))
    }
}
