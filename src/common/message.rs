//! Wire messages exchanged between traders and sellers

use serde::{Deserialize, Serialize};

/// Liveness reply to a heartbeat probe
pub const ALIVE: &str = "Alive";

/// Status string of a processed request
pub const STATUS_SUCCESS: &str = "Success";

/// A seller's work request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TradeRequest {
    pub seller_id: u32,
    pub post: u32,
    pub item: String,
    pub quantity: u32,
    /// Unique, strictly increasing per seller
    pub request_id: u64,
}

/// A trader's answer to a [`TradeRequest`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TradeResponse {
    pub request_id: u64,
    pub status: String,
    pub message: String,
    pub processed: bool,
}

impl TradeResponse {
    pub fn success(req: &TradeRequest) -> Self {
        Self {
            request_id: req.request_id,
            status: STATUS_SUCCESS.to_string(),
            message: format!(
                "Processed request {}: {} {} from Seller {}",
                req.request_id, req.quantity, req.item, req.seller_id
            ),
            processed: true,
        }
    }

    /// Does this response acknowledge the request numbered `request_id`?
    pub fn acknowledges(&self, request_id: u64) -> bool {
        self.processed && self.request_id == request_id
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HeartbeatRequest {
    pub sender_id: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeaderUpdate {
    pub new_address: String,
}

/// Plain acknowledgment string
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ack {
    pub message: String,
}

impl Ack {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}
