//! Common utilities and types shared by traders and sellers

pub mod config;
pub mod error;
pub mod message;
pub mod metrics;
pub mod tracing_middleware;
pub mod transport;
pub mod utils;

pub use config::{Config, NodeRole, RpcConfig, SellerConfig, TraderConfig};
pub use error::{Error, Result};
pub use message::{Ack, HeartbeatRequest, LeaderUpdate, TradeRequest, TradeResponse};
pub use metrics::{Counter, SellerMetrics, TraderMetrics};
pub use transport::RpcClient;
pub use utils::{base_url, now_utc, parse_duration, NodeState};
