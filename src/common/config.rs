//! Configuration for twintrader components

use crate::common::{Error, Result};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::Path;
use std::time::Duration;

/// Prefix for environment overrides, e.g. `TWINTRADER__TRADER__PEER_ADDR`
pub const ENV_PREFIX: &str = "TWINTRADER";

/// Global configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Node ID (small integer, unique per role)
    pub node_id: u32,

    /// Role (trader or seller)
    pub role: NodeRole,

    /// Trader-specific config
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trader: Option<TraderConfig>,

    /// Seller-specific config
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seller: Option<SellerConfig>,

    /// Logging level
    pub log_level: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            node_id: 0,
            role: NodeRole::Trader,
            trader: None,
            seller: None,
            log_level: default_log_level(),
        }
    }
}

impl Config {
    /// Load configuration from an optional TOML file, then `TWINTRADER__*`
    /// environment variables.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut builder = ::config::Config::builder();
        if let Some(path) = path {
            builder = builder.add_source(::config::File::from(path));
        }
        builder = builder.add_source(
            ::config::Environment::with_prefix(ENV_PREFIX)
                .prefix_separator("__")
                .separator("__")
                .list_separator(",")
                .with_list_parse_key("trader.sellers")
                .try_parsing(true),
        );

        let config: Config = builder.build()?.try_deserialize()?;
        Ok(config)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeRole {
    Trader,
    Seller,
}

/// Outbound call settings shared by both roles
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RpcConfig {
    /// Time allowed to establish a connection
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_ms: u64,

    /// Time allowed for a whole call, including remote processing
    #[serde(default = "default_request_timeout")]
    pub request_timeout_ms: u64,
}

fn default_connect_timeout() -> u64 {
    2_000
}
fn default_request_timeout() -> u64 {
    10_000
}

impl Default for RpcConfig {
    fn default() -> Self {
        Self {
            connect_timeout_ms: default_connect_timeout(),
            request_timeout_ms: default_request_timeout(),
        }
    }
}

impl RpcConfig {
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_ms)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }
}

/// Trader configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TraderConfig {
    /// Bind address for the RPC listener
    pub bind_addr: SocketAddr,

    /// Address announced to sellers on takeover (defaults to `bind_addr`)
    #[serde(default)]
    pub advertise_addr: Option<String>,

    /// The single peer trader
    pub peer_addr: String,

    /// Post assigned to this trader
    pub post: u32,

    /// Sellers to notify on takeover
    #[serde(default)]
    pub sellers: Vec<String>,

    /// Start authoritative (defaults to `node_id == 1`)
    #[serde(default)]
    pub authoritative: Option<bool>,

    /// Peer liveness probe period
    #[serde(default = "default_heartbeat_interval")]
    pub heartbeat_interval_ms: u64,

    /// Consecutive failed probes before takeover
    #[serde(default = "default_miss_threshold")]
    pub heartbeat_miss_threshold: u32,

    /// Simulated processing time per request
    #[serde(default = "default_processing_delay")]
    pub processing_delay_ms: u64,

    /// Mirror processed requests to the peer's advisory log
    #[serde(default)]
    pub forward_to_peer: bool,

    /// Inbound calls served concurrently
    #[serde(default = "default_max_concurrent_calls")]
    pub max_concurrent_calls: usize,

    #[serde(default)]
    pub rpc: RpcConfig,
}

fn default_heartbeat_interval() -> u64 {
    5_000
}
fn default_miss_threshold() -> u32 {
    1
}
fn default_processing_delay() -> u64 {
    2_000
}
fn default_max_concurrent_calls() -> usize {
    64
}

impl Default for TraderConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([0, 0, 0, 0], 8001)),
            advertise_addr: None,
            peer_addr: String::new(),
            post: 0,
            sellers: Vec::new(),
            authoritative: None,
            heartbeat_interval_ms: default_heartbeat_interval(),
            heartbeat_miss_threshold: default_miss_threshold(),
            processing_delay_ms: default_processing_delay(),
            forward_to_peer: false,
            max_concurrent_calls: default_max_concurrent_calls(),
            rpc: RpcConfig::default(),
        }
    }
}

impl TraderConfig {
    /// Address sellers should use to reach this trader.
    pub fn advertised(&self) -> String {
        self.advertise_addr
            .clone()
            .unwrap_or_else(|| self.bind_addr.to_string())
    }

    pub fn starts_authoritative(&self, node_id: u32) -> bool {
        self.authoritative.unwrap_or(node_id == 1)
    }

    pub fn heartbeat_interval(&self) -> Duration {
        Duration::from_millis(self.heartbeat_interval_ms)
    }

    pub fn processing_delay(&self) -> Duration {
        Duration::from_millis(self.processing_delay_ms)
    }

    pub fn validate(&self, node_id: u32) -> Result<()> {
        if node_id == 0 {
            return Err(Error::InvalidConfig("trader id must be non-zero".into()));
        }
        if self.peer_addr.trim().is_empty() {
            return Err(Error::InvalidConfig("peer address is required".into()));
        }
        if self.post == 0 {
            return Err(Error::InvalidConfig("post must be non-zero".into()));
        }
        if self.heartbeat_interval_ms == 0 {
            return Err(Error::InvalidConfig(
                "heartbeat interval must be positive".into(),
            ));
        }
        if self.heartbeat_miss_threshold == 0 {
            return Err(Error::InvalidConfig(
                "heartbeat miss threshold must be at least 1".into(),
            ));
        }
        if self.max_concurrent_calls == 0 {
            return Err(Error::InvalidConfig(
                "max_concurrent_calls must be positive".into(),
            ));
        }
        Ok(())
    }
}

/// Seller configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SellerConfig {
    /// Bind address for leader updates
    pub bind_addr: SocketAddr,

    /// Trader believed authoritative at startup
    pub trader_addr: String,

    /// Post this seller trades on
    pub post: u32,

    /// Period between new requests
    #[serde(default = "default_request_interval")]
    pub request_interval_ms: u64,

    /// Wait between attempts of the same request
    #[serde(default = "default_retry_backoff")]
    pub retry_backoff_ms: u64,

    #[serde(default = "default_item")]
    pub item: String,

    #[serde(default = "default_quantity")]
    pub quantity: u32,

    /// Inbound calls served concurrently
    #[serde(default = "default_max_concurrent_calls")]
    pub max_concurrent_calls: usize,

    #[serde(default)]
    pub rpc: RpcConfig,
}

fn default_request_interval() -> u64 {
    10_000
}
fn default_retry_backoff() -> u64 {
    5_000
}
fn default_item() -> String {
    "apples".to_string()
}
fn default_quantity() -> u32 {
    10
}

impl Default for SellerConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([0, 0, 0, 0], 8003)),
            trader_addr: String::new(),
            post: 0,
            request_interval_ms: default_request_interval(),
            retry_backoff_ms: default_retry_backoff(),
            item: default_item(),
            quantity: default_quantity(),
            max_concurrent_calls: default_max_concurrent_calls(),
            rpc: RpcConfig::default(),
        }
    }
}

impl SellerConfig {
    pub fn request_interval(&self) -> Duration {
        Duration::from_millis(self.request_interval_ms)
    }

    pub fn retry_backoff(&self) -> Duration {
        Duration::from_millis(self.retry_backoff_ms)
    }

    pub fn validate(&self, node_id: u32) -> Result<()> {
        if node_id == 0 {
            return Err(Error::InvalidConfig("seller id must be non-zero".into()));
        }
        if self.trader_addr.trim().is_empty() {
            return Err(Error::InvalidConfig("trader address is required".into()));
        }
        if self.post == 0 {
            return Err(Error::InvalidConfig("post must be non-zero".into()));
        }
        if self.request_interval_ms == 0 || self.retry_backoff_ms == 0 {
            return Err(Error::InvalidConfig(
                "request interval and retry backoff must be positive".into(),
            ));
        }
        if self.max_concurrent_calls == 0 {
            return Err(Error::InvalidConfig(
                "max_concurrent_calls must be positive".into(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_trader_defaults() {
        let conf = TraderConfig::default();
        assert_eq!(conf.heartbeat_interval(), Duration::from_secs(5));
        assert_eq!(conf.heartbeat_miss_threshold, 1);
        assert_eq!(conf.processing_delay(), Duration::from_secs(2));
        assert!(conf.starts_authoritative(1));
        assert!(!conf.starts_authoritative(2));
        assert_eq!(conf.advertised(), "0.0.0.0:8001");
    }

    #[test]
    fn test_advertised_address_overrides_bind() {
        let conf = TraderConfig {
            advertise_addr: Some("trader-a.internal:8001".into()),
            ..Default::default()
        };
        assert_eq!(conf.bind_addr.to_string(), "0.0.0.0:8001");
        assert_eq!(conf.advertised(), "trader-a.internal:8001");
    }

    #[test]
    fn test_trader_validation() {
        let mut conf = TraderConfig {
            peer_addr: "localhost:8002".into(),
            post: 1,
            ..Default::default()
        };
        assert!(conf.validate(1).is_ok());
        assert!(conf.validate(0).is_err());

        conf.heartbeat_miss_threshold = 0;
        assert!(matches!(conf.validate(1), Err(Error::InvalidConfig(_))));
    }

    #[test]
    fn test_seller_validation() {
        let conf = SellerConfig::default();
        assert!(conf.validate(1).is_err());

        let conf = SellerConfig {
            trader_addr: "localhost:8001".into(),
            post: 2,
            ..Default::default()
        };
        assert!(conf.validate(3).is_ok());
        assert_eq!(conf.retry_backoff(), Duration::from_secs(5));
        assert_eq!(conf.request_interval(), Duration::from_secs(10));
    }

    #[test]
    fn test_load_from_toml_file() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(
            file,
            r#"
node_id = 2
role = "trader"
log_level = "debug"

[trader]
bind_addr = "127.0.0.1:8002"
peer_addr = "localhost:8001"
post = 2
sellers = ["localhost:8003", "localhost:8004"]
heartbeat_interval_ms = 1000
"#
        )
        .unwrap();

        let config = Config::load(Some(file.path())).unwrap();
        assert_eq!(config.node_id, 2);
        assert_eq!(config.role, NodeRole::Trader);
        assert_eq!(config.log_level, "debug");

        let trader = config.trader.unwrap();
        assert_eq!(trader.sellers.len(), 2);
        assert_eq!(trader.heartbeat_interval_ms, 1000);
        assert_eq!(trader.heartbeat_miss_threshold, 1);
        assert_eq!(trader.rpc, RpcConfig::default());
        assert!(config.seller.is_none());
    }
}
