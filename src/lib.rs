//! # twintrader
//!
//! Two redundant traders mediating seller requests, with automatic failover:
//! - Peer heartbeats between the two traders
//! - Unilateral takeover when the peer stops answering
//! - Leader-change notification pushed to every known seller
//! - Sellers retry each numbered request until a trader acknowledges it
//!
//! ## Architecture
//!
//! ```text
//!   ┌────────────┐  heartbeat   ┌────────────┐
//!   │  Trader 1  │◄────────────►│  Trader 2  │
//!   │ (post 1)   │              │ (post 2)   │
//!   └─────▲──────┘              └─────┬──────┘
//!         │ submit                    │ leader update
//!         │                           │ (after takeover)
//!   ┌─────┴──────┐              ┌─────▼──────┐
//!   │  Seller 3  │              │  Seller 4  │
//!   └────────────┘              └────────────┘
//! ```
//!
//! ## Usage
//!
//! ### Start the traders
//! ```bash
//! twintrader-trader serve --id 1 --address localhost:8001 --peer localhost:8002 --post 1 \
//!   --sellers localhost:8003,localhost:8004
//! twintrader-trader serve --id 2 --address localhost:8002 --peer localhost:8001 --post 2 \
//!   --sellers localhost:8003,localhost:8004
//! ```
//!
//! ### Start a seller
//! ```bash
//! twintrader-seller serve --id 3 --address localhost:8003 --trader localhost:8001 --post 1
//! ```
//!
//! ### Inspect or poke a node
//! ```bash
//! twintrader status localhost:8002
//! twintrader submit localhost:8001 --seller 9 --request-id 1
//! ```

pub mod common;
pub mod seller;
pub mod trader;

// Re-export commonly used types
pub use common::{Config, Error, Result};
pub use seller::Seller;
pub use trader::Trader;

/// Current version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Build info
pub const BUILD_INFO: &str = concat!(env!("CARGO_PKG_VERSION"), " (", env!("CARGO_PKG_NAME"), ")");
