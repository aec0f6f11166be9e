//! Trader implementation
//!
//! A trader is responsible for:
//! - Serving seller requests
//! - Probing its single peer trader
//! - Taking over every post when the peer stops answering
//! - Announcing itself to the seller roster after a takeover

pub mod heartbeat;
pub mod http;
pub mod notifier;
pub mod server;
pub mod state;
pub mod takeover;

pub use heartbeat::{HeartbeatMonitor, ProbeOutcome};
pub use notifier::{DependentNotifier, NotifyReport};
pub use server::{RunningTrader, Trader};
pub use state::{StateHandle, TraderState};
pub use takeover::LeadershipTakeover;
