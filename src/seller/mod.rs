//! Seller (dependent) implementation
//!
//! A seller submits numbered requests to the trader it believes is
//! authoritative, retries until one is acknowledged, and follows leader
//! updates pushed by a trader after a takeover.

pub mod client;
pub mod http;
pub mod server;
pub mod state;

pub use client::{DependentClient, Delivery};
pub use server::{RunningSeller, Seller};
pub use state::{RequestPhase, SellerState};
