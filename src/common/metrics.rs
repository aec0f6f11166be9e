//! Protocol counters exposed in Prometheus text format

use std::fmt::Write;
use std::sync::atomic::{AtomicU64, Ordering};

/// Monotonic counter
#[derive(Debug, Default)]
pub struct Counter {
    value: AtomicU64,
}

impl Counter {
    pub fn new() -> Self {
        Self {
            value: AtomicU64::new(0),
        }
    }

    pub fn inc(&self) {
        self.value.fetch_add(1, Ordering::Relaxed);
    }

    pub fn add(&self, n: u64) {
        self.value.fetch_add(n, Ordering::Relaxed);
    }

    pub fn get(&self) -> u64 {
        self.value.load(Ordering::Relaxed)
    }
}

fn render(out: &mut String, name: &str, help: &str, value: u64) {
    let _ = writeln!(out, "# HELP {} {}", name, help);
    let _ = writeln!(out, "# TYPE {} counter", name);
    let _ = writeln!(out, "{} {}", name, value);
}

/// Trader-side counters
#[derive(Debug, Default)]
pub struct TraderMetrics {
    pub heartbeats_sent: Counter,
    pub heartbeats_failed: Counter,
    pub heartbeats_received: Counter,
    pub takeovers: Counter,
    pub notifications_delivered: Counter,
    pub notifications_failed: Counter,
    pub requests_processed: Counter,
    pub requests_forwarded: Counter,
    pub forwards_received: Counter,
}

impl TraderMetrics {
    pub fn to_prometheus(&self) -> String {
        let mut out = String::new();
        for (name, help, counter) in [
            (
                "twintrader_heartbeats_sent_total",
                "Heartbeat probes sent to the peer",
                &self.heartbeats_sent,
            ),
            (
                "twintrader_heartbeats_failed_total",
                "Heartbeat probes that failed",
                &self.heartbeats_failed,
            ),
            (
                "twintrader_heartbeats_received_total",
                "Heartbeat probes received from the peer",
                &self.heartbeats_received,
            ),
            ("twintrader_takeovers_total", "Leadership takeovers run", &self.takeovers),
            (
                "twintrader_notifications_delivered_total",
                "Leader updates delivered to sellers",
                &self.notifications_delivered,
            ),
            (
                "twintrader_notifications_failed_total",
                "Leader updates that could not be delivered",
                &self.notifications_failed,
            ),
            (
                "twintrader_requests_processed_total",
                "Seller requests processed",
                &self.requests_processed,
            ),
            (
                "twintrader_requests_forwarded_total",
                "Requests forwarded to the peer",
                &self.requests_forwarded,
            ),
            (
                "twintrader_forwards_received_total",
                "Requests received from the peer",
                &self.forwards_received,
            ),
        ] {
            render(&mut out, name, help, counter.get());
        }
        out
    }
}

/// Seller-side counters
#[derive(Debug, Default)]
pub struct SellerMetrics {
    pub requests_submitted: Counter,
    pub requests_acknowledged: Counter,
    pub attempts_retried: Counter,
    pub leader_updates: Counter,
}

impl SellerMetrics {
    pub fn to_prometheus(&self) -> String {
        let mut out = String::new();
        for (name, help, counter) in [
            (
                "twintrader_seller_requests_submitted_total",
                "Logical requests started",
                &self.requests_submitted,
            ),
            (
                "twintrader_seller_requests_acknowledged_total",
                "Requests acknowledged by a trader",
                &self.requests_acknowledged,
            ),
            (
                "twintrader_seller_attempts_retried_total",
                "Attempts that had to be retried",
                &self.attempts_retried,
            ),
            (
                "twintrader_seller_leader_updates_total",
                "Leader updates received",
                &self.leader_updates,
            ),
        ] {
            render(&mut out, name, help, counter.get());
        }
        out
    }
}
