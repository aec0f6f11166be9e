//! Seller state: believed leader and request numbering

use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::watch;

/// Phase of the request currently being delivered
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RequestPhase {
    Idle,
    Preparing,
    Sending,
    Succeeded,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SellerSnapshot {
    pub seller_id: u32,
    pub post: u32,
    pub leader: String,
    pub phase: RequestPhase,
    pub last_issued: u64,
    pub last_acknowledged: Option<u64>,
}

#[derive(Debug)]
pub struct SellerState {
    seller_id: u32,
    post: u32,
    leader: watch::Sender<String>,
    phase: watch::Sender<RequestPhase>,
    last_issued: AtomicU64,
    last_acknowledged: AtomicU64,
}

impl SellerState {
    pub fn new(seller_id: u32, post: u32, trader_addr: impl Into<String>) -> Self {
        Self {
            seller_id,
            post,
            leader: watch::Sender::new(trader_addr.into()),
            phase: watch::Sender::new(RequestPhase::Idle),
            last_issued: AtomicU64::new(0),
            last_acknowledged: AtomicU64::new(0),
        }
    }

    pub fn seller_id(&self) -> u32 {
        self.seller_id
    }

    pub fn post(&self) -> u32 {
        self.post
    }

    /// Trader currently believed authoritative
    pub fn leader(&self) -> String {
        self.leader.borrow().clone()
    }

    /// Overwrite the believed leader. Returns false when it was already set
    /// to `addr`.
    pub fn update_leader(&self, addr: &str) -> bool {
        self.leader.send_if_modified(|current| {
            if current == addr {
                false
            } else {
                *current = addr.to_string();
                true
            }
        })
    }

    /// Allocate the next request number. Never reused, never reset.
    pub fn next_request_id(&self) -> u64 {
        self.last_issued.fetch_add(1, Ordering::SeqCst) + 1
    }

    pub fn last_issued(&self) -> u64 {
        self.last_issued.load(Ordering::SeqCst)
    }

    pub fn acknowledge(&self, request_id: u64) {
        self.last_acknowledged.fetch_max(request_id, Ordering::SeqCst);
    }

    pub fn last_acknowledged(&self) -> Option<u64> {
        match self.last_acknowledged.load(Ordering::SeqCst) {
            0 => None,
            id => Some(id),
        }
    }

    pub fn set_phase(&self, phase: RequestPhase) {
        self.phase.send_replace(phase);
    }

    pub fn phase(&self) -> RequestPhase {
        *self.phase.borrow()
    }

    pub fn snapshot(&self) -> SellerSnapshot {
        SellerSnapshot {
            seller_id: self.seller_id,
            post: self.post,
            leader: self.leader(),
            phase: self.phase(),
            last_issued: self.last_issued(),
            last_acknowledged: self.last_acknowledged(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use std::sync::Arc;

    #[test]
    fn test_update_leader_is_idempotent() {
        let state = SellerState::new(1, 1, "localhost:8001");
        assert!(state.update_leader("localhost:8002"));
        assert!(!state.update_leader("localhost:8002"));
        assert_eq!(state.leader(), "localhost:8002");
    }

    #[test]
    fn test_request_ids_start_at_one() {
        let state = SellerState::new(1, 1, "localhost:8001");
        assert_eq!(state.last_issued(), 0);
        assert_eq!(state.next_request_id(), 1);
        assert_eq!(state.next_request_id(), 2);
        assert_eq!(state.last_issued(), 2);
    }

    #[test]
    fn test_acknowledge_keeps_maximum() {
        let state = SellerState::new(1, 1, "localhost:8001");
        assert_eq!(state.last_acknowledged(), None);
        state.acknowledge(3);
        state.acknowledge(2);
        assert_eq!(state.last_acknowledged(), Some(3));
    }

    #[test]
    fn test_concurrent_ids_are_unique() {
        let state = Arc::new(SellerState::new(1, 1, "localhost:8001"));
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let state = state.clone();
                std::thread::spawn(move || {
                    let ids: Vec<u64> = (0..500).map(|_| state.next_request_id()).collect();
                    assert!(ids.windows(2).all(|w| w[0] < w[1]));
                    ids
                })
            })
            .collect();

        let mut seen = HashSet::new();
        for handle in handles {
            for id in handle.join().unwrap() {
                assert!(seen.insert(id), "request id {} issued twice", id);
            }
        }
        assert_eq!(seen.len(), 4000);
        assert_eq!(state.last_issued(), 4000);
    }
}
