//! Trader authority state
//!
//! The authoritative flag, the peer liveness view and the advisory request
//! log are owned by one task. Everything else talks to it through a
//! [`StateHandle`], so no lock is ever shared between the heartbeat task and
//! the RPC handlers.

use crate::common::{now_utc, Error, NodeState, Result, TradeRequest};
use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::{mpsc, oneshot};

const COMMAND_BUFFER: usize = 256;

/// Where a logged request came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RequestSource {
    Seller,
    Peer,
}

#[derive(Debug, Clone, Serialize)]
pub struct RecordedRequest {
    pub request: TradeRequest,
    pub source: RequestSource,
    pub received_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StateSnapshot {
    pub authoritative: bool,
    pub peer_state: NodeState,
    pub consecutive_misses: u32,
    pub takeovers: u64,
    pub last_peer_contact: Option<DateTime<Utc>>,
    pub requests_received: usize,
}

/// State owned by the state task
#[derive(Debug)]
pub struct TraderState {
    authoritative: bool,
    peer_state: NodeState,
    consecutive_misses: u32,
    takeovers: u64,
    last_peer_contact: Option<DateTime<Utc>>,
    requests: Vec<RecordedRequest>,
}

impl TraderState {
    pub fn new(authoritative: bool) -> Self {
        Self {
            authoritative,
            peer_state: NodeState::Alive,
            consecutive_misses: 0,
            takeovers: 0,
            last_peer_contact: None,
            requests: Vec::new(),
        }
    }

    pub fn peer_seen(&mut self) {
        self.peer_state = NodeState::Alive;
        self.consecutive_misses = 0;
        self.last_peer_contact = Some(now_utc());
    }

    /// Count a failed probe. Returns true once `threshold` consecutive
    /// probes have failed.
    pub fn probe_failed(&mut self, threshold: u32) -> bool {
        self.consecutive_misses = self.consecutive_misses.saturating_add(1);
        let dead = self.consecutive_misses >= threshold;
        self.peer_state = if dead {
            NodeState::Dead
        } else {
            NodeState::Suspect
        };
        dead
    }

    /// Become authoritative. Returns the previous flag.
    pub fn claim_authority(&mut self) -> bool {
        let was = self.authoritative;
        self.authoritative = true;
        self.takeovers += 1;
        was
    }

    pub fn record(&mut self, entry: RecordedRequest) {
        self.requests.push(entry);
    }

    pub fn snapshot(&self) -> StateSnapshot {
        StateSnapshot {
            authoritative: self.authoritative,
            peer_state: self.peer_state,
            consecutive_misses: self.consecutive_misses,
            takeovers: self.takeovers,
            last_peer_contact: self.last_peer_contact,
            requests_received: self.requests.len(),
        }
    }

    fn apply(&mut self, command: Command) {
        match command {
            Command::PeerSeen => self.peer_seen(),
            Command::ProbeFailed { threshold, reply } => {
                let _ = reply.send(self.probe_failed(threshold));
            }
            Command::ClaimAuthority { reply } => {
                let _ = reply.send(self.claim_authority());
            }
            Command::Record(entry) => self.record(entry),
            Command::Snapshot { reply } => {
                let _ = reply.send(self.snapshot());
            }
            Command::Requests { reply } => {
                let _ = reply.send(self.requests.clone());
            }
        }
    }
}

enum Command {
    PeerSeen,
    ProbeFailed {
        threshold: u32,
        reply: oneshot::Sender<bool>,
    },
    ClaimAuthority {
        reply: oneshot::Sender<bool>,
    },
    Record(RecordedRequest),
    Snapshot {
        reply: oneshot::Sender<StateSnapshot>,
    },
    Requests {
        reply: oneshot::Sender<Vec<RecordedRequest>>,
    },
}

/// Cloneable handle to the state task
#[derive(Debug, Clone)]
pub struct StateHandle {
    tx: mpsc::Sender<Command>,
}

impl StateHandle {
    /// Spawn the state task. It stops once every handle is dropped.
    pub fn spawn(initial: TraderState) -> Self {
        let (tx, mut rx) = mpsc::channel(COMMAND_BUFFER);
        tokio::spawn(async move {
            let mut state = initial;
            while let Some(command) = rx.recv().await {
                state.apply(command);
            }
        });
        Self { tx }
    }

    pub async fn peer_seen(&self) -> Result<()> {
        self.send(Command::PeerSeen).await
    }

    pub async fn probe_failed(&self, threshold: u32) -> Result<bool> {
        self.ask(|reply| Command::ProbeFailed { threshold, reply })
            .await
    }

    pub async fn claim_authority(&self) -> Result<bool> {
        self.ask(|reply| Command::ClaimAuthority { reply }).await
    }

    pub async fn record(&self, request: TradeRequest, source: RequestSource) -> Result<()> {
        self.send(Command::Record(RecordedRequest {
            request,
            source,
            received_at: now_utc(),
        }))
        .await
    }

    pub async fn snapshot(&self) -> Result<StateSnapshot> {
        self.ask(|reply| Command::Snapshot { reply }).await
    }

    pub async fn is_authoritative(&self) -> Result<bool> {
        Ok(self.snapshot().await?.authoritative)
    }

    pub async fn requests(&self) -> Result<Vec<RecordedRequest>> {
        self.ask(|reply| Command::Requests { reply }).await
    }

    async fn send(&self, command: Command) -> Result<()> {
        self.tx
            .send(command)
            .await
            .map_err(|_| Error::Internal("trader state task stopped".into()))
    }

    async fn ask<T>(&self, make: impl FnOnce(oneshot::Sender<T>) -> Command) -> Result<T> {
        let (reply, rx) = oneshot::channel();
        self.send(make(reply)).await?;
        rx.await
            .map_err(|_| Error::Internal("trader state task dropped reply".into()))
    }
}
