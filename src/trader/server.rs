//! Trader server

use crate::common::{Result, RpcClient, TraderConfig, TraderMetrics};
use crate::trader::heartbeat::HeartbeatMonitor;
use crate::trader::http::{create_router, TraderAppState};
use crate::trader::notifier::DependentNotifier;
use crate::trader::state::{StateHandle, TraderState};
use crate::trader::takeover::LeadershipTakeover;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

pub struct Trader {
    config: TraderConfig,
    trader_id: u32,
}

/// A trader running in the background
pub struct RunningTrader {
    pub local_addr: SocketAddr,
    pub state: StateHandle,
    pub metrics: Arc<TraderMetrics>,
    pub takeover: LeadershipTakeover,
    task: JoinHandle<Result<()>>,
}

impl RunningTrader {
    /// Wait for the server to stop.
    pub async fn wait(self) -> Result<()> {
        match self.task.await {
            Ok(res) => res,
            Err(e) => Err(crate::Error::Internal(format!("trader task failed: {}", e))),
        }
    }

    /// Stop serving and probing immediately, as if the process died.
    pub fn kill(&self) {
        self.task.abort();
    }
}

impl Trader {
    pub fn new(config: TraderConfig, trader_id: u32) -> Self {
        Self { config, trader_id }
    }

    pub async fn serve(self) -> Result<()> {
        let listener = TcpListener::bind(self.config.bind_addr).await?;
        self.start(listener).await?.wait().await
    }

    /// Serve on an already bound listener and start the heartbeat monitor.
    pub async fn start(self, listener: TcpListener) -> Result<RunningTrader> {
        self.config.validate(self.trader_id)?;

        let local_addr = listener.local_addr()?;
        let address = self.config.advertised();
        let authoritative = self.config.starts_authoritative(self.trader_id);

        tracing::info!("Starting trader: {}", self.trader_id);
        tracing::info!("  RPC API: {}", local_addr);
        tracing::info!("  Advertised: {}", address);
        tracing::info!("  Peer: {}", self.config.peer_addr);
        tracing::info!("  Post: {}", self.config.post);
        tracing::info!("  Sellers: {:?}", self.config.sellers);

        let client = RpcClient::new(&self.config.rpc)?;
        let metrics = Arc::new(TraderMetrics::default());
        let state = StateHandle::spawn(TraderState::new(authoritative));

        let notifier = DependentNotifier::new(
            self.trader_id,
            self.config.sellers.clone(),
            client.clone(),
            metrics.clone(),
        );
        let takeover = LeadershipTakeover::new(
            self.trader_id,
            address.clone(),
            state.clone(),
            notifier,
            metrics.clone(),
        );
        let monitor = HeartbeatMonitor::new(
            self.trader_id,
            self.config.peer_addr.clone(),
            self.config.heartbeat_interval(),
            self.config.heartbeat_miss_threshold,
            client.clone(),
            state.clone(),
            takeover.clone(),
            metrics.clone(),
        );

        let app = TraderAppState {
            trader_id: self.trader_id,
            post: self.config.post,
            address,
            peer_addr: self.config.peer_addr.clone(),
            processing_delay: self.config.processing_delay(),
            forward_to_peer: self.config.forward_to_peer,
            client,
            state: state.clone(),
            metrics: metrics.clone(),
        };
        let router = create_router(app, self.config.max_concurrent_calls);

        tracing::info!(
            "✓ Trader {} ready ({})",
            self.trader_id,
            if authoritative { "authoritative" } else { "standby" }
        );

        let trader_id = self.trader_id;
        let task = tokio::spawn(async move {
            let http_server = axum::serve(listener, router);
            tokio::select! {
                res = http_server => {
                    if let Err(e) = res {
                        tracing::error!(trader = trader_id, "RPC server error: {}", e);
                        return Err(crate::Error::from(e));
                    }
                }
                _ = monitor.run() => {}
            }
            Ok::<(), crate::Error>(())
        });

        Ok(RunningTrader {
            local_addr,
            state,
            metrics,
            takeover,
            task,
        })
    }
}
