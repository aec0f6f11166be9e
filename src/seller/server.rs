//! Seller server

use crate::common::{Result, RpcClient, SellerConfig, SellerMetrics};
use crate::seller::client::DependentClient;
use crate::seller::http::{create_router, SellerAppState};
use crate::seller::state::SellerState;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

pub struct Seller {
    config: SellerConfig,
    seller_id: u32,
}

/// A seller running in the background
pub struct RunningSeller {
    pub local_addr: SocketAddr,
    pub state: Arc<SellerState>,
    pub metrics: Arc<SellerMetrics>,
    task: JoinHandle<Result<()>>,
}

impl RunningSeller {
    pub async fn wait(self) -> Result<()> {
        match self.task.await {
            Ok(res) => res,
            Err(e) => Err(crate::Error::Internal(format!("seller task failed: {}", e))),
        }
    }

    pub fn kill(&self) {
        self.task.abort();
    }
}

impl Seller {
    pub fn new(config: SellerConfig, seller_id: u32) -> Self {
        Self { config, seller_id }
    }

    pub async fn serve(self) -> Result<()> {
        let listener = TcpListener::bind(self.config.bind_addr).await?;
        self.start(listener).await?.wait().await
    }

    /// Serve leader updates on `listener` and start the request loop.
    pub async fn start(self, listener: TcpListener) -> Result<RunningSeller> {
        self.config.validate(self.seller_id)?;

        let local_addr = listener.local_addr()?;

        tracing::info!("Starting seller: {}", self.seller_id);
        tracing::info!("  RPC API: {}", local_addr);
        tracing::info!("  Trader: {}", self.config.trader_addr);
        tracing::info!("  Post: {}", self.config.post);

        let state = Arc::new(SellerState::new(
            self.seller_id,
            self.config.post,
            self.config.trader_addr.clone(),
        ));
        let metrics = Arc::new(SellerMetrics::default());
        let client = Arc::new(DependentClient::new(
            state.clone(),
            RpcClient::new(&self.config.rpc)?,
            self.config.retry_backoff(),
            self.config.item.clone(),
            self.config.quantity,
            metrics.clone(),
        ));

        let router = create_router(
            SellerAppState {
                state: state.clone(),
                metrics: metrics.clone(),
            },
            self.config.max_concurrent_calls,
        );

        tracing::info!("✓ Seller {} ready", self.seller_id);

        let seller_id = self.seller_id;
        let interval = self.config.request_interval();
        let task = tokio::spawn(async move {
            let http_server = axum::serve(listener, router);
            tokio::select! {
                res = http_server => {
                    if let Err(e) = res {
                        tracing::error!(seller = seller_id, "RPC server error: {}", e);
                        return Err(crate::Error::from(e));
                    }
                }
                _ = client.run(interval) => {}
            }
            Ok::<(), crate::Error>(())
        });

        Ok(RunningSeller {
            local_addr,
            state,
            metrics,
            task,
        })
    }
}
