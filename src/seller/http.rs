//! Seller RPC endpoints
//!
//! - `POST /rpc/leader`: leader update from a trader
//! - `GET /status`, `GET /health`, `GET /metrics`

use crate::common::tracing_middleware::request_id_middleware;
use crate::common::transport::routes;
use crate::common::{Ack, Error, LeaderUpdate, Result, SellerMetrics};
use crate::seller::state::{SellerSnapshot, SellerState};
use axum::{
    extract::State,
    http::header,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde_json::json;
use std::sync::Arc;
use tower::limit::GlobalConcurrencyLimitLayer;
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::trace::TraceLayer;

const MAX_BODY_BYTES: usize = 16 * 1024;

#[derive(Debug, Clone)]
pub struct SellerAppState {
    pub state: Arc<SellerState>,
    pub metrics: Arc<SellerMetrics>,
}

pub fn create_router(state: SellerAppState, max_concurrent_calls: usize) -> Router {
    Router::new()
        .route(routes::LEADER, post(update_leader))
        .route(routes::STATUS, get(status))
        .route(routes::HEALTH, get(health))
        .route(routes::METRICS, get(metrics))
        .layer(axum::middleware::from_fn(request_id_middleware))
        .layer(RequestBodyLimitLayer::new(MAX_BODY_BYTES))
        .layer(TraceLayer::new_for_http())
        .layer(GlobalConcurrencyLimitLayer::new(max_concurrent_calls))
        .with_state(state)
}

/// Point the next delivery attempt at `new_address`. Accepted at any time,
/// including while a request is being retried.
async fn update_leader(
    State(app): State<SellerAppState>,
    Json(update): Json<LeaderUpdate>,
) -> Result<Json<Ack>> {
    let new_address = update.new_address.trim();
    if new_address.is_empty() {
        return Err(Error::InvalidRequest("empty leader address".into()));
    }

    app.metrics.leader_updates.inc();
    let changed = app.state.update_leader(new_address);
    tracing::info!(
        seller = app.state.seller_id(),
        changed,
        "Updating Trader to new leader at {}",
        new_address
    );
    Ok(Json(Ack::new("Leader updated successfully")))
}

async fn status(State(app): State<SellerAppState>) -> Json<SellerSnapshot> {
    Json(app.state.snapshot())
}

async fn health(State(app): State<SellerAppState>) -> impl IntoResponse {
    Json(json!({
        "status": "ok",
        "seller_id": app.state.seller_id(),
        "leader": app.state.leader(),
    }))
}

async fn metrics(State(app): State<SellerAppState>) -> impl IntoResponse {
    (
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        app.metrics.to_prometheus(),
    )
}
