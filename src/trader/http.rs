//! Trader RPC endpoints
//!
//! - `POST /rpc/submit`: seller requests (the request router)
//! - `POST /rpc/heartbeat`: peer liveness probe
//! - `POST /rpc/forward`: requests mirrored by the peer
//! - `GET /status`, `GET /health`, `GET /metrics`

use crate::common::message::ALIVE;
use crate::common::tracing_middleware::request_id_middleware;
use crate::common::transport::routes;
use crate::common::{
    Ack, HeartbeatRequest, Result, RpcClient, TradeRequest, TradeResponse, TraderMetrics,
};
use crate::trader::state::{RequestSource, StateHandle, StateSnapshot};
use axum::{
    extract::State,
    http::{header, StatusCode},
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use tower::limit::GlobalConcurrencyLimitLayer;
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::trace::TraceLayer;

/// Largest accepted RPC body
const MAX_BODY_BYTES: usize = 64 * 1024;

#[derive(Debug, Clone)]
pub struct TraderAppState {
    pub trader_id: u32,
    pub post: u32,
    pub address: String,
    pub peer_addr: String,
    pub processing_delay: Duration,
    pub forward_to_peer: bool,
    pub client: RpcClient,
    pub state: StateHandle,
    pub metrics: Arc<TraderMetrics>,
}

#[derive(Debug, Serialize)]
pub struct TraderStatus {
    pub role: &'static str,
    pub trader_id: u32,
    pub post: u32,
    pub address: String,
    pub peer_addr: String,
    #[serde(flatten)]
    pub state: StateSnapshot,
}

pub fn create_router(state: TraderAppState, max_concurrent_calls: usize) -> Router {
    Router::new()
        .route(routes::SUBMIT, post(submit_request))
        .route(routes::HEARTBEAT, post(receive_heartbeat))
        .route(routes::FORWARD, post(receive_forward))
        .route(routes::STATUS, get(status))
        .route(routes::HEALTH, get(health))
        .route(routes::METRICS, get(metrics))
        .layer(axum::middleware::from_fn(request_id_middleware))
        .layer(RequestBodyLimitLayer::new(MAX_BODY_BYTES))
        .layer(TraceLayer::new_for_http())
        .layer(GlobalConcurrencyLimitLayer::new(max_concurrent_calls))
        .with_state(state)
}

/// Accept any request, whatever the post and the authority.
async fn submit_request(
    State(app): State<TraderAppState>,
    Json(req): Json<TradeRequest>,
) -> Json<TradeResponse> {
    tracing::info!(
        trader = app.trader_id,
        "Received request {} from Seller {} for {} {} in Post {}",
        req.request_id,
        req.seller_id,
        req.quantity,
        req.item,
        req.post
    );

    tokio::time::sleep(app.processing_delay).await;

    if let Err(e) = app.state.record(req.clone(), RequestSource::Seller).await {
        tracing::warn!(trader = app.trader_id, "Request log unavailable: {}", e);
    }
    app.metrics.requests_processed.inc();

    let res = TradeResponse::success(&req);

    if app.forward_to_peer {
        tokio::spawn(forward_to_peer(app.clone(), req));
    }

    Json(res)
}

async fn forward_to_peer(app: TraderAppState, req: TradeRequest) {
    match app.client.forward_request(&app.peer_addr, &req).await {
        Ok(_) => {
            app.metrics.requests_forwarded.inc();
            tracing::debug!(
                trader = app.trader_id,
                peer = %app.peer_addr,
                "Request {} forwarded",
                req.request_id
            );
        }
        Err(e) => {
            tracing::warn!(
                trader = app.trader_id,
                peer = %app.peer_addr,
                "Failed to forward request {}: {}",
                req.request_id,
                e
            );
        }
    }
}

async fn receive_heartbeat(
    State(app): State<TraderAppState>,
    Json(req): Json<HeartbeatRequest>,
) -> Json<Ack> {
    app.metrics.heartbeats_received.inc();
    if let Err(e) = app.state.peer_seen().await {
        tracing::warn!(trader = app.trader_id, "Could not record heartbeat: {}", e);
    }
    tracing::debug!(
        trader = app.trader_id,
        "Received heartbeat from Trader {}",
        req.sender_id
    );
    Json(Ack::new(ALIVE))
}

async fn receive_forward(
    State(app): State<TraderAppState>,
    Json(req): Json<TradeRequest>,
) -> Result<Json<Ack>> {
    app.state.record(req.clone(), RequestSource::Peer).await?;
    app.metrics.forwards_received.inc();
    tracing::debug!(
        trader = app.trader_id,
        "Received forwarded request {} from Seller {}",
        req.request_id,
        req.seller_id
    );
    Ok(Json(Ack::new(format!(
        "Request {} recorded by Trader {}",
        req.request_id, app.trader_id
    ))))
}

async fn status(State(app): State<TraderAppState>) -> Result<Json<TraderStatus>> {
    let state = app.state.snapshot().await?;
    Ok(Json(TraderStatus {
        role: "trader",
        trader_id: app.trader_id,
        post: app.post,
        address: app.address.clone(),
        peer_addr: app.peer_addr.clone(),
        state,
    }))
}

async fn health(State(app): State<TraderAppState>) -> impl IntoResponse {
    match app.state.snapshot().await {
        Ok(snap) => (
            StatusCode::OK,
            Json(json!({
                "status": "ok",
                "trader_id": app.trader_id,
                "authoritative": snap.authoritative,
            })),
        ),
        Err(e) => (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(json!({ "status": "unavailable", "reason": e.to_string() })),
        ),
    }
}

async fn metrics(State(app): State<TraderAppState>) -> impl IntoResponse {
    (
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        app.metrics.to_prometheus(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::RpcConfig;
    use crate::trader::state::TraderState;
    use axum::body::{to_bytes, Body};
    use axum::http::Request;
    use tower::ServiceExt;

    fn app_state(delay: Duration) -> TraderAppState {
        TraderAppState {
            trader_id: 1,
            post: 1,
            address: "127.0.0.1:8001".into(),
            peer_addr: "127.0.0.1:8002".into(),
            processing_delay: delay,
            forward_to_peer: false,
            client: RpcClient::new(&RpcConfig::default()).unwrap(),
            state: StateHandle::spawn(TraderState::new(true)),
            metrics: Arc::new(TraderMetrics::default()),
        }
    }

    fn post_json(uri: &str, body: serde_json::Value) -> Request<Body> {
        Request::post(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    #[tokio::test]
    async fn test_submit_echoes_request_id() {
        let state = app_state(Duration::from_millis(5));
        let router = create_router(state.clone(), 4);

        let req = post_json(
            routes::SUBMIT,
            json!({
                "seller_id": 3,
                "post": 2,
                "item": "apples",
                "quantity": 10,
                "request_id": 42
            }),
        );
        let resp = router.oneshot(req).await.unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        assert!(resp
            .headers()
            .contains_key(crate::common::tracing_middleware::REQUEST_ID_HEADER));

        let body = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        let res: TradeResponse = serde_json::from_slice(&body).unwrap();
        assert!(res.processed);
        assert_eq!(res.request_id, 42);
        assert_eq!(res.status, "Success");

        // Post 2 belongs to the other trader; it is processed anyway.
        let logged = state.state.requests().await.unwrap();
        assert_eq!(logged.len(), 1);
        assert_eq!(logged[0].request.post, 2);
        assert_eq!(state.metrics.requests_processed.get(), 1);
    }

    #[tokio::test]
    async fn test_heartbeat_replies_alive() {
        let state = app_state(Duration::ZERO);
        let router = create_router(state.clone(), 4);

        let resp = router
            .oneshot(post_json(routes::HEARTBEAT, json!({ "sender_id": 2 })))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        let body = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        let ack: Ack = serde_json::from_slice(&body).unwrap();
        assert_eq!(ack.message, "Alive");

        let snap = state.state.snapshot().await.unwrap();
        assert!(snap.last_peer_contact.is_some());
        assert_eq!(state.metrics.heartbeats_received.get(), 1);
    }

    #[tokio::test]
    async fn test_malformed_submit_is_rejected() {
        let router = create_router(app_state(Duration::ZERO), 4);
        let resp = router
            .oneshot(post_json(routes::SUBMIT, json!({ "seller_id": "x" })))
            .await
            .unwrap();
        assert!(resp.status().is_client_error());
    }

    #[tokio::test]
    async fn test_status_reports_authority() {
        let router = create_router(app_state(Duration::ZERO), 4);
        let resp = router
            .oneshot(Request::get(routes::STATUS).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let body = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        let value: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(value["role"], "trader");
        assert_eq!(value["authoritative"], true);
        assert_eq!(value["peer_state"], "alive");
    }
}
