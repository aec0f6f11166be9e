//! Seller delivery: retry against a dead trader, redirect on leader update,
//! and refusal of responses that do not acknowledge the request

use axum::{extract::State, routing::post, Json, Router};
use std::net::SocketAddr;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::time::Instant;
use twintrader::common::transport::routes;
use twintrader::common::{
    RpcClient, RpcConfig, SellerConfig, SellerMetrics, TradeRequest, TradeResponse, TraderConfig,
};
use twintrader::seller::{DependentClient, RequestPhase, SellerState};
use twintrader::trader::RunningTrader;
use twintrader::{Seller, Trader};

fn rpc() -> RpcConfig {
    RpcConfig {
        connect_timeout_ms: 200,
        request_timeout_ms: 1_000,
    }
}

async fn dead_addr() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    listener.local_addr().unwrap()
}

async fn start_trader() -> RunningTrader {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    Trader::new(
        TraderConfig {
            bind_addr: addr,
            advertise_addr: Some(addr.to_string()),
            peer_addr: dead_addr().await.to_string(),
            post: 2,
            heartbeat_interval_ms: 3_600_000,
            processing_delay_ms: 10,
            rpc: rpc(),
            ..Default::default()
        },
        2,
    )
    .start(listener)
    .await
    .unwrap()
}

fn client_for(leader: &str, backoff: Duration) -> (Arc<DependentClient>, Arc<SellerMetrics>) {
    let state = Arc::new(SellerState::new(3, 1, leader));
    let metrics = Arc::new(SellerMetrics::default());
    let client = Arc::new(DependentClient::new(
        state,
        RpcClient::new(&rpc()).unwrap(),
        backoff,
        "apples".to_string(),
        10,
        metrics.clone(),
    ));
    (client, metrics)
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_retry_converges_after_leader_update() {
    let dead = dead_addr().await.to_string();
    let backoff = Duration::from_millis(100);
    let (client, metrics) = client_for(&dead, backoff);

    let delivering = {
        let client = client.clone();
        tokio::spawn(async move { client.submit_next().await })
    };

    // Keeps failing against the dead trader.
    tokio::time::sleep(Duration::from_millis(350)).await;
    assert!(!delivering.is_finished());
    assert!(metrics.attempts_retried.get() >= 2);
    assert_eq!(client.state().phase(), RequestPhase::Sending);
    assert_eq!(client.state().last_acknowledged(), None);

    let trader = start_trader().await;
    let new_leader = trader.local_addr.to_string();
    assert!(client.state().update_leader(&new_leader));

    // One backoff plus the call itself.
    let delivery = tokio::time::timeout(backoff + rpc().request_timeout(), delivering)
        .await
        .expect("delivery did not converge")
        .unwrap();
    assert_eq!(delivery.request_id, 1);
    assert_eq!(delivery.trader, new_leader);
    assert!(delivery.attempts >= 3);
    assert!(delivery.response.processed);
    assert_eq!(client.state().last_acknowledged(), Some(1));
    assert_eq!(client.state().phase(), RequestPhase::Succeeded);

    // The counter carries on across the redirect.
    let next = client.submit_next().await;
    assert_eq!(next.request_id, 2);
    assert_eq!(next.attempts, 1);

    let ids: Vec<u64> = trader
        .state
        .requests()
        .await
        .unwrap()
        .iter()
        .map(|r| r.request.request_id)
        .collect();
    assert_eq!(ids, vec![1, 2]);

    trader.kill();
}

#[derive(Clone, Default)]
struct Flaky {
    calls: Arc<AtomicU32>,
}

/// Unprocessed twice, then the wrong request id once, then a real answer.
async fn flaky_submit(
    State(flaky): State<Flaky>,
    Json(req): Json<TradeRequest>,
) -> Json<TradeResponse> {
    let call = flaky.calls.fetch_add(1, Ordering::SeqCst);
    let mut res = TradeResponse::success(&req);
    match call {
        0 | 1 => {
            res.processed = false;
            res.status = "Busy".to_string();
        }
        2 => res.request_id = req.request_id + 100,
        _ => {}
    }
    Json(res)
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_unacknowledged_responses_are_retried() {
    let flaky = Flaky::default();
    let router = Router::new()
        .route(routes::SUBMIT, post(flaky_submit))
        .with_state(flaky.clone());
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let server = tokio::spawn(async move { axum::serve(listener, router).await });

    let (client, metrics) = client_for(&addr.to_string(), Duration::from_millis(20));
    let delivery = tokio::time::timeout(Duration::from_secs(5), client.submit_next())
        .await
        .unwrap();

    assert_eq!(delivery.request_id, 1);
    assert_eq!(delivery.attempts, 4);
    assert!(delivery.response.acknowledges(1));
    assert_eq!(flaky.calls.load(Ordering::SeqCst), 4);
    assert_eq!(metrics.attempts_retried.get(), 3);
    assert_eq!(metrics.requests_acknowledged.get(), 1);

    server.abort();
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_deliveries_are_serialized() {
    let trader = start_trader().await;
    let (client, metrics) =
        client_for(&trader.local_addr.to_string(), Duration::from_millis(20));

    let mut tasks = Vec::new();
    for _ in 0..4 {
        let client = client.clone();
        tasks.push(tokio::spawn(async move { client.submit_next().await }));
    }
    let mut ids = Vec::new();
    for task in tasks {
        ids.push(task.await.unwrap().request_id);
    }
    ids.sort_unstable();
    assert_eq!(ids, vec![1, 2, 3, 4]);
    assert_eq!(metrics.requests_submitted.get(), 4);

    // Requests reached the trader one at a time, in numbering order.
    let seen: Vec<u64> = trader
        .state
        .requests()
        .await
        .unwrap()
        .iter()
        .map(|r| r.request.request_id)
        .collect();
    assert_eq!(seen, vec![1, 2, 3, 4]);

    trader.kill();
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_leader_update_rpc_redirects_within_one_backoff() {
    let backoff = Duration::from_millis(300);
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let seller = Seller::new(
        SellerConfig {
            bind_addr: listener.local_addr().unwrap(),
            trader_addr: dead_addr().await.to_string(),
            post: 1,
            request_interval_ms: 50,
            retry_backoff_ms: backoff.as_millis() as u64,
            rpc: rpc(),
            ..Default::default()
        },
        3,
    )
    .start(listener)
    .await
    .unwrap();

    // Wait until the first request is stuck retrying against the dead trader.
    let deadline = Instant::now() + Duration::from_secs(5);
    while seller.metrics.attempts_retried.get() < 2 {
        assert!(Instant::now() < deadline, "seller never started retrying");
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    assert_eq!(seller.state.last_acknowledged(), None);

    let trader = start_trader().await;
    let new_leader = trader.local_addr.to_string();
    let client = RpcClient::new(&rpc()).unwrap();
    let ack = client
        .update_leader(&seller.local_addr.to_string(), &new_leader)
        .await
        .unwrap();
    assert_eq!(ack.message, "Leader updated successfully");
    let updated_at = Instant::now();

    let budget = backoff + rpc().request_timeout();
    while seller.state.last_acknowledged().is_none() {
        assert!(
            updated_at.elapsed() <= budget,
            "no acknowledgment within {:?} of the leader update",
            budget
        );
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    assert!(updated_at.elapsed() <= budget);
    assert_eq!(seller.state.leader(), new_leader);

    // The stuck request keeps its number on the new trader.
    let first = trader.state.requests().await.unwrap();
    assert_eq!(first[0].request.request_id, 1);
    assert_eq!(first[0].request.seller_id, 3);

    seller.kill();
    trader.kill();
}
