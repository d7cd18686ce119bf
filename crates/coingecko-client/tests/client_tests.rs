use std::collections::HashMap;
use std::time::Duration;

use axum::{extract::Query, http::StatusCode, routing::get, Json, Router};
use coingecko_client::{CoinGeckoClient, MarketDataError, MarketDataProvider};
use serde_json::{json, Value};

/// Serve `router` on an ephemeral local port and return its base URL.
async fn spawn_upstream(router: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    format!("http://{}", addr)
}

fn market_rows(n: usize) -> Value {
    Value::Array(
        (0..n)
            .map(|i| {
                json!({
                    "id": format!("coin-{}", i),
                    "symbol": format!("c{}", i),
                    "name": format!("Coin {}", i),
                    "image": format!("https://img.example/{}.png", i),
                    "current_price": 100.0 + i as f64,
                    "market_cap": 1_000_000 - i as i64
                })
            })
            .collect(),
    )
}

#[tokio::test]
async fn test_top_coins_reshapes_and_sends_query() {
    let router = Router::new().route(
        "/coins/markets",
        get(|Query(params): Query<HashMap<String, String>>| async move {
            assert_eq!(params.get("vs_currency").map(String::as_str), Some("usd"));
            assert_eq!(params.get("per_page").map(String::as_str), Some("10"));
            Json(market_rows(3))
        }),
    );
    let base = spawn_upstream(router).await;

    let client = CoinGeckoClient::new(base, Duration::from_secs(5)).unwrap();
    let coins = client.top_coins().await.unwrap();

    assert_eq!(coins.len(), 3);
    assert_eq!(coins[0].id, "coin-0");
    assert_eq!(coins[0].symbol, "c0");
    assert_eq!(coins[0].price, Some(100.0));
    assert_eq!(coins[2].image, "https://img.example/2.png");
}

#[tokio::test]
async fn test_top_coins_caps_at_ten() {
    let router = Router::new().route("/coins/markets", get(|| async { Json(market_rows(25)) }));
    let base = spawn_upstream(router).await;

    let client = CoinGeckoClient::new(base, Duration::from_secs(5)).unwrap();
    assert_eq!(client.top_coins().await.unwrap().len(), 10);
}

#[tokio::test]
async fn test_upstream_error_status() {
    let router = Router::new().route(
        "/coins/markets",
        get(|| async { (StatusCode::TOO_MANY_REQUESTS, "slow down") }),
    );
    let base = spawn_upstream(router).await;

    let client = CoinGeckoClient::new(base, Duration::from_secs(5)).unwrap();
    match client.top_coins().await {
        Err(MarketDataError::Status { status, body }) => {
            assert_eq!(status, 429);
            assert_eq!(body, "slow down");
        }
        other => panic!("expected status error, got {:?}", other),
    }
}

#[tokio::test]
async fn test_undecodable_body() {
    let router = Router::new().route("/coins/markets", get(|| async { "<html>maintenance</html>" }));
    let base = spawn_upstream(router).await;

    let client = CoinGeckoClient::new(base, Duration::from_secs(5)).unwrap();
    assert!(matches!(
        client.top_coins().await,
        Err(MarketDataError::Decode(_))
    ));
}

#[tokio::test]
async fn test_unreachable_upstream() {
    // Bind then drop to get a port nothing listens on
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let client = CoinGeckoClient::new(format!("http://{}/", addr), Duration::from_secs(2)).unwrap();
    assert_eq!(client.base_url(), format!("http://{}", addr));
    assert!(matches!(
        client.top_coins().await,
        Err(MarketDataError::Request(_))
    ));
}
