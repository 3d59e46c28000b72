//! Integration tests for the native WebSocket transport against testnet.
//!
//! These tests connect to the Deribit testnet and exercise the full
//! connect → query → subscribe → receive → disconnect lifecycle.
//!
//! All tests are `#[ignore]` because they require network access. The
//! authenticated tests also need `DERIBIT_CLIENT_ID` and
//! `DERIBIT_CLIENT_SECRET` (a `.env` file is read if present) and skip
//! themselves when those are missing.
//!
//! Run with:
//! ```bash
//! cargo test --features ws-native --test ws_native_integration -- --ignored
//! ```

use std::time::Duration;

use futures_util::StreamExt;
use serde_json::Value;
use tokio::sync::mpsc;
use tokio::time::timeout;

use deribit_trader_sdk::prelude::*;

const TEST_TIMEOUT: Duration = Duration::from_secs(15);
const TEST_INSTRUMENT: &str = "BTC-PERPETUAL";

fn test_config() -> TransportConfig {
    TransportConfig::with_url(DERIBIT_TESTNET_WS_URL)
}

/// Connect and wait for the `Connected` event.
async fn connected_client() -> DeribitClient {
    let client = DeribitClient::builder()
        .request_timeout(TEST_TIMEOUT)
        .build_native(test_config());
    client.connect().await.expect("connect should succeed");

    let mut events = client.events();
    let first = timeout(TEST_TIMEOUT, events.next())
        .await
        .expect("timed out waiting for Connected")
        .expect("event stream ended");
    assert!(
        matches!(first, ClientEvent::Connected),
        "first event should be Connected, got: {first:?}"
    );
    drop(events);

    client
}

fn credentials() -> Option<(String, String)> {
    dotenvy::dotenv().ok();
    let client_id = std::env::var("DERIBIT_CLIENT_ID").ok()?;
    let client_secret = std::env::var("DERIBIT_CLIENT_SECRET").ok()?;
    Some((client_id, client_secret))
}

// ─── Tests ───────────────────────────────────────────────────────────────────

#[tokio::test]
#[ignore]
async fn connect_and_disconnect() {
    let client = connected_client().await;
    assert!(client.is_connected());
    assert!(!client.is_authenticated());

    client.disconnect().await.expect("disconnect should succeed");
    assert!(!client.is_connected());
}

#[tokio::test]
#[ignore]
async fn ticker_returns_mark_price() {
    let client = connected_client().await;

    let response = client
        .market()
        .get_ticker(TEST_INSTRUMENT)
        .await
        .expect("ticker request");
    let result = response.into_result().expect("ticker result");
    assert_eq!(result["instrument_name"], TEST_INSTRUMENT);
    assert!(result["mark_price"].is_number());

    client.disconnect().await.unwrap();
}

#[tokio::test]
#[ignore]
async fn concurrent_public_queries() {
    let client = connected_client().await;
    let market = client.market();

    let (instruments, book) = tokio::join!(
        market.get_instruments("BTC", "future", false),
        market.get_order_book(TEST_INSTRUMENT),
    );

    let instruments = instruments.unwrap().into_result().expect("instruments result");
    assert!(instruments
        .as_array()
        .map(|list| list.iter().any(|i| i["instrument_name"] == TEST_INSTRUMENT))
        .unwrap_or(false));

    let book = book.unwrap().into_result().expect("order book result");
    assert_eq!(book["instrument_name"], TEST_INSTRUMENT);

    client.disconnect().await.unwrap();
}

#[tokio::test]
#[ignore]
async fn subscription_notifications_reach_subscriber() {
    let client = connected_client().await;
    let (tx, mut rx) = mpsc::unbounded_channel::<Value>();
    client
        .add_subscriber(TEST_INSTRUMENT, move |push: &Value| {
            let _ = tx.send(push.clone());
        })
        .await;

    let channel = format!("ticker.{}.100ms", TEST_INSTRUMENT);
    let response = client
        .market()
        .subscribe([channel.as_str()])
        .await
        .expect("subscribe request");
    assert!(!response.is_error(), "subscribe failed: {:?}", response.error);

    let push = timeout(TEST_TIMEOUT, rx.recv())
        .await
        .expect("timed out waiting for notification")
        .expect("subscriber channel closed");
    assert_eq!(push["params"]["channel"], channel.as_str());

    client.market().unsubscribe([channel]).await.unwrap();
    client.disconnect().await.unwrap();
}

#[tokio::test]
#[ignore]
async fn private_query_requires_authentication() {
    let client = connected_client().await;

    let result = client.orders().get_positions().await;
    assert!(matches!(result, Err(SdkError::AuthRequired)));

    client.disconnect().await.unwrap();
}

#[tokio::test]
#[ignore]
async fn invalid_credentials_are_rejected() {
    let client = connected_client().await;

    let result = client.authenticate("not-a-client", "not-a-secret").await;
    assert!(
        matches!(result, Err(SdkError::AuthenticationFailed(_))),
        "expected AuthenticationFailed, got: {result:?}"
    );
    assert!(!client.is_authenticated());

    client.disconnect().await.unwrap();
}

#[tokio::test]
#[ignore]
async fn authenticate_and_view_open_orders() {
    let Some((client_id, client_secret)) = credentials() else {
        eprintln!("DERIBIT_CLIENT_ID / DERIBIT_CLIENT_SECRET not set, skipping");
        return;
    };
    let client = connected_client().await;

    let session = client
        .authenticate(&client_id, &client_secret)
        .await
        .expect("authentication should succeed");
    assert!(client.is_authenticated());
    assert!(!session.access_token.is_empty());

    let open_orders = client
        .orders()
        .view_open_orders("BTC")
        .await
        .expect("open orders request");
    assert!(!open_orders.is_error(), "query failed: {:?}", open_orders.error);

    client.reconnect().await.expect("reconnect should succeed");
    assert!(!client.is_authenticated());

    client.disconnect().await.unwrap();
}
