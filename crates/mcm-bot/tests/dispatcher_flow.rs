//! End-to-end dispatch against an in-memory ledger and a static oracle feed.

use axum::body::{to_bytes, Body};
use axum::http::{Request, StatusCode};
use mcm_bot::server::create_router;
use mcm_bot::{AppConfig, Application};
use mcm_core::{format_address, Address, ContractSnapshot, RpcRequest, U256};
use mcm_feed::StaticOracleFeed;
use mcm_ledger::MockLedger;
use mcm_signer::{FixedClock, FixedNonce, KeyManager, OrderSigner};
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt;

const TEST_KEY: &str = "0xac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";
const NOW: u64 = 1_700_000_000;
const ORACLE: &str = "https://oracle.test/btc";

const MARKET: Address = Address::repeat_byte(0x01);
const LONG: Address = Address::repeat_byte(0x0a);
const SHORT: Address = Address::repeat_byte(0x0b);
const COLLATERAL: Address = Address::repeat_byte(0xdd);
const EXCHANGE: Address = Address::repeat_byte(0xee);
const TAKER: Address = Address::repeat_byte(0x33);

fn tokens(whole: u64) -> U256 {
    U256::from(whole) * U256::from(10u64).pow(U256::from(18u64))
}

fn maker() -> Address {
    KeyManager::from_hex(TEST_KEY, None).unwrap().address()
}

struct Harness {
    ledger: Arc<MockLedger>,
    feed: Arc<StaticOracleFeed>,
    app: Application,
}

/// One market, band 0.10..0.90, spot 0.40, 18-decimal tokens.
fn harness_with_markets(markets: &[(Address, Address, Address)]) -> Harness {
    let ledger = Arc::new(MockLedger::new(maker()));
    for &(market, long, short) in markets {
        ledger.install_market(
            &ContractSnapshot::new(
                market,
                long,
                short,
                U256::from(90u64),
                U256::from(10u64),
                2,
                ORACLE.to_string(),
                "rateUsd".to_string(),
            )
            .unwrap(),
        );
        ledger.set_decimals(long, 18);
        ledger.set_decimals(short, 18);
    }
    ledger.set_decimals(COLLATERAL, 18);

    let feed = Arc::new(StaticOracleFeed::new().with_price(ORACLE, "0.40"));

    let mut config = AppConfig::default();
    config.chain.market_contracts = markets.iter().map(|(m, _, _)| format_address(m)).collect();
    config.chain.collateral_address = format_address(&COLLATERAL);
    config.chain.exchange_address = format_address(&EXCHANGE);

    let signer = OrderSigner::new(
        KeyManager::from_hex(TEST_KEY, None).unwrap(),
        Arc::new(FixedClock::new(NOW)),
        Arc::new(FixedNonce::new(42)),
    );
    let app = Application::with_components(config, signer, ledger.clone(), feed.clone()).unwrap();
    Harness { ledger, feed, app }
}

fn harness() -> Harness {
    harness_with_markets(&[(MARKET, LONG, SHORT)])
}

fn request(id: u64, method: &str, params: Value) -> RpcRequest {
    serde_json::from_value(json!({ "id": id, "method": method, "params": params })).unwrap()
}

fn long_for_collateral(taker_amount: U256) -> Value {
    json!({
        "makerToken": format_address(&LONG),
        "takerToken": format_address(&COLLATERAL),
        "takerAddress": format_address(&TAKER),
        "takerAmount": taker_amount.to_string(),
    })
}

async fn call(h: &Harness, id: u64, method: &str, params: Value) -> Value {
    let response = h.app.dispatcher().handle(request(id, method, params)).await;
    serde_json::to_value(&response).unwrap()
}

#[tokio::test]
async fn get_quote_is_clipped_to_liquidity_limit() {
    let h = harness();
    let response = call(&h, 1, "getQuote", long_for_collateral(tokens(100))).await;

    assert_eq!(response["id"], 1);
    assert_eq!(response["jsonrpc"], "2.0");
    let result = &response["result"];
    assert_eq!(result["makerAddress"], format_address(&maker()));
    assert_eq!(result["makerAmount"], "2500000000000000000");
    assert_eq!(result["takerAmount"], "1687500000000000000");
    assert_eq!(result["makerPrice"], "0.675");
}

#[tokio::test]
async fn get_max_quote_for_purchase() {
    let h = harness();
    h.feed.set_price(ORACLE, "0.80");
    let params = json!({
        "makerToken": format_address(&COLLATERAL),
        "takerToken": format_address(&LONG),
    });
    let response = call(&h, 2, "getMaxQuote", params).await;

    let result = &response["result"];
    assert_eq!(result["takerAmount"], "2500000000000000000");
    // 2.5 * 0.325
    assert_eq!(result["makerAmount"], "812500000000000000");
}

#[tokio::test]
async fn get_order_returns_signed_order() {
    let h = harness();
    h.ledger.set_balance(maker(), LONG, tokens(10));
    h.ledger.set_balance(TAKER, COLLATERAL, tokens(5));

    let response = call(&h, 3, "getOrder", long_for_collateral(tokens(1))).await;
    assert!(response.get("error").is_none(), "{response}");

    let order = &response["result"];
    assert_eq!(order["makerAddress"], format_address(&maker()));
    assert_eq!(order["takerAddress"], format_address(&TAKER));
    assert_eq!(order["takerAmount"], "1000000000000000000");
    // 1 / 0.675 truncated to whole units
    assert_eq!(order["makerAmount"], "1481481481481481481");
    assert_eq!(order["expiration"], NOW + 300);
    assert_eq!(order["nonce"], "42");
    let v = order["v"].as_u64().unwrap();
    assert!(v == 27 || v == 28);
    assert_eq!(order["r"].as_str().unwrap().len(), 66);
    assert_eq!(order["s"].as_str().unwrap().len(), 66);
}

#[tokio::test]
async fn get_order_refused_on_insufficient_maker_balance() {
    let h = harness();
    h.ledger.set_balance(maker(), LONG, tokens(1));
    h.ledger.set_balance(TAKER, COLLATERAL, tokens(5));

    let response = call(&h, 4, "getOrder", long_for_collateral(tokens(1))).await;
    assert_eq!(response["id"], 4);
    assert!(response.get("result").is_none());
    assert!(response["error"]
        .as_str()
        .unwrap()
        .starts_with("Insufficient maker balance"));
}

#[tokio::test]
async fn get_order_requires_taker_address() {
    let h = harness();
    let params = json!({
        "makerToken": format_address(&LONG),
        "takerToken": format_address(&COLLATERAL),
        "takerAmount": "1000",
    });
    let response = call(&h, 5, "getOrder", params).await;
    assert_eq!(response["error"], "takerAddress is required");
}

#[tokio::test]
async fn foreign_maker_address_is_refused() {
    let h = harness();
    let mut params = long_for_collateral(tokens(1));
    params["makerAddress"] = json!(format_address(&Address::repeat_byte(0x99)));

    let response = call(&h, 6, "getQuote", params).await;
    assert!(response["error"]
        .as_str()
        .unwrap()
        .contains("does not belong to this maker"));
}

#[tokio::test]
async fn unknown_tokens_and_methods() {
    let h = harness();
    let params = json!({
        "makerToken": format_address(&Address::repeat_byte(0x77)),
        "takerToken": format_address(&COLLATERAL),
        "takerAmount": "1",
    });
    let response = call(&h, 7, "getQuote", params).await;
    assert!(response["error"].as_str().unwrap().starts_with("No market trades"));

    let response = call(&h, 8, "cancelOrder", long_for_collateral(tokens(1))).await;
    assert_eq!(response["id"], 8);
    assert_eq!(response["error"], "Unknown method: cancelOrder");
}

#[tokio::test]
async fn shared_token_is_ambiguous() {
    let h = harness_with_markets(&[
        (MARKET, LONG, SHORT),
        (Address::repeat_byte(0x02), LONG, Address::repeat_byte(0x0c)),
    ]);
    let response = call(&h, 9, "getQuote", long_for_collateral(tokens(1))).await;
    assert!(response["error"]
        .as_str()
        .unwrap()
        .starts_with("Tokens match more than one market"));
}

#[tokio::test]
async fn oracle_failure_only_fails_that_request() {
    let h = harness();
    h.feed.remove(ORACLE);
    let failed = call(&h, 10, "getQuote", long_for_collateral(tokens(1))).await;
    assert!(failed.get("error").is_some());

    h.feed.set_price(ORACLE, "0.40");
    let ok = call(&h, 11, "getQuote", long_for_collateral(tokens(1))).await;
    assert!(ok.get("result").is_some(), "{ok}");
}

#[tokio::test]
async fn insane_price_is_reported() {
    let h = harness();
    // short maker price 0.50 + 0.375 exceeds the 0.80 band
    let params = json!({
        "makerToken": format_address(&SHORT),
        "takerToken": format_address(&COLLATERAL),
        "makerAmount": "1",
    });
    let response = call(&h, 12, "getQuote", params).await;
    assert!(response["error"]
        .as_str()
        .unwrap()
        .contains("would exceed the maximum token value"));
}

#[tokio::test]
async fn prepare_enables_tokens_and_tolerates_failures() {
    let h = harness();
    h.app.prepare().await.unwrap();
    let approved: Vec<Address> = h.ledger.approvals().iter().map(|(t, _, _)| *t).collect();
    assert_eq!(approved, vec![COLLATERAL, LONG, SHORT]);
    assert!(h.ledger.approvals().iter().all(|(_, s, _)| *s == EXCHANGE));

    let failing = harness();
    failing.ledger.fail_approvals();
    failing.app.prepare().await.unwrap();
    assert!(failing.ledger.approvals().is_empty());
}

#[tokio::test]
async fn prepare_fails_when_snapshot_unreadable() {
    let ledger = Arc::new(MockLedger::new(maker()));
    let mut config = AppConfig::default();
    config.chain.market_contracts = vec![format_address(&MARKET)];
    let signer = OrderSigner::with_defaults(KeyManager::from_hex(TEST_KEY, None).unwrap());
    let app = Application::with_components(
        config,
        signer,
        ledger,
        Arc::new(StaticOracleFeed::new()),
    )
    .unwrap();

    assert!(app.prepare().await.is_err());
}

async fn http(h: &Harness, request: Request<Body>) -> (StatusCode, Vec<u8>) {
    let response = create_router(h.app.dispatcher())
        .oneshot(request)
        .await
        .unwrap();
    let status = response.status();
    let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, body.to_vec())
}

#[tokio::test]
async fn http_surface() {
    let h = harness();

    let rpc = Request::builder()
        .method("POST")
        .uri("/rpc")
        .header("content-type", "application/json")
        .body(Body::from(
            json!({"id": "q1", "method": "getQuote", "params": long_for_collateral(tokens(1))})
                .to_string(),
        ))
        .unwrap();
    let (status, body) = http(&h, rpc).await;
    assert_eq!(status, StatusCode::OK);
    let response: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(response["id"], "q1");
    assert!(response.get("result").is_some());

    let malformed = Request::builder()
        .method("POST")
        .uri("/rpc")
        .header("content-type", "application/json")
        .body(Body::from("{not json"))
        .unwrap();
    let (status, body) = http(&h, malformed).await;
    assert_eq!(status, StatusCode::OK);
    let response: Value = serde_json::from_slice(&body).unwrap();
    assert!(response["error"].as_str().unwrap().starts_with("Malformed request"));

    let intents = Request::builder().uri("/intents").body(Body::empty()).unwrap();
    let (status, body) = http(&h, intents).await;
    assert_eq!(status, StatusCode::OK);
    let intents: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(intents.as_array().unwrap().len(), 4);
    assert_eq!(intents[0]["role"], "maker");
    assert_eq!(
        intents[0]["supportedMethods"],
        json!(["getOrder", "getQuote", "getMaxQuote"])
    );

    let health = Request::builder().uri("/health").body(Body::empty()).unwrap();
    let (status, body) = http(&h, health).await;
    assert_eq!(status, StatusCode::OK);
    let health: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(health["markets"], 1);

    let metrics = Request::builder().uri("/metrics").body(Body::empty()).unwrap();
    let (status, body) = http(&h, metrics).await;
    assert_eq!(status, StatusCode::OK);
    assert!(String::from_utf8(body).unwrap().contains("mcm_requests_total"));
}
