//! Integration tests for the tail hunter.
//!
//! Network tests are ignored by default.
//! Run with: cargo test --test integration -- --ignored
//!
//! Note: the ignored tests interact with the real Polymarket API.

use std::time::Duration;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use rust_decimal_macros::dec;
use tower::ServiceExt;

use tail_hunter::api::{create_router, AppState};
use tail_hunter::config::Config;
use tail_hunter::market::{binary_market, resolve_token_id, MockExchange, PolymarketClient};
use tail_hunter::tail::{LoopPhase, RetryPolicy, ScanLoop, TailScanner};
use tail_hunter::trading::{OrderParams, OrderSubmitter, Side};

/// Get a trading config from environment.
fn trading_config() -> Option<Config> {
    dotenvy::dotenv().ok();

    let private_key = std::env::var("POLYMARKET_PRIVATE_KEY").ok()?;

    // Skip if using placeholder key
    if private_key.starts_with("0x1234") || private_key.len() < 64 {
        return None;
    }

    Some(Config {
        polymarket_private_key: private_key,
        polymarket_signature_type: std::env::var("POLYMARKET_SIGNATURE_TYPE")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(0),
        polymarket_funder: std::env::var("POLYMARKET_FUNDER").ok(),
        dry_run: false,
        ..Config::default()
    })
}

fn config(dry_run: bool) -> Config {
    Config {
        polymarket_private_key:
            "0x0123456789abcdef0123456789abcdef0123456789abcdef0123456789abcdef".to_string(),
        dry_run,
        ..Config::default()
    }
}

/// A cycle that fails, then one that places orders, is reflected on the status server.
#[tokio::test(start_paused = true)]
async fn test_loop_recovers_and_reports_ready() {
    let exchange = MockExchange::new()
        .with_listing_failures(1)
        .with_market(binary_market("m1", "T1", "T2"))
        .with_market(binary_market("m2", "T3", "T4"))
        .with_price("T1", dec!(0.02))
        .with_price("T3", dec!(0.05));
    let handle = exchange.clone();

    let config = config(false);
    let state = AppState::new(config.dry_run);
    let scanner = TailScanner::from_config(exchange, &config);
    let scan_loop = ScanLoop::new(scanner, RetryPolicy::from_config(&config))
        .with_app_state(state.clone());

    // Fails at t=0, succeeds at t=10, shut down during the 60s sleep.
    let stats = scan_loop
        .run_until(tokio::time::sleep(Duration::from_secs(30)))
        .await;

    assert_eq!(stats.cycles_failed, 1);
    assert_eq!(stats.cycles_completed, 1);
    assert_eq!(
        handle.orders(),
        vec![OrderParams::buy("T1", dec!(0.02), dec!(100))]
    );
    assert_eq!(*state.phase.read().await, LoopPhase::Idle);

    let response = create_router(state)
        .oneshot(Request::builder().uri("/ready").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

/// Dry-run config never reaches the exchange's order path.
#[tokio::test]
async fn test_dry_run_cycle_submits_nothing() {
    let exchange = MockExchange::new()
        .with_market(binary_market("m1", "T1", "T2"))
        .with_price("T1", dec!(0.01));
    let handle = exchange.clone();

    let scanner = TailScanner::from_config(exchange, &config(true));
    let report = scanner.scan_cycle().await.unwrap();

    assert_eq!(report.orders_simulated, 1);
    assert_eq!(report.opportunities[0].quantity, dec!(200));
    assert!(handle.orders().is_empty());
}

/// Test that we can list markets.
#[tokio::test]
#[ignore = "requires network access"]
async fn test_fetch_markets() {
    let client = PolymarketClient::new(&Config::default()).unwrap();

    let result = client.fetch_markets(Some(1)).await;
    assert!(result.is_ok(), "Failed to list markets: {:?}", result.err());

    let markets = result.unwrap();
    println!("Fetched {} markets", markets.len());
    let tradable = markets.iter().filter(|m| m.is_tradable()).count();
    println!("  Tradable: {}", tradable);
}

/// Test that we can quote a YES token from the listing.
#[tokio::test]
#[ignore = "requires network access"]
async fn test_get_price() {
    let client = PolymarketClient::new(&Config::default()).unwrap();

    let markets = client.fetch_markets(Some(2)).await.unwrap();
    let Some((market, token_id)) = markets
        .iter()
        .filter(|m| m.is_tradable())
        .find_map(|m| resolve_token_id(m, "YES").map(|t| (m, t)))
    else {
        println!("No tradable YES/NO market found");
        return;
    };

    match client.get_price(token_id, Side::Buy).await {
        Ok(quote) => println!("{}: YES @ ${}", market.label(), quote),
        Err(e) => println!("Price lookup returned error: {}", e),
    }
}

/// Test that we can authenticate with the CLOB.
#[tokio::test]
#[ignore = "requires POLYMARKET_PRIVATE_KEY"]
async fn test_authenticate() {
    let config = match trading_config() {
        Some(c) => c,
        None => {
            println!("Skipping: POLYMARKET_PRIVATE_KEY not set or invalid");
            return;
        }
    };

    let result = OrderSubmitter::connect(&config).await;
    assert!(result.is_ok(), "Failed to authenticate: {:?}", result.err());
}

/// Test signing module functions.
#[test]
fn test_signing_utilities() {
    use polymarket_client_sdk::clob::types::SignatureType;
    use tail_hunter::signing::{address_from_private_key, create_signer, signature_type_from_u8};

    // Test signature type conversion
    assert!(matches!(signature_type_from_u8(0), SignatureType::Eoa));
    assert!(matches!(signature_type_from_u8(1), SignatureType::Proxy));
    assert!(matches!(signature_type_from_u8(2), SignatureType::GnosisSafe));

    // Test signer creation
    let key = "0x0123456789abcdef0123456789abcdef0123456789abcdef0123456789abcdef";
    assert!(create_signer(key).is_ok());

    // Test address derivation
    let addr = address_from_private_key(key).unwrap();
    assert!(addr.starts_with("0x"));
    assert_eq!(addr.len(), 42);
}
