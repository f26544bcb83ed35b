//! Polymarket CLOB REST client for market listing and prices.

use std::time::Duration;

use tracing::{debug, instrument, warn};

use crate::config::Config;
use crate::error::MarketError;
use crate::trading::order::Side;
use crate::utils::parse_decimal_field;

use super::types::{Market, MarketsPage, PriceQuote};

/// Cursor value the CLOB returns on the last page.
pub const END_CURSOR: &str = "LTE=";

/// Polymarket CLOB API client.
#[derive(Debug, Clone)]
pub struct PolymarketClient {
    /// HTTP client for API requests.
    http: reqwest::Client,
    /// Base URL for CLOB API.
    clob_url: String,
}

impl PolymarketClient {
    /// Create a new Polymarket client from config.
    pub fn new(config: &Config) -> Result<Self, MarketError> {
        let http = reqwest::Client::builder()
            .timeout(config.http_timeout())
            .connect_timeout(Duration::from_secs(2))
            // TCP_NODELAY for low-latency (disable Nagle's algorithm)
            .tcp_nodelay(true)
            .tcp_keepalive(Duration::from_secs(30))
            .pool_max_idle_per_host(4)
            .pool_idle_timeout(Duration::from_secs(90))
            .build()?;

        Ok(Self {
            http,
            clob_url: config.polymarket_clob_url.trim_end_matches('/').to_string(),
        })
    }

    /// Get the CLOB base URL.
    pub fn clob_url(&self) -> &str {
        &self.clob_url
    }

    /// Fetch a single page of open markets.
    #[instrument(skip(self))]
    pub async fn fetch_markets_page(&self, cursor: Option<&str>) -> Result<MarketsPage, MarketError> {
        let url = format!("{}/markets", self.clob_url);

        let mut request = self
            .http
            .get(&url)
            .query(&[("active", "true"), ("closed", "false")]);
        if let Some(cursor) = cursor {
            request = request.query(&[("next_cursor", cursor)]);
        }

        let response = request.send().await?;

        if !response.status().is_success() {
            return Err(MarketError::FetchFailed {
                resource: "markets".to_string(),
                reason: format!("HTTP {}", response.status()),
            });
        }

        response
            .json::<MarketsPage>()
            .await
            .map_err(|e| MarketError::ParseError(format!("Failed to parse markets page: {}", e)))
    }

    /// Fetch open markets, following `next_cursor` to the end cursor.
    ///
    /// `max_pages` optionally bounds the walk. A failure on any page fails
    /// the whole listing.
    #[instrument(skip(self))]
    pub async fn fetch_markets(&self, max_pages: Option<u32>) -> Result<Vec<Market>, MarketError> {
        let mut markets = Vec::new();
        let mut cursor: Option<String> = None;
        let mut pages: u32 = 0;

        loop {
            if max_pages.is_some_and(|max| pages >= max) {
                warn!(
                    pages,
                    count = markets.len(),
                    "Market listing truncated at page cap"
                );
                return Ok(markets);
            }

            let page = self.fetch_markets_page(cursor.as_deref()).await?;
            pages += 1;
            markets.extend(page.data.into_iter().map(Market::from));

            match page.next_cursor {
                Some(next) if !next.is_empty() && next != END_CURSOR => {
                    cursor = Some(next);
                }
                _ => {
                    debug!(pages, count = markets.len(), "Fetched all markets");
                    return Ok(markets);
                }
            }
        }
    }

    /// Get the current price for a token on the given side.
    #[instrument(skip(self), fields(token_id = %token_id))]
    pub async fn get_price(&self, token_id: &str, side: Side) -> Result<PriceQuote, MarketError> {
        let url = format!("{}/price", self.clob_url);
        let side = side.to_string();

        let response = self
            .http
            .get(&url)
            .query(&[("token_id", token_id), ("side", side.as_str())])
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(MarketError::FetchFailed {
                resource: format!("price for {}", token_id),
                reason: format!("HTTP {}", response.status()),
            });
        }

        let body: serde_json::Value = response
            .json()
            .await
            .map_err(|e| MarketError::ParseError(format!("Failed to parse price: {}", e)))?;

        let price = parse_decimal_field(&body, &["price"]).ok_or_else(|| {
            MarketError::ParseError(format!("price field missing or malformed: {}", body))
        })?;

        PriceQuote::new(price)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::sync::{Arc, Mutex};

    use axum::extract::{Query, State};
    use axum::http::StatusCode;
    use axum::routing::get;
    use axum::{Json, Router};
    use rust_decimal_macros::dec;
    use serde_json::{json, Value};
    use tokio::net::TcpListener;

    use super::*;

    /// `/markets` pages keyed by the requested cursor ("" for the first page).
    #[derive(Clone, Default)]
    struct ScriptedClob {
        pages: Arc<HashMap<String, (StatusCode, Value)>>,
        requests: Arc<Mutex<Vec<HashMap<String, String>>>>,
    }

    impl ScriptedClob {
        fn new(pages: Vec<(&str, StatusCode, Value)>) -> Self {
            Self {
                pages: Arc::new(
                    pages
                        .into_iter()
                        .map(|(cursor, status, body)| (cursor.to_string(), (status, body)))
                        .collect(),
                ),
                requests: Arc::default(),
            }
        }

        fn requests(&self) -> Vec<HashMap<String, String>> {
            self.requests.lock().unwrap().clone()
        }
    }

    async fn markets(
        State(clob): State<ScriptedClob>,
        Query(query): Query<HashMap<String, String>>,
    ) -> (StatusCode, Json<Value>) {
        let cursor = query.get("next_cursor").cloned().unwrap_or_default();
        clob.requests.lock().unwrap().push(query);
        match clob.pages.get(&cursor) {
            Some((status, body)) => (*status, Json(body.clone())),
            None => (StatusCode::NOT_FOUND, Json(json!({}))),
        }
    }

    async fn price(Query(query): Query<HashMap<String, String>>) -> (StatusCode, Json<Value>) {
        assert_eq!(query.get("side").map(String::as_str), Some("BUY"));
        match query.get("token_id").map(String::as_str) {
            Some("STR") => (StatusCode::OK, Json(json!({ "price": "0.02" }))),
            Some("NUM") => (StatusCode::OK, Json(json!({ "price": 0.25 }))),
            Some("HIGH") => (StatusCode::OK, Json(json!({ "price": "1.5" }))),
            Some("EMPTY") => (StatusCode::OK, Json(json!({}))),
            _ => (StatusCode::NOT_FOUND, Json(json!({ "error": "no orderbook" }))),
        }
    }

    fn page(condition_id: &str, next_cursor: &str) -> Value {
        json!({
            "data": [{
                "condition_id": condition_id,
                "question": format!("Will {} happen?", condition_id),
                "active": true,
                "closed": false,
                "tokens": [
                    { "token_id": format!("{}-yes", condition_id), "outcome": "Yes" },
                    { "token_id": format!("{}-no", condition_id), "outcome": "No" }
                ]
            }],
            "next_cursor": next_cursor
        })
    }

    async fn serve(clob: ScriptedClob) -> PolymarketClient {
        let router = Router::new()
            .route("/markets", get(markets))
            .route("/price", get(price))
            .with_state(clob);

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });

        let config = Config {
            polymarket_clob_url: format!("http://{}/", addr),
            ..Config::default()
        };
        PolymarketClient::new(&config).unwrap()
    }

    fn three_pages() -> ScriptedClob {
        ScriptedClob::new(vec![
            ("", StatusCode::OK, page("m1", "c1")),
            ("c1", StatusCode::OK, page("m2", "c2")),
            ("c2", StatusCode::OK, page("m3", END_CURSOR)),
        ])
    }

    #[test]
    fn client_creation_works() {
        let config = Config {
            polymarket_clob_url: "https://clob.polymarket.com/".to_string(),
            ..Config::default()
        };
        let client = PolymarketClient::new(&config).unwrap();
        assert_eq!(client.clob_url(), "https://clob.polymarket.com");
    }

    #[tokio::test]
    async fn listing_follows_cursors_to_end() {
        let clob = three_pages();
        let client = serve(clob.clone()).await;

        let markets = client.fetch_markets(None).await.unwrap();

        let ids: Vec<_> = markets.iter().map(|m| m.condition_id.as_str()).collect();
        assert_eq!(ids, vec!["m1", "m2", "m3"]);
        assert_eq!(markets[1].tokens[0].token_id, "m2-yes");

        let requests = clob.requests();
        assert_eq!(requests.len(), 3);
        assert_eq!(requests[0].get("next_cursor"), None);
        assert_eq!(requests[2].get("next_cursor").map(String::as_str), Some("c2"));
        for request in &requests {
            assert_eq!(request.get("active").map(String::as_str), Some("true"));
            assert_eq!(request.get("closed").map(String::as_str), Some("false"));
        }
    }

    #[tokio::test]
    async fn listing_stops_at_page_bound() {
        let clob = three_pages();
        let client = serve(clob.clone()).await;

        let markets = client.fetch_markets(Some(2)).await.unwrap();

        assert_eq!(markets.len(), 2);
        assert_eq!(clob.requests().len(), 2);
    }

    #[tokio::test]
    async fn listing_stops_on_empty_cursor() {
        let clob = ScriptedClob::new(vec![
            ("", StatusCode::OK, page("m1", "")),
            ("c1", StatusCode::OK, page("m2", END_CURSOR)),
        ]);
        let client = serve(clob.clone()).await;

        let markets = client.fetch_markets(None).await.unwrap();

        assert_eq!(markets.len(), 1);
        assert_eq!(clob.requests().len(), 1);
    }

    #[tokio::test]
    async fn failed_page_fails_whole_listing() {
        let clob = ScriptedClob::new(vec![
            ("", StatusCode::OK, page("m1", "c1")),
            ("c1", StatusCode::INTERNAL_SERVER_ERROR, json!({})),
        ]);
        let client = serve(clob.clone()).await;

        let result = client.fetch_markets(None).await;

        assert!(matches!(result, Err(MarketError::FetchFailed { .. })));
        assert_eq!(clob.requests().len(), 2);
    }

    #[tokio::test]
    async fn malformed_page_is_a_parse_error() {
        let clob = ScriptedClob::new(vec![("", StatusCode::OK, json!({ "data": "oops" }))]);
        let client = serve(clob).await;

        let result = client.fetch_markets(None).await;
        assert!(matches!(result, Err(MarketError::ParseError(_))));
    }

    #[tokio::test]
    async fn price_accepts_string_and_number() {
        let client = serve(ScriptedClob::default()).await;

        let quote = client.get_price("STR", Side::Buy).await.unwrap();
        assert_eq!(quote.value(), dec!(0.02));

        let quote = client.get_price("NUM", Side::Buy).await.unwrap();
        assert_eq!(quote.value(), dec!(0.25));
    }

    #[tokio::test]
    async fn price_errors_are_mapped() {
        let client = serve(ScriptedClob::default()).await;

        assert!(matches!(
            client.get_price("HIGH", Side::Buy).await,
            Err(MarketError::PriceOutOfRange(p)) if p == dec!(1.5)
        ));
        assert!(matches!(
            client.get_price("EMPTY", Side::Buy).await,
            Err(MarketError::ParseError(_))
        ));
        assert!(matches!(
            client.get_price("UNKNOWN", Side::Buy).await,
            Err(MarketError::FetchFailed { .. })
        ));
    }
}
