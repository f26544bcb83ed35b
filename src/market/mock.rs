//! In-memory exchange for unit testing.
//!
//! This module provides an [`Exchange`] implementation that serves
//! scripted markets and prices without making network requests, and
//! records every order it receives.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use rust_decimal::Decimal;

use crate::error::{MarketError, TradingError};
use crate::exchange::Exchange;
use crate::trading::{OrderParams, OrderReceipt, Side};

use super::types::{Market, OutcomeToken, PriceQuote};

#[derive(Debug, Default)]
struct MockState {
    markets: Vec<Market>,
    prices: HashMap<String, Decimal>,
    failing_prices: HashSet<String>,
    failing_orders: HashSet<String>,
    listing_failures: u32,
    orders: Vec<OrderParams>,
    listing_calls: u32,
    price_calls: u32,
}

/// Mock exchange for testing.
///
/// Clones share state, so a test can keep a handle while the scanner
/// owns another.
#[derive(Debug, Clone, Default)]
pub struct MockExchange {
    state: Arc<Mutex<MockState>>,
}

impl MockExchange {
    /// Create an empty mock exchange.
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, MockState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Add a market to the listing.
    pub fn with_market(self, market: Market) -> Self {
        self.state().markets.push(market);
        self
    }

    /// Quote a token at the given price.
    pub fn with_price(self, token_id: impl Into<String>, price: Decimal) -> Self {
        self.set_price(token_id, price);
        self
    }

    /// Make price lookups for a token fail.
    pub fn with_failing_price(self, token_id: impl Into<String>) -> Self {
        self.state().failing_prices.insert(token_id.into());
        self
    }

    /// Make order submission for a token fail.
    pub fn with_failing_order(self, token_id: impl Into<String>) -> Self {
        self.state().failing_orders.insert(token_id.into());
        self
    }

    /// Fail the next `count` market listings.
    pub fn with_listing_failures(self, count: u32) -> Self {
        self.state().listing_failures = count;
        self
    }

    /// Change a token's quote.
    pub fn set_price(&self, token_id: impl Into<String>, price: Decimal) {
        self.state().prices.insert(token_id.into(), price);
    }

    /// Orders received so far, in submission order.
    pub fn orders(&self) -> Vec<OrderParams> {
        self.state().orders.clone()
    }

    /// Number of market listings requested.
    pub fn listing_calls(&self) -> u32 {
        self.state().listing_calls
    }

    /// Number of price lookups requested.
    pub fn price_calls(&self) -> u32 {
        self.state().price_calls
    }
}

#[async_trait]
impl Exchange for MockExchange {
    async fn fetch_markets(&self) -> Result<Vec<Market>, MarketError> {
        let mut state = self.state();
        state.listing_calls += 1;

        if state.listing_failures > 0 {
            state.listing_failures -= 1;
            return Err(MarketError::FetchFailed {
                resource: "markets".to_string(),
                reason: "Mock listing failure".to_string(),
            });
        }

        Ok(state.markets.clone())
    }

    async fn get_price(&self, token_id: &str, _side: Side) -> Result<PriceQuote, MarketError> {
        let mut state = self.state();
        state.price_calls += 1;

        if state.failing_prices.contains(token_id) {
            return Err(MarketError::FetchFailed {
                resource: format!("price for {}", token_id),
                reason: "Mock price failure".to_string(),
            });
        }

        match state.prices.get(token_id) {
            Some(price) => PriceQuote::new(*price),
            None => Err(MarketError::FetchFailed {
                resource: format!("price for {}", token_id),
                reason: "No mock price configured".to_string(),
            }),
        }
    }

    async fn submit_limit_order(&self, params: &OrderParams) -> Result<OrderReceipt, TradingError> {
        let mut state = self.state();

        if state.failing_orders.contains(&params.token_id) {
            return Err(TradingError::OrderRejected {
                reason: "Mock order rejection".to_string(),
            });
        }

        state.orders.push(params.clone());

        Ok(OrderReceipt {
            order_id: format!("mock-order-{}", state.orders.len()),
            token_id: params.token_id.clone(),
            price: params.price,
            size: params.lot_size(),
        })
    }
}

/// Build an active YES/NO market for tests.
pub fn binary_market(condition_id: &str, yes_token: &str, no_token: &str) -> Market {
    Market {
        condition_id: condition_id.to_string(),
        question: Some(format!("Will {} happen?", condition_id)),
        active: true,
        closed: false,
        tokens: vec![
            OutcomeToken::new(yes_token, "Yes"),
            OutcomeToken::new(no_token, "No"),
        ],
    }
}
