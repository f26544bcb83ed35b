//! Exchange abstraction used by the scan loop.
//!
//! The loop needs exactly three venue operations: list markets, quote a
//! token, and place a limit order. [`PolymarketExchange`] is the live
//! adapter; tests use [`crate::market::MockExchange`].

use async_trait::async_trait;
use tracing::info;

use crate::config::Config;
use crate::error::{BotError, MarketError, TradingError};
use crate::market::{Market, PolymarketClient, PriceQuote};
use crate::trading::{OrderParams, OrderReceipt, OrderSubmitter, Side};

/// Venue operations required to hunt tail outcomes.
#[async_trait]
pub trait Exchange: Send + Sync {
    /// Fetch the current market listing.
    async fn fetch_markets(&self) -> Result<Vec<Market>, MarketError>;

    /// Fetch the current price of a token on the given side.
    async fn get_price(&self, token_id: &str, side: Side) -> Result<PriceQuote, MarketError>;

    /// Submit a limit order.
    async fn submit_limit_order(&self, params: &OrderParams) -> Result<OrderReceipt, TradingError>;
}

/// Live Polymarket adapter.
#[derive(Debug)]
pub struct PolymarketExchange {
    /// Public market-data client.
    client: PolymarketClient,
    /// Authenticated submitter; absent in dry-run mode.
    submitter: Option<OrderSubmitter>,
    /// Optional page bound for market listing.
    max_pages: Option<u32>,
}

impl PolymarketExchange {
    /// Build the adapter, authenticating only when live trading is enabled.
    pub async fn connect(config: &Config) -> Result<Self, BotError> {
        let client = PolymarketClient::new(config)?;

        let submitter = if config.dry_run {
            info!("Dry-run mode: skipping CLOB authentication");
            None
        } else {
            Some(OrderSubmitter::connect(config).await?)
        };

        Ok(Self {
            client,
            submitter,
            max_pages: config.max_market_pages,
        })
    }

    /// Build a read-only adapter that cannot submit orders.
    pub fn read_only(config: &Config) -> Result<Self, BotError> {
        Ok(Self {
            client: PolymarketClient::new(config)?,
            submitter: None,
            max_pages: config.max_market_pages,
        })
    }

    /// Whether this adapter can submit orders.
    pub fn can_trade(&self) -> bool {
        self.submitter.is_some()
    }
}

#[async_trait]
impl Exchange for PolymarketExchange {
    async fn fetch_markets(&self) -> Result<Vec<Market>, MarketError> {
        self.client.fetch_markets(self.max_pages).await
    }

    async fn get_price(&self, token_id: &str, side: Side) -> Result<PriceQuote, MarketError> {
        self.client.get_price(token_id, side).await
    }

    async fn submit_limit_order(&self, params: &OrderParams) -> Result<OrderReceipt, TradingError> {
        match &self.submitter {
            Some(submitter) => submitter.submit_limit_order(params).await,
            None => Err(TradingError::AuthenticationFailed(
                "exchange was built without trading credentials".to_string(),
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[tokio::test]
    async fn read_only_exchange_refuses_orders() {
        let exchange = PolymarketExchange::read_only(&Config::default()).unwrap();
        assert!(!exchange.can_trade());

        let result = exchange
            .submit_limit_order(&OrderParams::buy("1", dec!(0.02), dec!(100)))
            .await;
        assert!(matches!(result, Err(TradingError::AuthenticationFailed(_))));
    }

    #[tokio::test]
    async fn dry_run_connect_skips_authentication() {
        let config = Config {
            dry_run: true,
            ..Config::default()
        };
        let exchange = PolymarketExchange::connect(&config).await.unwrap();
        assert!(!exchange.can_trade());
    }
}
