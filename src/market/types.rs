//! Market-related types for CLOB prediction markets.

use rust_decimal::Decimal;
use serde::Deserialize;

use crate::error::MarketError;

/// One tradable outcome within a market.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutcomeToken {
    /// CLOB token ID.
    pub token_id: String,
    /// Outcome label (e.g., "Yes", "No").
    pub outcome: String,
}

impl OutcomeToken {
    /// Create a new outcome token.
    pub fn new(token_id: impl Into<String>, outcome: impl Into<String>) -> Self {
        Self {
            token_id: token_id.into(),
            outcome: outcome.into(),
        }
    }
}

/// A market as listed by the CLOB API for one scan cycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Market {
    /// Condition ID identifying the market.
    pub condition_id: String,
    /// Market question text.
    pub question: Option<String>,
    /// Whether the market is active.
    pub active: bool,
    /// Whether the market is closed to trading.
    pub closed: bool,
    /// Outcome tokens.
    pub tokens: Vec<OutcomeToken>,
}

impl Market {
    /// Human-readable label: the question, or the condition ID.
    pub fn label(&self) -> &str {
        self.question.as_deref().unwrap_or(&self.condition_id)
    }

    /// Whether orders may be placed on this market.
    pub fn is_tradable(&self) -> bool {
        self.active && !self.closed
    }
}

/// Find the token whose outcome label matches `target`, ignoring case.
///
/// Returns the first match; `None` when the market has no such outcome.
pub fn resolve_token_id<'a>(market: &'a Market, target: &str) -> Option<&'a str> {
    market
        .tokens
        .iter()
        .find(|t| t.outcome.eq_ignore_ascii_case(target))
        .map(|t| t.token_id.as_str())
}

/// A price quote, always within [0, 1].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct PriceQuote(Decimal);

impl PriceQuote {
    /// Validate and wrap a raw price.
    pub fn new(price: Decimal) -> Result<Self, MarketError> {
        if price < Decimal::ZERO || price > Decimal::ONE {
            return Err(MarketError::PriceOutOfRange(price));
        }
        Ok(Self(price))
    }

    /// The price value.
    pub fn value(&self) -> Decimal {
        self.0
    }
}

impl std::fmt::Display for PriceQuote {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One page of `GET /markets`.
#[derive(Debug, Clone, Deserialize)]
pub struct MarketsPage {
    /// Markets on this page.
    #[serde(default)]
    pub data: Vec<ApiMarket>,
    /// Cursor for the next page; `LTE=` marks the end.
    pub next_cursor: Option<String>,
}

/// Market record from the CLOB API.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiMarket {
    /// Condition ID.
    pub condition_id: Option<String>,
    /// Market question.
    pub question: Option<String>,
    /// Active flag.
    pub active: Option<bool>,
    /// Closed flag.
    pub closed: Option<bool>,
    /// Outcome tokens.
    pub tokens: Option<Vec<ApiToken>>,
}

/// Outcome token record from the CLOB API.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiToken {
    /// Token ID.
    pub token_id: Option<String>,
    /// Outcome label.
    pub outcome: Option<String>,
}

impl From<ApiMarket> for Market {
    fn from(api: ApiMarket) -> Self {
        let tokens = api
            .tokens
            .unwrap_or_default()
            .into_iter()
            .filter_map(|t| {
                let token_id = t.token_id.filter(|id| !id.is_empty())?;
                Some(OutcomeToken {
                    token_id,
                    outcome: t.outcome.unwrap_or_default(),
                })
            })
            .collect();

        Market {
            condition_id: api.condition_id.unwrap_or_default(),
            question: api.question,
            active: api.active.unwrap_or(false),
            closed: api.closed.unwrap_or(false),
            tokens,
        }
    }
}
