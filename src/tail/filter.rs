//! Price-band filter and fixed-risk order sizing.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;

use crate::config::Config;
use crate::error::SizingError;
use crate::trading::OrderParams;

/// An in-band tail outcome, sized and ready to order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TailOpportunity {
    /// Token to buy.
    pub token_id: String,
    /// Market label for logging.
    pub label: String,
    /// Quoted price, used as the limit price.
    pub price: Decimal,
    /// Shares to buy (budget / price).
    pub quantity: Decimal,
    /// Capital at risk (price * quantity).
    pub notional: Decimal,
    /// When the opportunity was found.
    pub detected_at: DateTime<Utc>,
}

impl TailOpportunity {
    /// Limit buy order for this opportunity.
    pub fn order(&self) -> OrderParams {
        OrderParams::buy(self.token_id.clone(), self.price, self.quantity)
    }
}

/// Shares affordable with `budget` at `price`.
///
/// Never divides by a non-positive price.
pub fn size_order(budget: Decimal, price: Decimal) -> Result<Decimal, SizingError> {
    if budget <= Decimal::ZERO {
        return Err(SizingError::NonPositiveBudget(budget));
    }
    if price <= Decimal::ZERO {
        return Err(SizingError::NonPositivePrice(price));
    }
    budget
        .checked_div(price)
        .ok_or(SizingError::NonPositivePrice(price))
}

/// Inclusive price band with a per-order risk budget.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TailFilter {
    /// Lowest accepted price (inclusive).
    pub price_min: Decimal,
    /// Highest accepted price (inclusive).
    pub price_max: Decimal,
    /// Capital risked per order.
    pub downside_limit: Decimal,
}

impl TailFilter {
    /// Create a filter.
    pub fn new(price_min: Decimal, price_max: Decimal, downside_limit: Decimal) -> Self {
        Self {
            price_min,
            price_max,
            downside_limit,
        }
    }

    /// Create a filter from config.
    pub fn from_config(config: &Config) -> Self {
        Self::new(config.price_min, config.price_max, config.downside_limit)
    }

    /// Whether `price` lies within the band, both ends included.
    pub fn in_band(&self, price: Decimal) -> bool {
        self.price_min <= price && price <= self.price_max
    }

    /// Evaluate a quoted token.
    ///
    /// `Ok(None)` when the price is outside the band.
    pub fn evaluate(
        &self,
        token_id: &str,
        label: &str,
        price: Decimal,
    ) -> Result<Option<TailOpportunity>, SizingError> {
        if !self.in_band(price) {
            return Ok(None);
        }

        let quantity = size_order(self.downside_limit, price)?;

        Ok(Some(TailOpportunity {
            token_id: token_id.to_string(),
            label: label.to_string(),
            price,
            quantity,
            notional: price * quantity,
            detected_at: Utc::now(),
        }))
    }
}
