//! Order types and creation.

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Decimal places accepted by the CLOB for order size.
pub const SIZE_DECIMALS: u32 = 2;

/// Order side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "UPPERCASE")]
pub enum Side {
    /// Buy order.
    #[strum(to_string = "BUY", serialize = "buy")]
    Buy,
    /// Sell order.
    #[strum(to_string = "SELL", serialize = "sell")]
    Sell,
}

/// Limit order parameters for submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderParams {
    /// Token ID to trade.
    pub token_id: String,
    /// Order side (buy/sell).
    pub side: Side,
    /// Limit price.
    pub price: Decimal,
    /// Order size in shares.
    pub size: Decimal,
}

impl OrderParams {
    /// Create a new buy order.
    pub fn buy(token_id: impl Into<String>, price: Decimal, size: Decimal) -> Self {
        Self {
            token_id: token_id.into(),
            side: Side::Buy,
            price,
            size,
        }
    }

    /// Size truncated to the exchange lot precision.
    ///
    /// Truncation never rounds up, so notional stays within the sizing budget.
    pub fn lot_size(&self) -> Decimal {
        self.size
            .round_dp_with_strategy(SIZE_DECIMALS, RoundingStrategy::ToZero)
    }

    /// Validate order parameters.
    pub fn validate(&self) -> Result<(), String> {
        if self.token_id.is_empty() {
            return Err("token_id is required".to_string());
        }
        if self.price <= Decimal::ZERO || self.price >= Decimal::ONE {
            return Err("price must be within (0, 1)".to_string());
        }
        if self.lot_size() <= Decimal::ZERO {
            return Err("size must be positive after lot rounding".to_string());
        }
        Ok(())
    }
}

/// Acknowledgement for an accepted order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OrderReceipt {
    /// Exchange order ID.
    pub order_id: String,
    /// Token ID traded.
    pub token_id: String,
    /// Limit price.
    pub price: Decimal,
    /// Size actually submitted.
    pub size: Decimal,
}
