//! Unified error types for the tail hunter.

use rust_decimal::Decimal;
use thiserror::Error;

/// Unified error type for the tail hunter.
#[derive(Error, Debug)]
pub enum BotError {
    /// Configuration loading error.
    #[error("configuration error: {0}")]
    Config(#[from] envy::Error),

    /// Configuration values failed validation.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// Market-related error.
    #[error("market error: {0}")]
    Market(#[from] MarketError),

    /// Trading/order error.
    #[error("trading error: {0}")]
    Trading(#[from] TradingError),
}

/// Market listing and price errors.
#[derive(Error, Debug)]
pub enum MarketError {
    /// Failed to fetch a resource from the market-data API.
    #[error("failed to fetch {resource}: {reason}")]
    FetchFailed {
        /// What was being fetched (endpoint or token).
        resource: String,
        /// Reason for failure.
        reason: String,
    },

    /// Failed to parse market data.
    #[error("failed to parse market data: {0}")]
    ParseError(String),

    /// Price outside the probability range [0, 1].
    #[error("price {0} outside [0, 1]")]
    PriceOutOfRange(Decimal),

    /// HTTP request failed.
    #[error("http request failed: {0}")]
    HttpError(#[from] reqwest::Error),
}

/// Trading and order execution errors.
#[derive(Error, Debug)]
pub enum TradingError {
    /// Order submission failed.
    #[error("order submission failed: {0}")]
    SubmissionFailed(String),

    /// Invalid order parameters.
    #[error("invalid order parameters: {0}")]
    InvalidParams(String),

    /// Token ID is not a valid CLOB asset id.
    #[error("invalid token id {token_id}: {reason}")]
    InvalidTokenId {
        /// The offending token ID.
        token_id: String,
        /// Parse failure.
        reason: String,
    },

    /// Signing error.
    #[error("signing error: {0}")]
    SigningError(String),

    /// Authentication failed.
    #[error("authentication failed: {0}")]
    AuthenticationFailed(String),

    /// Order rejected by the exchange.
    #[error("order rejected: {reason}")]
    OrderRejected {
        /// Rejection reason from the exchange.
        reason: String,
    },

    /// Submission did not complete in time.
    #[error("order submission timed out after {timeout_ms}ms")]
    Timeout {
        /// Configured timeout.
        timeout_ms: u64,
    },
}

/// Order sizing errors.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SizingError {
    /// Price is zero or negative; quantity would be undefined.
    #[error("cannot size order at non-positive price {0}")]
    NonPositivePrice(Decimal),

    /// Budget is zero or negative.
    #[error("downside limit must be positive, got {0}")]
    NonPositiveBudget(Decimal),
}
