//! Market module for listing CLOB markets and quoting outcome tokens.
//!
//! This module handles:
//! - Market types, wire types and token resolution
//! - Polymarket REST client
//! - In-memory exchange for testing

pub mod client;
pub mod mock;
pub mod types;

pub use client::PolymarketClient;
pub use mock::{binary_market, MockExchange};
pub use types::{resolve_token_id, Market, OutcomeToken, PriceQuote};
