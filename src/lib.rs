//! Polymarket tail-outcome hunter.
//!
//! Scans every active market on the CLOB, quotes its YES outcome, and places
//! a limit buy on any outcome priced inside a narrow low band (by default
//! 1 to 3 cents). Each order risks a fixed amount, so quantity is the
//! downside limit divided by the price.
//!
//! ```text
//! YES price:       $0.02
//! Downside limit:  $2.00
//! ─────────────────────
//! Quantity:        100 shares
//! Payout if YES:   $100.00
//! ```
//!
//! # Modules
//!
//! - [`config`]: Configuration loading from environment
//! - [`error`]: Unified error types
//! - [`exchange`]: Venue abstraction and live Polymarket adapter
//! - [`market`]: Market types, REST client and mock exchange
//! - [`tail`]: Band filter, sizing, scan cycle and scan loop
//! - [`trading`]: Order types and signed order submission
//! - [`signing`]: Wallet and signature helpers
//! - [`api`]: HTTP API for health/status
//! - [`metrics`]: Counters and latency histograms
//! - [`utils`]: Utility functions

pub mod api;
pub mod config;
pub mod error;
pub mod exchange;
pub mod market;
pub mod metrics;
pub mod signing;
pub mod tail;
pub mod trading;
pub mod utils;

pub use config::Config;
pub use error::BotError;
