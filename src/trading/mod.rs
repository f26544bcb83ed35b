//! Trading module for order construction and submission.
//!
//! This module handles:
//! - Order types, validation and lot rounding
//! - Signed limit order submission through the CLOB SDK

pub mod execution;
pub mod order;

pub use execution::OrderSubmitter;
pub use order::{OrderParams, OrderReceipt, Side};
