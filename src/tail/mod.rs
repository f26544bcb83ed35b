//! Tail hunting: band filter, fixed-risk sizing, scan cycle and loop.
//!
//! This module handles:
//! - Price-band filtering and order sizing
//! - One pass over the market listing with per-market error isolation
//! - The scan loop and its retry policy

pub mod filter;
pub mod runner;
pub mod scanner;

pub use filter::{size_order, TailFilter, TailOpportunity};
pub use runner::{LoopPhase, LoopStats, RetryPolicy, ScanLoop};
pub use scanner::{CycleReport, MarketOutcome, TailScanner};
