//! Scan loop: repeat cycles forever, sleeping the scan interval after a
//! completed cycle and the error backoff after a failed one.

use std::future::Future;
use std::time::Duration;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use strum::Display;
use tracing::{debug, error, info};

use super::scanner::{CycleReport, TailScanner};
use crate::api::AppState;
use crate::config::Config;
use crate::exchange::Exchange;
use crate::metrics;

/// Where the loop currently is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Display, Serialize)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum LoopPhase {
    /// Not started, or stopped.
    #[default]
    Idle,
    /// A cycle is in progress.
    Scanning,
    /// Waiting the scan interval after a completed cycle.
    Sleeping,
    /// Waiting the error backoff after a failed cycle.
    BackingOff,
}

/// Sleep durations between cycles.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Sleep after a completed cycle.
    pub scan_interval: Duration,
    /// Sleep after a failed cycle.
    pub error_backoff: Duration,
}

impl RetryPolicy {
    /// Create a policy from config.
    pub fn from_config(config: &Config) -> Self {
        Self {
            scan_interval: config.scan_interval(),
            error_backoff: config.error_backoff(),
        }
    }

    /// Delay before the next cycle, given how this one ended.
    pub fn delay_for<T, E>(&self, result: &Result<T, E>) -> Duration {
        match result {
            Ok(_) => self.scan_interval,
            Err(_) => self.error_backoff,
        }
    }

    /// Phase to wait in, given how this cycle ended.
    pub fn phase_for<T, E>(&self, result: &Result<T, E>) -> LoopPhase {
        match result {
            Ok(_) => LoopPhase::Sleeping,
            Err(_) => LoopPhase::BackingOff,
        }
    }
}

/// Aggregate counters across cycles, for status reporting only.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct LoopStats {
    /// Cycles that finished.
    pub cycles_completed: u64,
    /// Cycles aborted by a listing failure.
    pub cycles_failed: u64,
    /// Tradable markets evaluated.
    pub markets_evaluated: u64,
    /// In-band opportunities found.
    pub opportunities: u64,
    /// Orders accepted.
    pub orders_placed: u64,
    /// Orders that failed.
    pub orders_failed: u64,
    /// Orders logged in dry-run mode.
    pub orders_simulated: u64,
    /// Notional placed or simulated.
    pub notional: Decimal,
    /// When the last cycle ended.
    pub last_cycle_at: Option<DateTime<Utc>>,
    /// Error from the last failed cycle, cleared on success.
    pub last_error: Option<String>,
}

impl LoopStats {
    fn record_success(&mut self, report: &CycleReport) {
        self.cycles_completed += 1;
        self.markets_evaluated += report.markets_evaluated as u64;
        self.opportunities += report.opportunities.len() as u64;
        self.orders_placed += report.orders_placed as u64;
        self.orders_failed += report.orders_failed as u64;
        self.orders_simulated += report.orders_simulated as u64;
        self.notional += report.notional;
        self.last_cycle_at = Some(Utc::now());
        self.last_error = None;
    }

    fn record_failure(&mut self, reason: String) {
        self.cycles_failed += 1;
        self.last_cycle_at = Some(Utc::now());
        self.last_error = Some(reason);
    }
}

/// Drives [`TailScanner`] cycles until shutdown.
#[derive(Debug)]
pub struct ScanLoop<E> {
    scanner: TailScanner<E>,
    policy: RetryPolicy,
    stats: LoopStats,
    state: Option<AppState>,
}

impl<E: Exchange> ScanLoop<E> {
    /// Create a loop.
    pub fn new(scanner: TailScanner<E>, policy: RetryPolicy) -> Self {
        Self {
            scanner,
            policy,
            stats: LoopStats::default(),
            state: None,
        }
    }

    /// Publish phase, stats and readiness to the status server.
    pub fn with_app_state(mut self, state: AppState) -> Self {
        self.state = Some(state);
        self
    }

    async fn set_phase(&self, phase: LoopPhase) {
        if let Some(state) = &self.state {
            *state.phase.write().await = phase;
        }
    }

    /// Run one cycle and return how long to wait before the next.
    pub async fn run_cycle(&mut self) -> Duration {
        self.set_phase(LoopPhase::Scanning).await;

        let result = {
            let _timer = metrics::timer_scan_cycle();
            self.scanner.scan_cycle().await
        };

        match &result {
            Ok(report) => {
                metrics::inc_scan_cycles();
                self.stats.record_success(report);
                if let Some(state) = &self.state {
                    state.set_ready(true);
                }
            }
            Err(e) => {
                metrics::inc_scan_cycle_failures();
                error!(
                    error = %e,
                    backoff_secs = self.policy.error_backoff.as_secs(),
                    "Scan cycle failed, backing off"
                );
                self.stats.record_failure(e.to_string());
            }
        }

        if let Some(state) = &self.state {
            *state.stats.write().await = self.stats.clone();
        }
        self.set_phase(self.policy.phase_for(&result)).await;

        self.policy.delay_for(&result)
    }

    /// Run cycles until `shutdown` resolves.
    ///
    /// Shutdown is only observed while sleeping between cycles.
    pub async fn run_until<F>(mut self, shutdown: F) -> LoopStats
    where
        F: Future<Output = ()>,
    {
        tokio::pin!(shutdown);

        info!(
            scan_interval_secs = self.policy.scan_interval.as_secs(),
            error_backoff_secs = self.policy.error_backoff.as_secs(),
            dry_run = self.scanner.is_dry_run(),
            "Scan loop started"
        );

        loop {
            let delay = self.run_cycle().await;
            debug!(delay_secs = delay.as_secs(), "Waiting for next cycle");

            tokio::select! {
                _ = &mut shutdown => {
                    info!("Shutdown requested, stopping scan loop");
                    break;
                }
                _ = tokio::time::sleep(delay) => {}
            }
        }

        self.set_phase(LoopPhase::Idle).await;
        info!(
            cycles_completed = self.stats.cycles_completed,
            cycles_failed = self.stats.cycles_failed,
            orders_placed = self.stats.orders_placed,
            "Scan loop stopped"
        );
        self.stats
    }
}
