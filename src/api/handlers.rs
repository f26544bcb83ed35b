//! HTTP API handlers.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use serde::Serialize;
use tokio::sync::RwLock;

use crate::tail::{LoopPhase, LoopStats};

/// Application state shared between the scan loop and handlers.
#[derive(Debug, Clone)]
pub struct AppState {
    /// Set after the first completed scan cycle.
    pub ready: Arc<AtomicBool>,
    /// Current loop phase.
    pub phase: Arc<RwLock<LoopPhase>>,
    /// Loop statistics.
    pub stats: Arc<RwLock<LoopStats>>,
    /// Whether orders are only simulated.
    pub dry_run: bool,
}

impl AppState {
    /// Create new app state.
    pub fn new(dry_run: bool) -> Self {
        Self {
            ready: Arc::new(AtomicBool::new(false)),
            phase: Arc::new(RwLock::new(LoopPhase::Idle)),
            stats: Arc::new(RwLock::new(LoopStats::default())),
            dry_run,
        }
    }

    /// Set ready state.
    pub fn set_ready(&self, ready: bool) {
        self.ready.store(ready, Ordering::SeqCst);
    }

    /// Check if ready.
    pub fn is_ready(&self) -> bool {
        self.ready.load(Ordering::SeqCst)
    }
}

/// Health check response.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// Status: "ok".
    pub status: &'static str,
}

/// Readiness check response.
#[derive(Debug, Serialize)]
pub struct ReadyResponse {
    /// Whether a scan cycle has completed.
    pub ready: bool,
    /// Current loop phase.
    pub phase: LoopPhase,
}

/// Status response.
#[derive(Debug, Serialize)]
pub struct StatusResponse {
    /// Service status.
    pub status: &'static str,
    /// Current loop phase.
    pub phase: LoopPhase,
    /// Whether orders are only simulated.
    pub dry_run: bool,
    /// Loop statistics.
    pub stats: LoopStats,
}

/// Health check handler - always returns 200.
pub async fn health() -> impl IntoResponse {
    Json(HealthResponse { status: "ok" })
}

/// Readiness check handler - returns 200 if ready, 503 otherwise.
pub async fn ready(State(state): State<AppState>) -> impl IntoResponse {
    let is_ready = state.is_ready();
    let phase = *state.phase.read().await;

    let response = ReadyResponse {
        ready: is_ready,
        phase,
    };

    if is_ready {
        (StatusCode::OK, Json(response))
    } else {
        (StatusCode::SERVICE_UNAVAILABLE, Json(response))
    }
}

/// Status handler - returns loop phase and statistics.
pub async fn status(State(state): State<AppState>) -> impl IntoResponse {
    let phase = *state.phase.read().await;
    let stats = state.stats.read().await.clone();

    let status = if state.is_ready() { "running" } else { "starting" };

    Json(StatusResponse {
        status,
        phase,
        dry_run: state.dry_run,
        stats,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn app_state_ready_toggle() {
        let state = AppState::new(true);
        assert!(!state.is_ready());

        state.set_ready(true);
        assert!(state.is_ready());

        state.set_ready(false);
        assert!(!state.is_ready());
    }

    #[test]
    fn status_response_serializes_phase() {
        let response = StatusResponse {
            status: "running",
            phase: LoopPhase::BackingOff,
            dry_run: true,
            stats: LoopStats::default(),
        };
        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["phase"], "backing_off");
        assert_eq!(json["stats"]["cycles_completed"], 0);
    }
}
