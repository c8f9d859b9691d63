use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum CircuitState {
    Closed,
    Open,
    HalfOpen,
}

impl CircuitState {
    pub fn as_str(&self) -> &'static str {
        match self {
            CircuitState::Closed => "closed",
            CircuitState::Open => "open",
            CircuitState::HalfOpen => "half_open",
        }
    }
}

/// Admission verdict for one call. `Probe` passes the call through while the
/// breaker is testing recovery.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CircuitDecision {
    Allow,
    Probe,
    Reject,
}

/// Failure flavor reported back to the breaker. Hard declines are cardholder
/// outcomes and never count against processor health.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    SoftDecline,
    HardDecline,
    RateLimited,
    Timeout,
}

/// Point-in-time view served by `GET /processors/status`.
#[derive(Debug, Clone, Serialize)]
pub struct BreakerStatus {
    pub state: CircuitState,
    pub success_rate: f64,
    pub total_calls_in_window: usize,
    pub successful_calls_in_window: usize,
    pub failed_calls_in_window: usize,
    pub last_failure_at: Option<String>,
    pub cooldown_remaining_seconds: Option<f64>,
}
