use crate::domain::transaction::TransactionRequest;
use anyhow::Result;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

pub mod catalog;
pub mod mock;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutcomeKind {
    Success,
    SoftDecline,
    HardDecline,
    RateLimited,
    Timeout,
}

impl OutcomeKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            OutcomeKind::Success => "success",
            OutcomeKind::SoftDecline => "soft_decline",
            OutcomeKind::HardDecline => "hard_decline",
            OutcomeKind::RateLimited => "rate_limited",
            OutcomeKind::Timeout => "timeout",
        }
    }
}

/// Normalized result of a single charge attempt.
#[derive(Debug, Clone)]
pub struct ChargeOutcome {
    pub processor: String,
    pub kind: OutcomeKind,
    pub reason: Option<String>,
    pub fee: Option<Decimal>,
    pub fee_rate: Option<f64>,
    pub authorization_id: Option<String>,
    pub latency_ms: f64,
}

impl ChargeOutcome {
    pub fn timed_out(processor: &str, budget: std::time::Duration) -> Self {
        Self {
            processor: processor.to_string(),
            kind: OutcomeKind::Timeout,
            reason: Some("timeout".to_string()),
            fee: None,
            fee_rate: None,
            authorization_id: None,
            latency_ms: budget.as_secs_f64() * 1000.0,
        }
    }

    pub fn internal_error(processor: &str, latency_ms: f64) -> Self {
        Self {
            processor: processor.to_string(),
            kind: OutcomeKind::SoftDecline,
            reason: Some("internal_error".to_string()),
            fee: None,
            fee_rate: None,
            authorization_id: None,
            latency_ms,
        }
    }
}

/// Downstream charge attempt. Implementations never raise under normal
/// operation; every decline, throttle, or stall is encoded in the outcome.
/// The engine imposes the per-call deadline externally.
#[async_trait::async_trait]
pub trait Processor: Send + Sync {
    fn name(&self) -> &str;

    fn fee_rate(&self) -> f64;

    async fn charge(&self, request: &TransactionRequest) -> Result<ChargeOutcome>;
}
