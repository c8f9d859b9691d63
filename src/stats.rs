use crate::processors::{ChargeOutcome, OutcomeKind};
use parking_lot::Mutex;
use rust_decimal::Decimal;
use serde::Serialize;
use std::collections::HashMap;
use std::time::Instant;

#[derive(Debug, Clone, Serialize)]
pub struct ProcessorStats {
    pub processor_name: String,
    pub transaction_count: u64,
    pub total_volume: Decimal,
    pub total_fees: Decimal,
    pub success_count: u64,
    pub hard_decline_count: u64,
    pub soft_decline_count: u64,
    pub timeout_count: u64,
    pub rate_limited_count: u64,
    pub avg_latency_ms: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct StatsResponse {
    pub total_transactions: u64,
    pub total_approved: u64,
    pub total_declined: u64,
    pub total_volume: Decimal,
    pub total_fees_collected: Decimal,
    pub overall_approval_rate: f64,
    pub per_processor: HashMap<String, ProcessorStats>,
    pub uptime_seconds: f64,
}

#[derive(Debug, Default)]
struct PerProcessor {
    count: u64,
    volume: Decimal,
    fees: Decimal,
    success: u64,
    hard_decline: u64,
    soft_decline: u64,
    timeout: u64,
    rate_limited: u64,
    latency_sum_ms: f64,
}

#[derive(Debug, Default)]
struct StatsInner {
    total_transactions: u64,
    total_approved: u64,
    total_declined: u64,
    total_volume: Decimal,
    total_fees: Decimal,
    per_processor: HashMap<String, PerProcessor>,
}

/// In-memory accumulator for attempt and transaction counters. Process-local
/// by design; restarting the service zeroes it.
pub struct StatsService {
    started_at: Instant,
    inner: Mutex<StatsInner>,
}

impl Default for StatsService {
    fn default() -> Self {
        Self::new()
    }
}

impl StatsService {
    pub fn new() -> Self {
        Self {
            started_at: Instant::now(),
            inner: Mutex::new(StatsInner::default()),
        }
    }

    /// One observation per processor attempt, successful or not.
    pub fn record_attempt(&self, outcome: &ChargeOutcome, amount: Decimal) {
        let mut inner = self.inner.lock();
        let p = inner.per_processor.entry(outcome.processor.clone()).or_default();
        p.count += 1;
        p.latency_sum_ms += outcome.latency_ms;
        match outcome.kind {
            OutcomeKind::Success => {
                p.success += 1;
                p.volume += amount;
                if let Some(fee) = outcome.fee {
                    p.fees += fee;
                }
            }
            OutcomeKind::HardDecline => p.hard_decline += 1,
            OutcomeKind::SoftDecline => p.soft_decline += 1,
            OutcomeKind::Timeout => p.timeout += 1,
            OutcomeKind::RateLimited => p.rate_limited += 1,
        }
    }

    /// One record per transaction with the final business outcome.
    pub fn record_final(&self, approved: bool, amount: Decimal, fee: Option<Decimal>) {
        let mut inner = self.inner.lock();
        inner.total_transactions += 1;
        if approved {
            inner.total_approved += 1;
            inner.total_volume += amount;
            if let Some(fee) = fee {
                inner.total_fees += fee;
            }
        } else {
            inner.total_declined += 1;
        }
    }

    pub fn snapshot(&self) -> StatsResponse {
        let inner = self.inner.lock();
        let approval_rate = if inner.total_transactions > 0 {
            inner.total_approved as f64 / inner.total_transactions as f64
        } else {
            0.0
        };

        let per_processor = inner
            .per_processor
            .iter()
            .map(|(name, p)| {
                let avg_latency = if p.count > 0 {
                    p.latency_sum_ms / p.count as f64
                } else {
                    0.0
                };
                (
                    name.clone(),
                    ProcessorStats {
                        processor_name: name.clone(),
                        transaction_count: p.count,
                        total_volume: p.volume,
                        total_fees: p.fees,
                        success_count: p.success,
                        hard_decline_count: p.hard_decline,
                        soft_decline_count: p.soft_decline,
                        timeout_count: p.timeout,
                        rate_limited_count: p.rate_limited,
                        avg_latency_ms: (avg_latency * 100.0).round() / 100.0,
                    },
                )
            })
            .collect();

        StatsResponse {
            total_transactions: inner.total_transactions,
            total_approved: inner.total_approved,
            total_declined: inner.total_declined,
            total_volume: inner.total_volume,
            total_fees_collected: inner.total_fees,
            overall_approval_rate: (approval_rate * 10_000.0).round() / 10_000.0,
            per_processor,
            uptime_seconds: self.started_at.elapsed().as_secs_f64(),
        }
    }
}
