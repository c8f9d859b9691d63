use crate::circuit::registry::BreakerRegistry;
use crate::circuit::state::{CircuitDecision, FailureKind};
use crate::config::AppConfig;
use crate::domain::transaction::{
    fee_for, DeclineType, TransactionRequest, TransactionResponse, TransactionStatus,
};
use crate::engine::backoff::Backoff;
use crate::processors::{ChargeOutcome, OutcomeKind, Processor};
use crate::stats::StatsService;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{error, info, warn};

/// Orchestrates the processor chain for one transaction: cost-ranked
/// candidates, per-call deadline, breaker admission, and outcome routing.
///
/// Routing rules:
///   SUCCESS        -> stop immediately, return approved
///   HARD_DECLINE   -> stop immediately, return declined (no fallback)
///   SOFT_DECLINE   -> move to next processor
///   TIMEOUT        -> move to next processor
///   RATE_LIMITED   -> backoff, retry same processor up to R times, then move on
///   CIRCUIT_OPEN   -> skip the processor entirely
///   all exhausted  -> return declined
pub struct FallbackEngine {
    processors: Vec<Arc<dyn Processor>>,
    registry: Arc<BreakerRegistry>,
    stats: Arc<StatsService>,
    backoff: Backoff,
    max_retries: u32,
    call_timeout: Duration,
}

impl FallbackEngine {
    pub fn new(
        processors: Vec<Arc<dyn Processor>>,
        registry: Arc<BreakerRegistry>,
        stats: Arc<StatsService>,
        config: &AppConfig,
    ) -> Self {
        Self {
            processors,
            registry,
            stats,
            backoff: Backoff::new(config.backoff_base_seconds, config.backoff_max_seconds),
            max_retries: config.backoff_max_retries,
            call_timeout: config.processor_timeout(),
        }
    }

    /// Candidates in ascending fee order; the stable sort keeps registration
    /// order on ties. Recomputed per call.
    fn ranked_processors(&self) -> Vec<Arc<dyn Processor>> {
        let mut ordered = self.processors.clone();
        ordered.sort_by(|a, b| {
            a.fee_rate()
                .partial_cmp(&b.fee_rate())
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        ordered
    }

    pub async fn process(&self, request: TransactionRequest) -> TransactionResponse {
        let start = Instant::now();
        let mut attempts: u32 = 0;
        let mut processors_tried: Vec<String> = Vec::new();
        let mut retry_log: Vec<String> = Vec::new();
        let mut last_outcome: Option<ChargeOutcome> = None;

        let ordered = self.ranked_processors();
        info!(
            transaction_id = %request.transaction_id,
            amount = %request.amount,
            currency = ?request.currency,
            chain = ?ordered.iter().map(|p| p.name()).collect::<Vec<_>>(),
            "processing transaction"
        );

        for processor in &ordered {
            let Some(breaker) = self.registry.get(processor.name()) else {
                continue;
            };

            if breaker.allow(Instant::now()) == CircuitDecision::Reject {
                warn!(
                    transaction_id = %request.transaction_id,
                    processor = %processor.name(),
                    "circuit open, skipping processor"
                );
                processors_tried.push(format!("{}(circuit_open)", processor.name()));
                continue;
            }

            for retry in 0..=self.max_retries {
                if retry > 0 {
                    let delay = self.backoff.delay(retry - 1, &mut rand::thread_rng());
                    info!(
                        transaction_id = %request.transaction_id,
                        processor = %processor.name(),
                        retry,
                        delay_seconds = delay.as_secs_f64(),
                        "rate limited, backing off"
                    );
                    retry_log.push(format!(
                        "{}: rate_limited, backoff {:.2}s",
                        processor.name(),
                        delay.as_secs_f64()
                    ));
                    tokio::time::sleep(delay).await;
                }

                attempts += 1;
                let outcome = self.charge_with_deadline(processor.as_ref(), &request).await;
                self.stats.record_attempt(&outcome, request.amount);
                info!(
                    transaction_id = %request.transaction_id,
                    processor = %processor.name(),
                    attempt = attempts,
                    outcome = outcome.kind.as_str(),
                    reason = outcome.reason.as_deref().unwrap_or(""),
                    latency_ms = outcome.latency_ms,
                    "attempt finished"
                );

                match outcome.kind {
                    OutcomeKind::Success => {
                        breaker.record_success(Instant::now());
                        processors_tried.push(format!("{}(success)", processor.name()));
                        let fee = fee_for(request.amount, processor.fee_rate());
                        self.stats.record_final(true, request.amount, Some(fee));
                        let latency_ms = elapsed_ms(start);
                        info!(
                            transaction_id = %request.transaction_id,
                            processor = %processor.name(),
                            attempts,
                            latency_ms,
                            "transaction approved"
                        );
                        return TransactionResponse {
                            transaction_id: request.transaction_id,
                            status: TransactionStatus::Approved,
                            processor_used: Some(processor.name().to_string()),
                            amount: request.amount,
                            currency: request.currency,
                            fee: Some(fee),
                            fee_rate: Some(processor.fee_rate()),
                            decline_reason: None,
                            decline_type: None,
                            attempts,
                            processors_tried,
                            retry_log,
                            latency_ms,
                            processed_at: chrono::Utc::now(),
                        };
                    }
                    OutcomeKind::HardDecline => {
                        breaker.record_failure(Instant::now(), FailureKind::HardDecline);
                        let reason = outcome
                            .reason
                            .clone()
                            .unwrap_or_else(|| "hard_decline".to_string());
                        processors_tried
                            .push(format!("{}(hard_decline:{})", processor.name(), reason));
                        self.stats.record_final(false, request.amount, None);
                        warn!(
                            transaction_id = %request.transaction_id,
                            processor = %processor.name(),
                            reason = %reason,
                            "hard decline, not retrying"
                        );
                        return TransactionResponse {
                            transaction_id: request.transaction_id,
                            status: TransactionStatus::Declined,
                            processor_used: Some(processor.name().to_string()),
                            amount: request.amount,
                            currency: request.currency,
                            fee: None,
                            fee_rate: None,
                            decline_reason: Some(reason),
                            decline_type: Some(DeclineType::Hard),
                            attempts,
                            processors_tried,
                            retry_log,
                            latency_ms: elapsed_ms(start),
                            processed_at: chrono::Utc::now(),
                        };
                    }
                    OutcomeKind::RateLimited => {
                        breaker.record_failure(Instant::now(), FailureKind::RateLimited);
                        processors_tried.push(format!("{}(rate_limited)", processor.name()));
                        last_outcome = Some(outcome);
                        if retry == self.max_retries {
                            warn!(
                                transaction_id = %request.transaction_id,
                                processor = %processor.name(),
                                "rate limit retries exhausted, falling through"
                            );
                            break;
                        }
                        // otherwise retry the same processor after backoff
                    }
                    OutcomeKind::SoftDecline => {
                        breaker.record_failure(Instant::now(), FailureKind::SoftDecline);
                        let reason = outcome.reason.as_deref().unwrap_or("n/a").to_string();
                        processors_tried
                            .push(format!("{}(soft_decline:{})", processor.name(), reason));
                        last_outcome = Some(outcome);
                        break;
                    }
                    OutcomeKind::Timeout => {
                        breaker.record_failure(Instant::now(), FailureKind::Timeout);
                        processors_tried.push(format!("{}(timeout)", processor.name()));
                        last_outcome = Some(outcome);
                        break;
                    }
                }
            }
        }

        // Every processor skipped, declined softly, timed out, or exhausted
        // its rate-limit retries.
        self.stats.record_final(false, request.amount, None);
        let latency_ms = elapsed_ms(start);
        error!(
            transaction_id = %request.transaction_id,
            attempts,
            latency_ms,
            "all processors failed"
        );

        let (processor_used, decline_reason) = match &last_outcome {
            Some(outcome) => (
                Some(outcome.processor.clone()),
                outcome
                    .reason
                    .clone()
                    .unwrap_or_else(|| "all_processors_failed".to_string()),
            ),
            None => (None, "all_processors_failed".to_string()),
        };

        TransactionResponse {
            transaction_id: request.transaction_id,
            status: TransactionStatus::Declined,
            processor_used,
            amount: request.amount,
            currency: request.currency,
            fee: None,
            fee_rate: None,
            decline_reason: Some(decline_reason),
            decline_type: Some(DeclineType::Soft),
            attempts,
            processors_tried,
            retry_log,
            latency_ms,
            processed_at: chrono::Utc::now(),
        }
    }

    /// One charge under the wall-clock budget. A deadline miss cancels the
    /// in-flight call and becomes a TIMEOUT outcome; an error escaping the
    /// processor becomes a soft decline with reason `internal_error`.
    async fn charge_with_deadline(
        &self,
        processor: &dyn Processor,
        request: &TransactionRequest,
    ) -> ChargeOutcome {
        let attempt_start = Instant::now();
        match tokio::time::timeout(self.call_timeout, processor.charge(request)).await {
            Ok(Ok(outcome)) => outcome,
            Ok(Err(err)) => {
                error!(
                    transaction_id = %request.transaction_id,
                    processor = %processor.name(),
                    error = %err,
                    "processor raised, treating as soft decline"
                );
                ChargeOutcome::internal_error(processor.name(), elapsed_ms(attempt_start))
            }
            Err(_) => {
                warn!(
                    transaction_id = %request.transaction_id,
                    processor = %processor.name(),
                    budget_seconds = self.call_timeout.as_secs_f64(),
                    "charge timed out"
                );
                ChargeOutcome::timed_out(processor.name(), self.call_timeout)
            }
        }
    }
}

fn elapsed_ms(start: Instant) -> f64 {
    let ms = start.elapsed().as_secs_f64() * 1000.0;
    (ms * 100.0).round() / 100.0
}
