use anyhow::Result;
use flexipay::circuit::breaker::BreakerConfig;
use flexipay::circuit::registry::BreakerRegistry;
use flexipay::config::AppConfig;
use flexipay::domain::transaction::{
    DeclineType, TransactionRequest, TransactionStatus,
};
use flexipay::engine::fallback::FallbackEngine;
use flexipay::processors::{ChargeOutcome, OutcomeKind, Processor};
use flexipay::stats::StatsService;
use parking_lot::Mutex;
use rust_decimal_macros::dec;
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;

#[derive(Debug, Clone, Copy)]
enum Step {
    Succeed,
    SoftDecline(&'static str),
    HardDecline(&'static str),
    RateLimited,
    Stall,
    Fail,
}

/// Deterministic processor driven by a fixed script of outcomes; an empty
/// script approves everything.
struct ScriptedProcessor {
    name: &'static str,
    fee_rate: f64,
    script: Mutex<VecDeque<Step>>,
    calls: AtomicU32,
}

impl ScriptedProcessor {
    fn new(name: &'static str, fee_rate: f64, steps: &[Step]) -> Arc<Self> {
        Arc::new(Self {
            name,
            fee_rate,
            script: Mutex::new(steps.iter().copied().collect()),
            calls: AtomicU32::new(0),
        })
    }

    fn calls(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }

    fn outcome(&self, kind: OutcomeKind, reason: Option<&str>) -> ChargeOutcome {
        ChargeOutcome {
            processor: self.name.to_string(),
            kind,
            reason: reason.map(str::to_string),
            fee: None,
            fee_rate: None,
            authorization_id: None,
            latency_ms: 1.0,
        }
    }
}

#[async_trait::async_trait]
impl Processor for ScriptedProcessor {
    fn name(&self) -> &str {
        self.name
    }

    fn fee_rate(&self) -> f64 {
        self.fee_rate
    }

    async fn charge(&self, _request: &TransactionRequest) -> Result<ChargeOutcome> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let step = self.script.lock().pop_front().unwrap_or(Step::Succeed);
        match step {
            Step::Succeed => Ok(self.outcome(OutcomeKind::Success, None)),
            Step::SoftDecline(code) => Ok(self.outcome(OutcomeKind::SoftDecline, Some(code))),
            Step::HardDecline(code) => Ok(self.outcome(OutcomeKind::HardDecline, Some(code))),
            Step::RateLimited => {
                Ok(self.outcome(OutcomeKind::RateLimited, Some("rate_limit_exceeded")))
            }
            Step::Stall => {
                tokio::time::sleep(Duration::from_secs(3600)).await;
                Ok(self.outcome(OutcomeKind::Timeout, Some("timeout")))
            }
            Step::Fail => Err(anyhow::anyhow!("connection pool exhausted")),
        }
    }
}

struct Harness {
    engine: FallbackEngine,
    registry: Arc<BreakerRegistry>,
    stats: Arc<StatsService>,
}

fn harness(processors: Vec<Arc<dyn Processor>>) -> Harness {
    let registry = Arc::new(BreakerRegistry::new(
        processors.iter().map(|p| p.name()).collect::<Vec<_>>(),
        BreakerConfig::default(),
    ));
    let stats = Arc::new(StatsService::new());
    let engine = FallbackEngine::new(
        processors,
        registry.clone(),
        stats.clone(),
        &AppConfig::default(),
    );
    Harness { engine, registry, stats }
}

fn request(amount: rust_decimal::Decimal) -> TransactionRequest {
    TransactionRequest {
        transaction_id: "txn-1".to_string(),
        amount,
        currency: flexipay::domain::transaction::Currency::BRL,
        merchant_id: "merchant-1".to_string(),
        card_last_four: "4242".to_string(),
        metadata: HashMap::new(),
    }
}

#[tokio::test]
async fn approves_on_first_processor() {
    let vortex = ScriptedProcessor::new("VortexPay", 0.025, &[Step::Succeed]);
    let swift = ScriptedProcessor::new("SwiftPay", 0.029, &[]);
    let pix = ScriptedProcessor::new("PixFlow", 0.032, &[]);
    let h = harness(vec![vortex.clone(), swift.clone(), pix.clone()]);

    let resp = h.engine.process(request(dec!(100.00))).await;

    assert_eq!(resp.status, TransactionStatus::Approved);
    assert_eq!(resp.processor_used.as_deref(), Some("VortexPay"));
    assert_eq!(resp.fee.unwrap().to_string(), "2.5000");
    assert_eq!(resp.fee_rate, Some(0.025));
    assert_eq!(resp.attempts, 1);
    assert_eq!(resp.processors_tried, vec!["VortexPay(success)"]);
    assert_eq!(swift.calls(), 0);
    assert_eq!(pix.calls(), 0);

    let snap = h.stats.snapshot();
    assert_eq!(snap.total_approved, 1);
    assert_eq!(snap.total_fees_collected, dec!(2.5000));
}

#[tokio::test]
async fn hard_decline_stops_the_chain() {
    let vortex = ScriptedProcessor::new("VortexPay", 0.025, &[Step::HardDecline("fraud_detected")]);
    let swift = ScriptedProcessor::new("SwiftPay", 0.029, &[]);
    let pix = ScriptedProcessor::new("PixFlow", 0.032, &[]);
    let h = harness(vec![vortex.clone(), swift.clone(), pix.clone()]);

    let resp = h.engine.process(request(dec!(50.00))).await;

    assert_eq!(resp.status, TransactionStatus::Declined);
    assert_eq!(resp.decline_type, Some(DeclineType::Hard));
    assert_eq!(resp.decline_reason.as_deref(), Some("fraud_detected"));
    assert_eq!(resp.attempts, 1);
    assert_eq!(resp.processors_tried, vec!["VortexPay(hard_decline:fraud_detected)"]);
    assert_eq!(swift.calls(), 0);
    assert_eq!(pix.calls(), 0);
}

#[tokio::test]
async fn soft_decline_falls_through_to_next() {
    let vortex =
        ScriptedProcessor::new("VortexPay", 0.025, &[Step::SoftDecline("insufficient_funds")]);
    let swift = ScriptedProcessor::new("SwiftPay", 0.029, &[Step::Succeed]);
    let pix = ScriptedProcessor::new("PixFlow", 0.032, &[]);
    let h = harness(vec![vortex, swift, pix.clone()]);

    let resp = h.engine.process(request(dec!(10.00))).await;

    assert_eq!(resp.status, TransactionStatus::Approved);
    assert_eq!(resp.processor_used.as_deref(), Some("SwiftPay"));
    assert_eq!(resp.fee.unwrap().to_string(), "0.2900");
    assert_eq!(resp.attempts, 2);
    assert_eq!(
        resp.processors_tried,
        vec!["VortexPay(soft_decline:insufficient_funds)", "SwiftPay(success)"]
    );
    assert_eq!(pix.calls(), 0);
}

#[tokio::test]
async fn open_breaker_skips_processor_without_calling_it() {
    let vortex = ScriptedProcessor::new("VortexPay", 0.025, &[]);
    let swift = ScriptedProcessor::new("SwiftPay", 0.029, &[Step::Succeed]);
    let pix = ScriptedProcessor::new("PixFlow", 0.032, &[]);
    let h = harness(vec![vortex.clone(), swift, pix]);

    h.registry.inject("VortexPay", 6).unwrap();

    let resp = h.engine.process(request(dec!(200.00))).await;

    assert_eq!(resp.status, TransactionStatus::Approved);
    assert_eq!(resp.processor_used.as_deref(), Some("SwiftPay"));
    assert_eq!(
        resp.processors_tried,
        vec!["VortexPay(circuit_open)", "SwiftPay(success)"]
    );
    assert_eq!(resp.attempts, 1);
    assert_eq!(vortex.calls(), 0);
}

#[tokio::test(start_paused = true)]
async fn rate_limit_retries_same_processor_with_backoff() {
    let vortex = ScriptedProcessor::new(
        "VortexPay",
        0.025,
        &[Step::RateLimited, Step::RateLimited, Step::Succeed],
    );
    let swift = ScriptedProcessor::new("SwiftPay", 0.029, &[]);
    let h = harness(vec![vortex.clone(), swift.clone()]);

    let resp = h.engine.process(request(dec!(1.00))).await;

    assert_eq!(resp.status, TransactionStatus::Approved);
    assert_eq!(resp.processor_used.as_deref(), Some("VortexPay"));
    assert_eq!(resp.attempts, 3);
    assert_eq!(
        resp.processors_tried,
        vec![
            "VortexPay(rate_limited)",
            "VortexPay(rate_limited)",
            "VortexPay(success)"
        ]
    );
    assert_eq!(resp.retry_log.len(), 2);
    assert_eq!(vortex.calls(), 3);
    assert_eq!(swift.calls(), 0);
}

#[tokio::test(start_paused = true)]
async fn rate_limit_exhaustion_moves_to_next_processor() {
    let vortex = ScriptedProcessor::new(
        "VortexPay",
        0.025,
        &[Step::RateLimited, Step::RateLimited, Step::RateLimited],
    );
    let swift = ScriptedProcessor::new("SwiftPay", 0.029, &[Step::Succeed]);
    let h = harness(vec![vortex.clone(), swift.clone()]);

    let resp = h.engine.process(request(dec!(5.00))).await;

    assert_eq!(resp.status, TransactionStatus::Approved);
    assert_eq!(resp.processor_used.as_deref(), Some("SwiftPay"));
    assert_eq!(resp.attempts, 4);
    assert_eq!(vortex.calls(), 3);
    assert_eq!(swift.calls(), 1);
}

#[tokio::test]
async fn all_soft_declines_produce_soft_decline_response() {
    let vortex = ScriptedProcessor::new("VortexPay", 0.025, &[Step::SoftDecline("insufficient_funds")]);
    let swift = ScriptedProcessor::new("SwiftPay", 0.029, &[Step::SoftDecline("temporary_unavailable")]);
    let pix = ScriptedProcessor::new("PixFlow", 0.032, &[Step::SoftDecline("insufficient_funds")]);
    let h = harness(vec![vortex, swift, pix]);

    let resp = h.engine.process(request(dec!(1.00))).await;

    assert_eq!(resp.status, TransactionStatus::Declined);
    assert_eq!(resp.decline_type, Some(DeclineType::Soft));
    assert_eq!(resp.processor_used.as_deref(), Some("PixFlow"));
    assert_eq!(resp.decline_reason.as_deref(), Some("insufficient_funds"));
    assert_eq!(resp.attempts, 3);
    assert_eq!(
        resp.processors_tried,
        vec![
            "VortexPay(soft_decline:insufficient_funds)",
            "SwiftPay(soft_decline:temporary_unavailable)",
            "PixFlow(soft_decline:insufficient_funds)"
        ]
    );

    let snap = h.stats.snapshot();
    assert_eq!(snap.total_declined, 1);
    assert_eq!(snap.total_approved, 0);
}

#[tokio::test(start_paused = true)]
async fn stalled_processor_times_out_and_falls_through() {
    let vortex = ScriptedProcessor::new("VortexPay", 0.025, &[Step::Stall]);
    let swift = ScriptedProcessor::new("SwiftPay", 0.029, &[Step::Succeed]);
    let h = harness(vec![vortex, swift]);

    let resp = h.engine.process(request(dec!(20.00))).await;

    assert_eq!(resp.status, TransactionStatus::Approved);
    assert_eq!(resp.processor_used.as_deref(), Some("SwiftPay"));
    assert_eq!(resp.attempts, 2);
    assert_eq!(
        resp.processors_tried,
        vec!["VortexPay(timeout)", "SwiftPay(success)"]
    );
}

#[tokio::test]
async fn processor_error_counts_as_internal_soft_decline() {
    let vortex = ScriptedProcessor::new("VortexPay", 0.025, &[Step::Fail]);
    let swift = ScriptedProcessor::new("SwiftPay", 0.029, &[Step::Succeed]);
    let h = harness(vec![vortex, swift]);

    let resp = h.engine.process(request(dec!(30.00))).await;

    assert_eq!(resp.status, TransactionStatus::Approved);
    assert_eq!(resp.processor_used.as_deref(), Some("SwiftPay"));
    assert_eq!(
        resp.processors_tried,
        vec!["VortexPay(soft_decline:internal_error)", "SwiftPay(success)"]
    );
}

#[tokio::test]
async fn candidates_are_ranked_by_ascending_fee() {
    // Registered in reverse fee order; the cheaper processor must still go first.
    let pix = ScriptedProcessor::new("PixFlow", 0.032, &[Step::Succeed]);
    let vortex = ScriptedProcessor::new("VortexPay", 0.025, &[Step::SoftDecline("limit_exceeded")]);
    let h = harness(vec![pix.clone(), vortex.clone()]);

    let resp = h.engine.process(request(dec!(2.00))).await;

    assert_eq!(
        resp.processors_tried,
        vec!["VortexPay(soft_decline:limit_exceeded)", "PixFlow(success)"]
    );
    assert_eq!(resp.processor_used.as_deref(), Some("PixFlow"));
}

#[tokio::test]
async fn trail_records_every_attempt_and_stats_see_each_one() {
    let vortex = ScriptedProcessor::new("VortexPay", 0.025, &[Step::SoftDecline("limit_exceeded")]);
    let swift = ScriptedProcessor::new("SwiftPay", 0.029, &[Step::Succeed]);
    let h = harness(vec![vortex, swift]);

    let resp = h.engine.process(request(dec!(40.00))).await;

    assert_eq!(resp.attempts as usize, resp.processors_tried.len());

    let snap = h.stats.snapshot();
    assert_eq!(snap.per_processor["VortexPay"].soft_decline_count, 1);
    assert_eq!(snap.per_processor["SwiftPay"].success_count, 1);
    assert_eq!(snap.total_transactions, 1);
}
