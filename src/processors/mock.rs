use crate::domain::transaction::{fee_for, TransactionRequest};
use crate::processors::{ChargeOutcome, OutcomeKind, Processor};
use anyhow::Result;
use parking_lot::Mutex;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::collections::HashMap;
use std::time::{Duration, Instant};
use uuid::Uuid;

/// Probability-weighted outcome rows, sampled by accumulation; any
/// probability mass left over maps to `Success`.
pub type OutcomeTable = Vec<(f64, OutcomeKind)>;

/// card_last_four -> (forced outcome, forced decline code). Matched before
/// random sampling so demos and integration tests stay deterministic.
pub type CardOverrides = HashMap<String, (OutcomeKind, Option<String>)>;

/// Parameterised mock processor. VortexPay, SwiftPay, and PixFlow differ only
/// in the configuration they pass in; the charge logic lives here once.
pub struct MockProcessor {
    name: String,
    fee_rate: f64,
    latency_range: (f64, f64),
    outcome_table: OutcomeTable,
    soft_codes: Vec<&'static str>,
    hard_codes: Vec<&'static str>,
    card_overrides: CardOverrides,
    rng: Mutex<StdRng>,
}

impl MockProcessor {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        name: &str,
        fee_rate: f64,
        latency_range: (f64, f64),
        outcome_table: OutcomeTable,
        soft_codes: Vec<&'static str>,
        hard_codes: Vec<&'static str>,
        card_overrides: CardOverrides,
        seed: Option<u64>,
    ) -> Self {
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self {
            name: name.to_string(),
            fee_rate,
            latency_range,
            outcome_table,
            soft_codes,
            hard_codes,
            card_overrides,
            rng: Mutex::new(rng),
        }
    }

    fn pick_outcome(&self, rng: &mut StdRng) -> OutcomeKind {
        let r: f64 = rng.gen();
        let mut cumulative = 0.0;
        for (prob, outcome) in &self.outcome_table {
            cumulative += prob;
            if r < cumulative {
                return *outcome;
            }
        }
        OutcomeKind::Success
    }

    fn declined(&self, kind: OutcomeKind, code: String, latency_ms: f64) -> ChargeOutcome {
        ChargeOutcome {
            processor: self.name.clone(),
            kind,
            reason: Some(code),
            fee: None,
            fee_rate: None,
            authorization_id: None,
            latency_ms,
        }
    }
}

#[async_trait::async_trait]
impl Processor for MockProcessor {
    fn name(&self) -> &str {
        &self.name
    }

    fn fee_rate(&self) -> f64 {
        self.fee_rate
    }

    async fn charge(&self, request: &TransactionRequest) -> Result<ChargeOutcome> {
        let start = Instant::now();
        // Draw everything random up front; the lock must not cross an await.
        let (simulated_latency, sampled, soft_pick, hard_pick) = {
            let mut rng = self.rng.lock();
            let latency = rng.gen_range(self.latency_range.0..=self.latency_range.1);
            let sampled = self.pick_outcome(&mut rng);
            let soft = rng.gen_range(0..self.soft_codes.len().max(1));
            let hard = rng.gen_range(0..self.hard_codes.len().max(1));
            (latency, sampled, soft, hard)
        };
        tokio::time::sleep(Duration::from_secs_f64(simulated_latency)).await;
        let elapsed_ms = start.elapsed().as_secs_f64() * 1000.0;

        let forced = self.card_overrides.get(&request.card_last_four).cloned();
        let (outcome, forced_code) = match forced {
            Some((kind, code)) => (kind, code),
            None => (sampled, None),
        };

        let result = match outcome {
            OutcomeKind::Success => ChargeOutcome {
                processor: self.name.clone(),
                kind: OutcomeKind::Success,
                reason: None,
                fee: Some(fee_for(request.amount, self.fee_rate)),
                fee_rate: Some(self.fee_rate),
                authorization_id: Some(format!("auth_{}", Uuid::new_v4())),
                latency_ms: elapsed_ms,
            },
            OutcomeKind::SoftDecline => {
                let code = forced_code.unwrap_or_else(|| pick_code(&self.soft_codes, soft_pick));
                self.declined(OutcomeKind::SoftDecline, code, elapsed_ms)
            }
            OutcomeKind::HardDecline => {
                let code = forced_code.unwrap_or_else(|| pick_code(&self.hard_codes, hard_pick));
                self.declined(OutcomeKind::HardDecline, code, elapsed_ms)
            }
            OutcomeKind::RateLimited => {
                self.declined(OutcomeKind::RateLimited, "rate_limit_exceeded".to_string(), elapsed_ms)
            }
            OutcomeKind::Timeout => {
                // Stall well past the engine's deadline; the caller's timeout
                // fires before this resolves.
                tokio::time::sleep(Duration::from_secs(60)).await;
                self.declined(OutcomeKind::Timeout, "timeout".to_string(), elapsed_ms)
            }
        };

        Ok(result)
    }
}

fn pick_code(codes: &[&'static str], idx: usize) -> String {
    codes
        .get(idx % codes.len().max(1))
        .copied()
        .unwrap_or("declined")
        .to_string()
}
