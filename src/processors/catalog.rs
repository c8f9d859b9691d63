use crate::processors::mock::{CardOverrides, MockProcessor};
use crate::processors::OutcomeKind;
use std::collections::HashMap;

/// Test cards honored by every mock processor so demos behave predictably.
fn standard_card_overrides() -> CardOverrides {
    HashMap::from([
        (
            "0000".to_string(),
            (OutcomeKind::HardDecline, Some("fraud_detected".to_string())),
        ),
        (
            "1111".to_string(),
            (OutcomeKind::SoftDecline, Some("insufficient_funds".to_string())),
        ),
        ("9999".to_string(), (OutcomeKind::Timeout, None)),
    ])
}

/// Primary processor: cheapest (2.5%) but least reliable.
pub fn vortex_pay(seed: Option<u64>) -> MockProcessor {
    MockProcessor::new(
        "VortexPay",
        0.025,
        (0.020, 0.180),
        vec![
            (0.68, OutcomeKind::Success),
            (0.12, OutcomeKind::SoftDecline),
            (0.07, OutcomeKind::HardDecline),
            (0.08, OutcomeKind::RateLimited),
            (0.05, OutcomeKind::Timeout),
        ],
        vec!["insufficient_funds", "limit_exceeded", "processor_unavailable"],
        vec![
            "stolen_card",
            "do_not_honor",
            "invalid_account",
            "fraud_detected",
            "invalid_cvv",
            "card_expired",
        ],
        standard_card_overrides(),
        seed,
    )
}

/// Secondary processor: more reliable (2.9%), first fallback.
pub fn swift_pay(seed: Option<u64>) -> MockProcessor {
    MockProcessor::new(
        "SwiftPay",
        0.029,
        (0.030, 0.200),
        vec![
            (0.74, OutcomeKind::Success),
            (0.10, OutcomeKind::SoftDecline),
            (0.06, OutcomeKind::HardDecline),
            (0.06, OutcomeKind::RateLimited),
            (0.04, OutcomeKind::Timeout),
        ],
        vec!["insufficient_funds", "processor_timeout", "temporary_unavailable"],
        vec![
            "stolen_card",
            "do_not_honor",
            "fraud_detected",
            "invalid_card_number",
            "card_expired",
        ],
        standard_card_overrides(),
        seed,
    )
}

/// Tertiary processor: most reliable (3.2%), last-resort fallback.
pub fn pix_flow(seed: Option<u64>) -> MockProcessor {
    MockProcessor::new(
        "PixFlow",
        0.032,
        (0.050, 0.250),
        vec![
            (0.82, OutcomeKind::Success),
            (0.08, OutcomeKind::SoftDecline),
            (0.05, OutcomeKind::HardDecline),
            (0.03, OutcomeKind::RateLimited),
            (0.02, OutcomeKind::Timeout),
        ],
        vec![
            "insufficient_funds",
            "account_frozen",
            "pix_limit_exceeded",
            "temporary_unavailable",
        ],
        vec!["stolen_card", "do_not_honor", "fraud_detected", "invalid_pix_key"],
        standard_card_overrides(),
        seed,
    )
}
