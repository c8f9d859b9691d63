use chrono::{DateTime, Utc};
use rust_decimal::prelude::FromPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Currency {
    BRL,
    USD,
    MXN,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TransactionRequest {
    pub transaction_id: String,
    pub amount: Decimal,
    #[serde(default = "default_currency")]
    pub currency: Currency,
    pub merchant_id: String,
    pub card_last_four: String,
    #[serde(default)]
    pub metadata: HashMap<String, serde_json::Value>,
}

fn default_currency() -> Currency {
    Currency::BRL
}

impl TransactionRequest {
    /// Router-level validation; the engine never sees a malformed request.
    pub fn validate(&self) -> Result<(), String> {
        if !valid_identifier(&self.transaction_id) {
            return Err("transaction_id must be 1-64 chars of [A-Za-z0-9_-]".to_string());
        }
        if !valid_identifier(&self.merchant_id) {
            return Err("merchant_id must be 1-64 chars of [A-Za-z0-9_-]".to_string());
        }
        if self.amount <= Decimal::ZERO {
            return Err("amount must be greater than zero".to_string());
        }
        if self.amount > Decimal::from(1_000_000) {
            return Err("amount must not exceed 1000000".to_string());
        }
        if self.amount.scale() > 2 {
            return Err("amount must have at most 2 decimal places".to_string());
        }
        if self.card_last_four.len() != 4
            || !self.card_last_four.bytes().all(|b| b.is_ascii_digit())
        {
            return Err("card_last_four must be exactly 4 digits".to_string());
        }
        let metadata_len = serde_json::to_string(&self.metadata)
            .map(|s| s.len())
            .unwrap_or(usize::MAX);
        if metadata_len > 1024 {
            return Err("metadata must not exceed 1 KB".to_string());
        }
        Ok(())
    }
}

fn valid_identifier(s: &str) -> bool {
    !s.is_empty()
        && s.len() <= 64
        && s.bytes().all(|b| b.is_ascii_alphanumeric() || b == b'-' || b == b'_')
}

/// `amount * fee_rate` in decimal arithmetic, carried at 4 decimal places.
pub fn fee_for(amount: Decimal, fee_rate: f64) -> Decimal {
    let rate = Decimal::from_f64(fee_rate).unwrap_or_default();
    let mut fee = amount * rate;
    fee.rescale(4);
    fee
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionStatus {
    Approved,
    Declined,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeclineType {
    Hard,
    Soft,
}

#[derive(Debug, Clone, Serialize)]
pub struct TransactionResponse {
    pub transaction_id: String,
    pub status: TransactionStatus,
    pub processor_used: Option<String>,
    pub amount: Decimal,
    pub currency: Currency,
    pub fee: Option<Decimal>,
    pub fee_rate: Option<f64>,
    pub decline_reason: Option<String>,
    pub decline_type: Option<DeclineType>,
    pub attempts: u32,
    pub processors_tried: Vec<String>,
    pub retry_log: Vec<String>,
    pub latency_ms: f64,
    pub processed_at: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
pub struct ErrorEnvelope {
    pub error: ErrorPayload,
}

#[derive(Debug, Serialize)]
pub struct ErrorPayload {
    pub code: String,
    pub message: String,
}

pub fn err(code: &str, message: &str) -> ErrorEnvelope {
    ErrorEnvelope {
        error: ErrorPayload {
            code: code.to_string(),
            message: message.to_string(),
        },
    }
}
