use rand::Rng;
use std::time::Duration;

/// Full-jitter exponential backoff for rate-limited retries:
/// `delay = uniform(0, min(cap, base * 2^attempt))`.
#[derive(Debug, Clone)]
pub struct Backoff {
    pub base_seconds: f64,
    pub cap_seconds: f64,
}

impl Backoff {
    pub fn new(base_seconds: f64, cap_seconds: f64) -> Self {
        Self { base_seconds, cap_seconds }
    }

    pub fn ceiling(&self, attempt: u32) -> f64 {
        (self.base_seconds * 2f64.powi(attempt as i32)).min(self.cap_seconds)
    }

    /// `attempt` is 0 for the first retry. The rng is caller-supplied so
    /// tests can seed it.
    pub fn delay(&self, attempt: u32, rng: &mut impl Rng) -> Duration {
        let ceiling = self.ceiling(attempt);
        let drawn = if ceiling > 0.0 { rng.gen_range(0.0..=ceiling) } else { 0.0 };
        Duration::from_secs_f64(drawn)
    }
}

impl Default for Backoff {
    fn default() -> Self {
        Self::new(0.5, 30.0)
    }
}
