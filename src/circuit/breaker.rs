use crate::circuit::state::{BreakerStatus, CircuitDecision, CircuitState, FailureKind};
use crate::circuit::window::RollingWindow;
use parking_lot::Mutex;
use std::time::{Duration, Instant};
use tracing::{info, warn};

#[derive(Debug, Clone)]
pub struct BreakerConfig {
    pub window_size: usize,
    pub window_seconds: f64,
    pub trip_threshold: f64,
    pub cooldown_seconds: f64,
    pub min_samples: usize,
}

impl Default for BreakerConfig {
    fn default() -> Self {
        Self {
            window_size: 50,
            window_seconds: 300.0,
            trip_threshold: 0.20,
            cooldown_seconds: 120.0,
            min_samples: 5,
        }
    }
}

impl BreakerConfig {
    fn window_age(&self) -> Duration {
        Duration::from_secs_f64(self.window_seconds)
    }

    fn cooldown(&self) -> Duration {
        Duration::from_secs_f64(self.cooldown_seconds)
    }
}

#[derive(Debug)]
struct BreakerInner {
    state: CircuitState,
    window: RollingWindow,
    opened_at: Option<Instant>,
    last_failure_at: Option<Instant>,
}

/// Per-processor three-state breaker over one rolling window.
///
/// All mutation happens under the internal lock; callers never hold it across
/// an await. Every call in `HalfOpen` is admitted as a probe — a probe lost
/// to upstream cancellation therefore cannot wedge the breaker.
#[derive(Debug)]
pub struct CircuitBreaker {
    name: String,
    config: BreakerConfig,
    inner: Mutex<BreakerInner>,
}

impl CircuitBreaker {
    pub fn new(name: &str, config: BreakerConfig) -> Self {
        let window = RollingWindow::new(config.window_size, config.window_age());
        Self {
            name: name.to_string(),
            config,
            inner: Mutex::new(BreakerInner {
                state: CircuitState::Closed,
                window,
                opened_at: None,
                last_failure_at: None,
            }),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Admission check. Side effect: moves `Open` to `HalfOpen` once the
    /// cooldown has elapsed.
    pub fn allow(&self, now: Instant) -> CircuitDecision {
        let mut inner = self.inner.lock();
        match inner.state {
            CircuitState::Closed => CircuitDecision::Allow,
            CircuitState::Open => {
                let cooled_down = inner
                    .opened_at
                    .is_some_and(|t| now.saturating_duration_since(t) >= self.config.cooldown());
                if cooled_down {
                    inner.state = CircuitState::HalfOpen;
                    info!(processor = %self.name, "circuit breaker half-open, probing");
                    CircuitDecision::Probe
                } else {
                    CircuitDecision::Reject
                }
            }
            CircuitState::HalfOpen => CircuitDecision::Probe,
        }
    }

    pub fn record_success(&self, now: Instant) {
        let mut inner = self.inner.lock();
        match inner.state {
            CircuitState::HalfOpen => {
                // Probe succeeded; recover without inheriting stale failures.
                inner.window.reset();
                inner.state = CircuitState::Closed;
                inner.opened_at = None;
                info!(processor = %self.name, "circuit breaker closed after successful probe");
            }
            CircuitState::Closed => {
                inner.window.record(true, now);
                self.evaluate_trip(&mut inner, now);
            }
            CircuitState::Open => {
                inner.window.record(true, now);
            }
        }
    }

    pub fn record_failure(&self, now: Instant, kind: FailureKind) {
        if kind == FailureKind::HardDecline {
            // Cardholder-level outcome; the processor is not unhealthy
            // because cards are stolen.
            return;
        }
        let mut inner = self.inner.lock();
        inner.last_failure_at = Some(now);
        inner.window.record(false, now);
        match inner.state {
            CircuitState::Closed => self.evaluate_trip(&mut inner, now),
            CircuitState::HalfOpen => {
                inner.state = CircuitState::Open;
                inner.opened_at = Some(now);
                warn!(processor = %self.name, "probe failed, circuit breaker re-opened");
            }
            CircuitState::Open => {}
        }
    }

    fn evaluate_trip(&self, inner: &mut BreakerInner, now: Instant) {
        let (total, successes) = inner.window.snapshot(now);
        if total < self.config.min_samples {
            return;
        }
        let rate = successes as f64 / total as f64;
        if rate < self.config.trip_threshold {
            inner.state = CircuitState::Open;
            inner.opened_at = Some(now);
            warn!(
                processor = %self.name,
                success_rate = rate,
                samples = total,
                "circuit breaker tripped open"
            );
        }
    }

    /// Back to `Closed` with an empty window (admin surface).
    pub fn reset(&self) {
        let mut inner = self.inner.lock();
        inner.window.reset();
        inner.state = CircuitState::Closed;
        inner.opened_at = None;
        inner.last_failure_at = None;
        info!(processor = %self.name, "circuit breaker reset");
    }

    /// Append `count` synthetic failures and re-evaluate the trip condition
    /// immediately (admin surface).
    pub fn inject_failures(&self, count: usize, now: Instant) {
        let mut inner = self.inner.lock();
        for _ in 0..count {
            inner.window.record(false, now);
        }
        inner.last_failure_at = Some(now);
        if inner.state == CircuitState::Closed {
            self.evaluate_trip(&mut inner, now);
        }
    }

    pub fn status(&self, now: Instant) -> BreakerStatus {
        let mut inner = self.inner.lock();
        let (total, successes) = inner.window.snapshot(now);
        let success_rate = if total == 0 {
            1.0
        } else {
            successes as f64 / total as f64
        };

        let cooldown_remaining_seconds = match inner.state {
            CircuitState::Closed => None,
            CircuitState::Open | CircuitState::HalfOpen => inner.opened_at.map(|t| {
                let elapsed = now.saturating_duration_since(t).as_secs_f64();
                (self.config.cooldown_seconds - elapsed).max(0.0)
            }),
        };

        let last_failure_at = inner
            .last_failure_at
            .map(|t| format!("{:.1}s ago", now.saturating_duration_since(t).as_secs_f64()));

        BreakerStatus {
            state: inner.state,
            success_rate,
            total_calls_in_window: total,
            successful_calls_in_window: successes,
            failed_calls_in_window: total - successes,
            last_failure_at,
            cooldown_remaining_seconds,
        }
    }
}
