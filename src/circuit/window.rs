use std::collections::VecDeque;
use std::time::{Duration, Instant};

#[derive(Debug, Clone, Copy)]
struct Sample {
    at: Instant,
    success: bool,
}

/// Bounded success/failure history: at most `max_len` samples, none older
/// than `max_age`. A plain deque, not an EWMA; insertion order is event
/// order, and stale entries are evicted lazily on every read and write.
#[derive(Debug)]
pub struct RollingWindow {
    max_len: usize,
    max_age: Duration,
    samples: VecDeque<Sample>,
}

impl RollingWindow {
    pub fn new(max_len: usize, max_age: Duration) -> Self {
        Self {
            max_len,
            max_age,
            samples: VecDeque::with_capacity(max_len.min(1024)),
        }
    }

    pub fn record(&mut self, success: bool, at: Instant) {
        self.samples.push_back(Sample { at, success });
        self.evict(at);
    }

    /// (total, successes) over the still-live samples.
    pub fn snapshot(&mut self, at: Instant) -> (usize, usize) {
        self.evict(at);
        let successes = self.samples.iter().filter(|s| s.success).count();
        (self.samples.len(), successes)
    }

    pub fn reset(&mut self) {
        self.samples.clear();
    }

    fn evict(&mut self, at: Instant) {
        let cutoff = at.checked_sub(self.max_age);
        while let Some(head) = self.samples.front() {
            let stale = cutoff.is_some_and(|c| head.at < c);
            if stale || self.samples.len() > self.max_len {
                self.samples.pop_front();
            } else {
                break;
            }
        }
    }
}
