use std::time::Duration;

/// Exponential backoff between empty or failed polls.
///
/// The delay doubles with every consecutive idle round, capped at `max`, and
/// starts over from `initial` once a poll returns work.
#[derive(Debug, Clone)]
pub struct Backoff {
    initial: Duration,
    max: Duration,
    consecutive_idle: u32,
}

impl Backoff {
    pub fn new(initial: Duration, max: Duration) -> Self {
        Self { initial, max: max.max(initial), consecutive_idle: 0 }
    }

    /// Delay to wait before the next poll; advances the backoff.
    pub fn next_delay(&mut self) -> Duration {
        // 2^16 times any sane initial delay already exceeds every realistic cap
        let exponent = self.consecutive_idle.min(16);
        self.consecutive_idle = self.consecutive_idle.saturating_add(1);
        self.initial.saturating_mul(1u32 << exponent).min(self.max)
    }

    pub fn reset(&mut self) {
        self.consecutive_idle = 0;
    }

    pub fn consecutive_idle(&self) -> u32 {
        self.consecutive_idle
    }
}
