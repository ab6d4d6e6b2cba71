//! Reconnect backoff
//!
//! Exponential delay with symmetric jitter, capped at a maximum. The first
//! retry after a good connection is immediate so a short blip recovers
//! without waiting.

/// Default first non-zero delay
pub const DEFAULT_INITIAL_MS: u32 = 500;

/// Default delay cap
pub const DEFAULT_MAX_MS: u32 = 30_000;

/// Default jitter, percent of the nominal delay in each direction
pub const DEFAULT_JITTER_PERCENT: u8 = 25;

/// Backoff tuning
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct BackoffPolicy {
    pub initial_ms: u32,
    pub max_ms: u32,
    pub jitter_percent: u8,
}

impl Default for BackoffPolicy {
    fn default() -> Self {
        Self {
            initial_ms: DEFAULT_INITIAL_MS,
            max_ms: DEFAULT_MAX_MS,
            jitter_percent: DEFAULT_JITTER_PERCENT,
        }
    }
}

/// Reconnect delay generator
#[derive(Debug, Clone)]
pub struct ReconnectBackoff {
    policy: BackoffPolicy,
    /// Retries since the last successful connection
    attempt: u32,
    rng: u32,
}

impl ReconnectBackoff {
    /// Create a backoff with a jitter seed
    ///
    /// A zero seed is replaced, xorshift would get stuck on it.
    pub fn new(policy: BackoffPolicy, seed: u32) -> Self {
        Self {
            policy,
            attempt: 0,
            rng: if seed == 0 { 0x9E37_79B9 } else { seed },
        }
    }

    /// Delay before the next connect attempt, advancing the attempt count
    pub fn next_delay(&mut self) -> u32 {
        let attempt = self.attempt;
        self.attempt = self.attempt.saturating_add(1);

        if attempt == 0 {
            return 0;
        }

        let nominal = self.nominal(attempt);
        let span = nominal as u64 * self.policy.jitter_percent.min(100) as u64 / 100;
        if span == 0 {
            return nominal;
        }

        let offset = self.next_random() as u64 % (2 * span + 1);
        let jittered = nominal as u64 + offset - span;
        jittered.min(self.policy.max_ms as u64) as u32
    }

    /// Forget failures after a successful connection
    pub fn reset(&mut self) {
        self.attempt = 0;
    }

    /// Retries since the last success
    pub fn attempt(&self) -> u32 {
        self.attempt
    }

    pub fn policy(&self) -> BackoffPolicy {
        self.policy
    }

    /// Delay without jitter for retry number `attempt` (1-based)
    fn nominal(&self, attempt: u32) -> u32 {
        let shift = (attempt - 1).min(31);
        let delay = (self.policy.initial_ms as u64) << shift;
        delay.min(self.policy.max_ms as u64) as u32
    }

    fn next_random(&mut self) -> u32 {
        let mut x = self.rng;
        x ^= x << 13;
        x ^= x >> 17;
        x ^= x << 5;
        self.rng = x;
        x
    }
}
