//! Stepwise token-bucket math.

use std::time::Duration;

/// Token bucket with whole-token, stepwise refill.
///
/// Credit is granted only in whole tokens. While the elapsed time is too
/// short to mint one, `last_refill_at` stays put, so partial progress toward
/// the next token carries over to the next check instead of being discarded
/// or double-counted. The resulting refill curve is a stairstep, not a
/// continuous ramp.
///
/// Invariant: `0 <= tokens <= capacity` in every reachable state. Owned
/// exclusively by one limiter and mutated only under its lock; `now` is
/// always injected in clock milliseconds.
#[derive(Debug, Clone)]
pub(crate) struct TokenBucket {
    capacity: u32,
    tokens: u32,
    window_ms: u64,
    last_refill_at: u64,
}

impl TokenBucket {
    /// A fresh bucket starts full.
    pub(crate) fn new(capacity: u32, window: Duration, now: u64) -> Self {
        Self {
            capacity,
            tokens: capacity,
            window_ms: u64::try_from(window.as_millis()).unwrap_or(u64::MAX),
            last_refill_at: now,
        }
    }

    /// Credit whole tokens earned since the last refill.
    ///
    /// The timestamp only advances when at least one token was credited.
    pub(crate) fn refill(&mut self, now: u64) {
        let elapsed = now.saturating_sub(self.last_refill_at);
        let credit =
            u128::from(elapsed) * u128::from(self.capacity) / u128::from(self.window_ms);
        if credit == 0 {
            return;
        }
        let credit = u32::try_from(credit).unwrap_or(u32::MAX);
        self.tokens = self.tokens.saturating_add(credit).min(self.capacity);
        self.last_refill_at = now;
    }

    /// Refill, then take one token if any are available.
    pub(crate) fn try_consume(&mut self, now: u64) -> bool {
        self.refill(now);
        if self.tokens > 0 {
            self.tokens -= 1;
            true
        } else {
            false
        }
    }

    /// Time until the next whole token is guaranteed available.
    ///
    /// Zero whenever a token is already there.
    pub(crate) fn wait_time(&mut self, now: u64) -> Duration {
        self.refill(now);
        if self.tokens > 0 {
            return Duration::ZERO;
        }
        let period = self.window_ms / u64::from(self.capacity);
        Duration::from_millis(period.saturating_sub(now.saturating_sub(self.last_refill_at)))
    }

    /// Currently available tokens.
    pub(crate) fn tokens(&self) -> u32 {
        self.tokens
    }
}
