//! Clock abstractions used by the token bucket's refill math.

use tokio::time::Instant;

/// Clock abstraction so timing can be faked in tests.
///
/// All bucket math runs on whole milliseconds read through this trait; the
/// limiter never reads ambient time directly.
pub trait Clock: Send + Sync + std::fmt::Debug {
    fn now_millis(&self) -> u64;
}

/// Monotonic clock backed by the tokio runtime's notion of time.
///
/// Notes: anchored at construction and resets when the process restarts.
/// Because it reads `tokio::time::Instant`, paused-clock tests
/// (`#[tokio::test(start_paused = true)]`) drive it deterministically.
#[derive(Debug, Clone)]
pub struct MonotonicClock {
    start: Instant,
}

impl Default for MonotonicClock {
    fn default() -> Self {
        Self { start: Instant::now() }
    }
}

impl Clock for MonotonicClock {
    fn now_millis(&self) -> u64 {
        u64::try_from(self.start.elapsed().as_millis()).unwrap_or(u64::MAX)
    }
}
