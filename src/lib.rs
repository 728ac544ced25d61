#![forbid(unsafe_code)]
#![deny(warnings)]
#![cfg_attr(not(test), deny(clippy::all))]

//! # Tollbooth 🎟️
//!
//! Client-side admission control for rate-limited services: a token-bucket
//! rate limiter paired with a fair, single-flight FIFO queue. Excess calls
//! are deferred until capacity frees up instead of failing outright.
//!
//! ## Features
//!
//! - **Token bucket** with stepwise, whole-token refill
//! - **FIFO queue** with strict arrival-order service
//! - **Single-flight drain loop** per limiter (cooperative waits, no busy
//!   loops, no duplicate drains)
//! - **Per-call isolation**: a failing call rejects only its own future
//! - **Adapters**: a bound-function wrapper and a `tower` middleware layer
//! - **Injectable clock and sleeper** for deterministic tests
//!
//! ## Quick Start
//!
//! ```rust
//! use std::time::Duration;
//! use tollbooth::{Limiter, LimiterConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // 25 requests per second; bursts beyond that queue up.
//!     let limiter = Limiter::new(LimiterConfig::new("search", 25, Duration::from_secs(1))?);
//!
//!     let body = limiter
//!         .execute(|| async { Ok::<_, std::io::Error>("hit") })
//!         .await?;
//!     assert_eq!(body, "hit");
//!     Ok(())
//! }
//! ```

mod bucket;
pub mod clock;
pub mod config;
pub mod error;
pub mod limiter;
pub mod registry;
pub mod service;
pub mod sleeper;
pub mod wrap;

// Re-exports
pub use clock::{Clock, MonotonicClock};
pub use config::{ConfigError, LimiterConfig};
pub use error::ThrottleError;
pub use limiter::{Limiter, Pending, Status};
pub use registry::{InMemoryLimiterRegistry, LimiterRegistry, RegistryError};
pub use service::{ThrottleLayer, ThrottleService};
pub use sleeper::{InstantSleeper, Sleeper, TokioSleeper, TrackingSleeper};
pub use wrap::Throttled;
