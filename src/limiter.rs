//! The limiter: a token bucket feeding a single-flight FIFO queue.
//!
//! Semantics:
//! - [`Limiter::submit`] appends the operation to the tail of the queue and
//!   returns its completion future immediately; [`Limiter::execute`] is the
//!   awaiting form.
//! - At most one drain loop runs per limiter. The loop consumes one token
//!   per queued operation, services the queue strictly in arrival order, and
//!   sleeps for the bucket's computed wait (plus a small epsilon) when no
//!   token is available.
//! - Service is sequential: while an operation is in flight nothing else is
//!   serviced, even if further tokens exist. An operation that never
//!   resolves blocks the queue behind it.
//! - A failing operation rejects only its own future.
//!
//! Invariants:
//! - Queue, bucket, and the `draining` flag share one lock; the flag is
//!   cleared in the same critical section that observes the queue empty, so
//!   a racing submission can never be stranded without a running loop.
//! - Only the drain loop pops the queue or consumes tokens.

use crate::bucket::TokenBucket;
use crate::clock::{Clock, MonotonicClock};
use crate::config::{ConfigError, LimiterConfig};
use crate::error::ThrottleError;
use crate::sleeper::{Sleeper, TokioSleeper};
use crate::wrap::Throttled;
use futures::future::BoxFuture;
use futures::FutureExt;
use pin_project::pin_project;
use std::collections::VecDeque;
use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex};
use std::task::{Context, Poll};
use std::time::Duration;
use tokio::sync::oneshot;

/// Grace added to every token wait so timer jitter cannot wake the drain
/// loop a hair before the next token is mintable.
const WAIT_EPSILON: Duration = Duration::from_millis(10);

/// A queued operation, type-erased. Running it delivers the result through
/// the completion channel owned by the originating caller.
type Job = Box<dyn FnOnce() -> BoxFuture<'static, ()> + Send>;

/// Observability snapshot returned by [`Limiter::status`].
///
/// Best-effort: taking it triggers a refill but mutates nothing else.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Status {
    /// Service name this limiter guards.
    pub name: String,
    /// Tokens currently available.
    pub tokens: u32,
    /// Operations waiting in the queue.
    pub queue_len: usize,
}

struct QueueState {
    bucket: TokenBucket,
    jobs: VecDeque<Job>,
    draining: bool,
}

struct Shared {
    config: LimiterConfig,
    clock: Arc<dyn Clock>,
    sleeper: Arc<dyn Sleeper>,
    state: Mutex<QueueState>,
}

/// Admission control for one named external service.
///
/// Clones share the same bucket and queue via `Arc`, so every handle
/// observes and affects the same pacing. Distinct limiters are fully
/// independent; create one per upstream service and route every outbound
/// call for that service through it.
///
/// ```rust
/// use std::time::Duration;
/// use tollbooth::Limiter;
///
/// # #[tokio::main]
/// # async fn main() {
/// let limiter = Limiter::with_rate("geocoder", 25, Duration::from_secs(1)).unwrap();
/// let out = limiter.execute(|| async { Ok::<_, std::io::Error>(42) }).await;
/// assert_eq!(out.unwrap(), 42);
/// # }
/// ```
#[derive(Clone)]
pub struct Limiter {
    shared: Arc<Shared>,
}

impl fmt::Debug for Limiter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Limiter")
            .field("name", &self.shared.config.name())
            .field("max_requests", &self.shared.config.max_requests())
            .field("window", &self.shared.config.window())
            .finish()
    }
}

impl Limiter {
    /// Create a limiter from a validated config.
    pub fn new(config: LimiterConfig) -> Self {
        Self::assemble(config, Arc::new(MonotonicClock::default()), Arc::new(TokioSleeper))
    }

    /// Convenience constructor validating the rate in place.
    ///
    /// # Examples
    /// ```
    /// use std::time::Duration;
    /// use tollbooth::Limiter;
    /// let limiter = Limiter::with_rate("mailer", 100, Duration::from_secs(60)).unwrap();
    /// assert_eq!(limiter.name(), "mailer");
    /// ```
    pub fn with_rate(
        name: impl Into<String>,
        max_requests: u32,
        window: Duration,
    ) -> Result<Self, ConfigError> {
        Ok(Self::new(LimiterConfig::new(name, max_requests, window)?))
    }

    /// Override the clock (useful for deterministic tests).
    ///
    /// Rebuilds the bucket against the new clock; call this at construction
    /// time, before any work is submitted.
    pub fn with_clock<C: Clock + 'static>(self, clock: C) -> Self {
        Self::assemble(
            self.shared.config.clone(),
            Arc::new(clock),
            Arc::clone(&self.shared.sleeper),
        )
    }

    /// Override the sleeper used for token waits.
    ///
    /// Same caveat as [`Limiter::with_clock`]: construction time only.
    pub fn with_sleeper<S: Sleeper + 'static>(self, sleeper: S) -> Self {
        Self::assemble(
            self.shared.config.clone(),
            Arc::clone(&self.shared.clock),
            Arc::new(sleeper),
        )
    }

    fn assemble(config: LimiterConfig, clock: Arc<dyn Clock>, sleeper: Arc<dyn Sleeper>) -> Self {
        let bucket = TokenBucket::new(config.max_requests(), config.window(), clock.now_millis());
        let state = Mutex::new(QueueState { bucket, jobs: VecDeque::new(), draining: false });
        Self { shared: Arc::new(Shared { config, clock, sleeper, state }) }
    }

    /// Queue an operation and return its completion future immediately.
    ///
    /// Submission itself never blocks and never fails; the returned
    /// [`Pending`] settles with the operation's own result once its turn
    /// comes, independent of every other submission.
    ///
    /// # Panics
    ///
    /// Panics if called outside a tokio runtime (the drain loop is a
    /// spawned task).
    pub fn submit<T, E, Fut, Op>(&self, operation: Op) -> Pending<T, E>
    where
        T: Send + 'static,
        E: Send + 'static,
        Fut: Future<Output = Result<T, E>> + Send + 'static,
        Op: FnOnce() -> Fut + Send + 'static,
    {
        let (tx, rx) = oneshot::channel();
        let job: Job = Box::new(move || {
            async move {
                let outcome = operation().await;
                // The caller may have dropped its handle; nothing to deliver to.
                let _ = tx.send(outcome);
            }
            .boxed()
        });

        let start_drain = {
            let mut state = self.shared.state.lock().unwrap();
            state.jobs.push_back(job);
            // Test-and-set under the queue lock: at most one drain loop per
            // limiter, even under concurrent submissions.
            !std::mem::replace(&mut state.draining, true)
        };

        if start_drain {
            tokio::spawn(drain(Arc::clone(&self.shared)));
        }

        Pending { rx }
    }

    /// Run an operation under this limiter, awaiting its turn and result.
    ///
    /// Equivalent to `submit(operation).await`.
    pub async fn execute<T, E, Fut, Op>(&self, operation: Op) -> Result<T, ThrottleError<E>>
    where
        T: Send + 'static,
        E: Send + 'static,
        Fut: Future<Output = Result<T, E>> + Send + 'static,
        Op: FnOnce() -> Fut + Send + 'static,
    {
        self.submit(operation).await
    }

    /// Bind an arbitrary async function to this limiter; see [`Throttled`].
    pub fn wrap<F>(&self, operation: F) -> Throttled<F> {
        Throttled::new(self.clone(), operation)
    }

    /// Best-effort snapshot for observability.
    pub fn status(&self) -> Status {
        let mut state = self.shared.state.lock().unwrap();
        state.bucket.refill(self.shared.clock.now_millis());
        Status {
            name: self.shared.config.name().to_string(),
            tokens: state.bucket.tokens(),
            queue_len: state.jobs.len(),
        }
    }

    /// Service name this limiter guards.
    pub fn name(&self) -> &str {
        self.shared.config.name()
    }

    /// The config this limiter was built from.
    pub fn config(&self) -> &LimiterConfig {
        &self.shared.config
    }
}

enum Step {
    Run(Job),
    Wait(Duration),
}

async fn drain(shared: Arc<Shared>) {
    tracing::debug!(
        target: "tollbooth::limiter",
        name = %shared.config.name(),
        "drain loop started"
    );
    loop {
        let step = {
            let mut state = shared.state.lock().unwrap();
            match state.jobs.pop_front() {
                None => {
                    // Flag clear and emptiness check share this critical
                    // section: a concurrent submit either already enqueued
                    // (we would have popped it) or will see the cleared flag
                    // and start a fresh loop.
                    state.draining = false;
                    None
                }
                Some(job) => {
                    let now = shared.clock.now_millis();
                    if state.bucket.try_consume(now) {
                        Some(Step::Run(job))
                    } else {
                        let wait = state.bucket.wait_time(now) + WAIT_EPSILON;
                        state.jobs.push_front(job);
                        Some(Step::Wait(wait))
                    }
                }
            }
        };

        match step {
            Some(Step::Run(job)) => job().await,
            Some(Step::Wait(pause)) => {
                tracing::trace!(
                    target: "tollbooth::limiter",
                    name = %shared.config.name(),
                    wait = ?pause,
                    "queue paused until next token"
                );
                shared.sleeper.sleep(pause).await;
            }
            None => break,
        }
    }
    tracing::debug!(
        target: "tollbooth::limiter",
        name = %shared.config.name(),
        "drain loop idle"
    );
}

/// Completion future returned by [`Limiter::submit`].
///
/// Settles once the queued operation has run, with its own result, or with
/// [`ThrottleError::Disconnected`] if the limiter was torn down first.
#[pin_project]
#[must_use = "futures do nothing unless you `.await` or poll them"]
pub struct Pending<T, E> {
    #[pin]
    rx: oneshot::Receiver<Result<T, E>>,
}

impl<T, E> fmt::Debug for Pending<T, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Pending").finish_non_exhaustive()
    }
}

impl<T, E> Future for Pending<T, E> {
    type Output = Result<T, ThrottleError<E>>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        match self.project().rx.poll(cx) {
            Poll::Ready(Ok(Ok(value))) => Poll::Ready(Ok(value)),
            Poll::Ready(Ok(Err(e))) => Poll::Ready(Err(ThrottleError::Inner(e))),
            Poll::Ready(Err(_)) => Poll::Ready(Err(ThrottleError::Disconnected)),
            Poll::Pending => Poll::Pending,
        }
    }
}
