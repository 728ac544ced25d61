//! Bind a reusable async function to a limiter.

use crate::error::ThrottleError;
use crate::limiter::Limiter;
use std::fmt;
use std::future::Future;

/// An async function bound to a [`Limiter`].
///
/// `call` keeps the wrapped function's argument value intact (pass a tuple
/// for multi-argument functions) while routing every invocation through
/// [`Limiter::execute`].
///
/// ```rust
/// use std::time::Duration;
/// use tollbooth::Limiter;
///
/// # #[tokio::main]
/// # async fn main() {
/// let limiter = Limiter::with_rate("geocoder", 25, Duration::from_secs(1)).unwrap();
/// let lookup = limiter.wrap(|address: &'static str| async move {
///     Ok::<_, std::io::Error>(format!("coords for {address}"))
/// });
/// let coords = lookup.call("downtown").await.unwrap();
/// assert_eq!(coords, "coords for downtown");
/// # }
/// ```
#[derive(Clone)]
pub struct Throttled<F> {
    limiter: Limiter,
    operation: F,
}

impl<F> Throttled<F> {
    /// Bind `operation` to `limiter`.
    pub fn new(limiter: Limiter, operation: F) -> Self {
        Self { limiter, operation }
    }

    /// The limiter this function is bound to.
    pub fn limiter(&self) -> &Limiter {
        &self.limiter
    }

    /// Invoke the wrapped function through the limiter.
    pub async fn call<Args, T, E, Fut>(&self, args: Args) -> Result<T, ThrottleError<E>>
    where
        F: Fn(Args) -> Fut + Clone + Send + 'static,
        Args: Send + 'static,
        Fut: Future<Output = Result<T, E>> + Send + 'static,
        T: Send + 'static,
        E: Send + 'static,
    {
        let operation = self.operation.clone();
        self.limiter.execute(move || operation(args)).await
    }
}

impl<F> fmt::Debug for Throttled<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Throttled")
            .field("limiter", &self.limiter.name())
            .finish_non_exhaustive()
    }
}
