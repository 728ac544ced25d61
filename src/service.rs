//! Tower middleware that routes calls through a [`Limiter`].

use crate::error::ThrottleError;
use crate::limiter::Limiter;
use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};
use tower_layer::Layer;
use tower_service::Service;

/// A layer applying admission control to a wrapped service.
///
/// Unlike a denying rate limiter, the limiter behind this layer defers:
/// calls past capacity queue for a token instead of failing fast, so the
/// service sheds nothing.
#[derive(Clone, Debug)]
pub struct ThrottleLayer {
    limiter: Limiter,
}

impl ThrottleLayer {
    /// Create a layer bound to `limiter`.
    pub fn new(limiter: Limiter) -> Self {
        Self { limiter }
    }
}

impl<S> Layer<S> for ThrottleLayer {
    type Service = ThrottleService<S>;

    fn layer(&self, service: S) -> Self::Service {
        ThrottleService { inner: service, limiter: self.limiter.clone() }
    }
}

/// Middleware service that queues every call behind the limiter's tokens.
#[derive(Clone, Debug)]
pub struct ThrottleService<S> {
    inner: S,
    limiter: Limiter,
}

impl<S, Req> Service<Req> for ThrottleService<S>
where
    S: Service<Req> + Clone + Send + 'static,
    S::Future: Send + 'static,
    S::Response: Send + 'static,
    S::Error: Send + 'static,
    Req: Send + 'static,
{
    type Response = S::Response;
    type Error = ThrottleError<S::Error>;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx).map_err(ThrottleError::Inner)
    }

    fn call(&mut self, req: Req) -> Self::Future {
        let limiter = self.limiter.clone();
        let mut inner = self.inner.clone();

        Box::pin(async move {
            limiter.execute(move || async move { inner.call(req).await }).await
        })
    }
}
