//! Deadline over a whole attempt sequence.
//!
//! Placed outside the retry layer, so the duration bounds the first attempt
//! and every retry together. When it elapses the pending attempt is dropped.

use std::task::{Context, Poll};
use std::time::Duration;

use bytes::Bytes;
use futures_util::future::BoxFuture;
use tower::{Layer, Service};
use tracing::warn;

use crate::{Error, Request, Result};

/// Layer applying a [`Deadline`].
#[derive(Debug, Clone, Copy)]
pub struct DeadlineLayer {
    duration: Duration,
}

impl DeadlineLayer {
    /// Deadline of `duration`.
    #[must_use]
    pub const fn new(duration: Duration) -> Self {
        Self { duration }
    }
}

impl<S> Layer<S> for DeadlineLayer {
    type Service = Deadline<S>;

    fn layer(&self, inner: S) -> Self::Service {
        Deadline {
            inner,
            duration: self.duration,
        }
    }
}

/// Service failing with [`Error::Timeout`] once its duration has elapsed.
#[derive(Debug, Clone)]
pub struct Deadline<S> {
    inner: S,
    duration: Duration,
}

impl<S, R> Service<Request<Bytes>> for Deadline<S>
where
    S: Service<Request<Bytes>, Response = R, Error = Error>,
    S::Future: Send + 'static,
    R: Send + 'static,
{
    type Response = R;
    type Error = Error;
    type Future = BoxFuture<'static, Result<R>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<()>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, request: Request<Bytes>) -> Self::Future {
        let url = request.url().clone();
        let duration = self.duration;
        let future = self.inner.call(request);

        Box::pin(async move {
            tokio::time::timeout(duration, future).await.unwrap_or_else(|_| {
                warn!(
                    %url,
                    timeout_ms = u64::try_from(duration.as_millis()).unwrap_or(u64::MAX),
                    "deadline elapsed"
                );
                Err(Error::Timeout)
            })
        })
    }
}
