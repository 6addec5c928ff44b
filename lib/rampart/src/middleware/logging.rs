//! Per-attempt logging.
//!
//! Sits inside the retry layer, so every attempt is logged, retried ones
//! included.

use std::task::{Context, Poll};
use std::time::Instant;

use bytes::Bytes;
use futures_util::future::BoxFuture;
use tower::{Layer, Service};
use tracing::{Instrument, Level, info, span, warn};

use crate::{Error, Request, Result};

/// Layer that adds attempt logging.
#[derive(Debug, Clone, Copy, Default)]
pub struct LoggingLayer;

impl LoggingLayer {
    /// Create a new logging layer.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl<S> Layer<S> for LoggingLayer {
    type Service = Logging<S>;

    fn layer(&self, inner: S) -> Self::Service {
        Logging { inner }
    }
}

/// Service that logs the start, success and failure of each attempt.
#[derive(Debug, Clone)]
pub struct Logging<S> {
    inner: S,
}

impl<S, R> Service<Request<Bytes>> for Logging<S>
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
        let method = request.method();
        let url = request.url().clone();
        let span = span!(Level::INFO, "http_attempt", %method, %url);

        let start = Instant::now();
        span.in_scope(|| info!(method = %method, url = %url, "sending request"));
        let future = self.inner.call(request);

        Box::pin(
            async move {
                let result = future.await;
                let elapsed_ms = u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX);

                match &result {
                    Ok(_) => info!(url = %url, elapsed_ms, "request succeeded"),
                    Err(err) => warn!(url = %url, error = %err, elapsed_ms, "request failed"),
                }

                result
            }
            .instrument(span),
        )
    }
}
