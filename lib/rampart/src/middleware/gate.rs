//! Protection gate middleware.

use std::fmt;
use std::sync::Arc;
use std::task::{Context, Poll};

use bytes::Bytes;
use futures_util::future::BoxFuture;
use tower::{Layer, Service};
use tracing::warn;

use crate::{Error, ProtectionGate, Request, Result};

/// Layer that puts a [`ProtectionGate`] in front of a service.
#[derive(Clone)]
pub struct GateLayer {
    gate: Arc<dyn ProtectionGate>,
}

impl GateLayer {
    /// Wrap services with `gate`.
    #[must_use]
    pub fn new(gate: Arc<dyn ProtectionGate>) -> Self {
        Self { gate }
    }
}

impl fmt::Debug for GateLayer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GateLayer").finish_non_exhaustive()
    }
}

impl<S> Layer<S> for GateLayer {
    type Service = Gate<S>;

    fn layer(&self, inner: S) -> Self::Service {
        Gate {
            inner,
            gate: Arc::clone(&self.gate),
        }
    }
}

/// Service that asks the gate before calling through and reports the outcome.
///
/// A denied call fails with [`Error::CallNotPermitted`] and never reaches the
/// inner service.
#[derive(Clone)]
pub struct Gate<S> {
    inner: S,
    gate: Arc<dyn ProtectionGate>,
}

impl<S: fmt::Debug> fmt::Debug for Gate<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Gate")
            .field("inner", &self.inner)
            .finish_non_exhaustive()
    }
}

impl<S, R> Service<Request<Bytes>> for Gate<S>
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
        if !self.gate.try_acquire() {
            warn!(
                method = %request.method(),
                url = %request.url(),
                "call rejected by protection gate"
            );
            return Box::pin(async { Err(Error::CallNotPermitted) });
        }

        let gate = Arc::clone(&self.gate);
        let future = self.inner.call(request);
        Box::pin(async move {
            let result = future.await;
            match &result {
                Ok(_) => gate.on_success(),
                Err(err) => gate.on_failure(err),
            }
            result
        })
    }
}
