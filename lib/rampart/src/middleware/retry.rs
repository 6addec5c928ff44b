//! Immediate retry policy for [`tower::retry::RetryLayer`].

use std::future;

use bytes::Bytes;
use tower::retry::Policy;
use tracing::debug;

use crate::{Error, Request};

/// Re-issues a failed attempt right away, up to a fixed budget.
///
/// Every [`retryable`](Error::is_retryable) failure is retried: transport
/// errors and non-success statuses alike. Decode failures, gate rejections
/// and request construction errors are not. There is no backoff and no
/// idempotency check; each retry sends a fresh clone of the original request.
///
/// # Example
///
/// ```
/// use rampart::middleware::AttemptPolicy;
/// use tower::retry::RetryLayer;
///
/// // One attempt plus up to three retries.
/// let layer = RetryLayer::new(AttemptPolicy::new(3));
/// ```
#[derive(Debug, Clone, Copy)]
pub struct AttemptPolicy {
    remaining: u32,
}

impl AttemptPolicy {
    /// Policy allowing `retries` additional attempts.
    #[must_use]
    pub const fn new(retries: u32) -> Self {
        Self { remaining: retries }
    }

    /// Retries left.
    #[must_use]
    pub const fn remaining(&self) -> u32 {
        self.remaining
    }
}

impl<Res> Policy<Request<Bytes>, Res, Error> for AttemptPolicy {
    type Future = future::Ready<()>;

    fn retry(
        &mut self,
        request: &mut Request<Bytes>,
        result: &mut Result<Res, Error>,
    ) -> Option<Self::Future> {
        let Err(error) = result else {
            return None;
        };
        if self.remaining == 0 || !error.is_retryable() {
            return None;
        }

        self.remaining -= 1;
        debug!(
            url = %request.url(),
            error = %error,
            remaining = self.remaining,
            "retrying request"
        );
        Some(future::ready(()))
    }

    fn clone_request(&mut self, request: &Request<Bytes>) -> Option<Request<Bytes>> {
        Some(request.clone())
    }
}
