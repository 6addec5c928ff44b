//! Tower services over the transport traits.
//!
//! These are the innermost services of the attempt stack. They turn a non-2xx
//! response into [`Error::Http`] so that status failures travel through retry,
//! gate accounting and error mapping exactly like transport failures.

use std::sync::Arc;
use std::task::{Context, Poll};

use bytes::Bytes;
use futures_util::future::BoxFuture;
use tower_service::Service;

use crate::{Error, HttpClient, HttpClientStreaming, Request, Response, Result, StreamingResponse};

/// Buffered transport service.
#[derive(Debug)]
pub struct Transport<C> {
    client: Arc<C>,
}

impl<C> Transport<C> {
    /// Wrap a shared client.
    #[must_use]
    pub const fn new(client: Arc<C>) -> Self {
        Self { client }
    }
}

impl<C> Clone for Transport<C> {
    fn clone(&self) -> Self {
        Self {
            client: Arc::clone(&self.client),
        }
    }
}

impl<C: HttpClient> Service<Request<Bytes>> for Transport<C> {
    type Response = Response<Bytes>;
    type Error = Error;
    type Future = BoxFuture<'static, Result<Response<Bytes>>>;

    fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<()>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, request: Request<Bytes>) -> Self::Future {
        let client = Arc::clone(&self.client);
        Box::pin(async move { client.execute(request).await?.error_for_status() })
    }
}

/// Streaming transport service.
///
/// The body of an error response is buffered before failing so it reaches the
/// error mapping.
#[derive(Debug)]
pub struct StreamingTransport<C> {
    client: Arc<C>,
}

impl<C> StreamingTransport<C> {
    /// Wrap a shared client.
    #[must_use]
    pub const fn new(client: Arc<C>) -> Self {
        Self { client }
    }
}

impl<C> Clone for StreamingTransport<C> {
    fn clone(&self) -> Self {
        Self {
            client: Arc::clone(&self.client),
        }
    }
}

impl<C: HttpClientStreaming> Service<Request<Bytes>> for StreamingTransport<C> {
    type Response = StreamingResponse;
    type Error = Error;
    type Future = BoxFuture<'static, Result<StreamingResponse>>;

    fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<()>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, request: Request<Bytes>) -> Self::Future {
        let client = Arc::clone(&self.client);
        Box::pin(async move {
            client
                .execute_streaming(request)
                .await?
                .error_for_status()
                .await
        })
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use assert2::{check, let_assert};
    use tower::ServiceExt;
    use url::Url;

    use super::*;
    use crate::Method;

    struct Fixed(u16);

    impl HttpClient for Fixed {
        async fn execute(&self, _request: Request<Bytes>) -> Result<Response<Bytes>> {
            Ok(Response::new(self.0, HashMap::new(), Bytes::from_static(b"body")))
        }
    }

    fn request() -> Request<Bytes> {
        let url = Url::parse("http://localhost/").expect("valid URL");
        Request::new(Method::Get, url)
    }

    #[tokio::test]
    async fn success_passes_through() {
        let transport = Transport::new(Arc::new(Fixed(200)));
        let_assert!(Ok(response) = transport.oneshot(request()).await);
        check!(response.status() == 200);
    }

    #[tokio::test]
    async fn error_status_becomes_http_error() {
        let transport = Transport::new(Arc::new(Fixed(500)));
        let_assert!(Err(Error::Http { status, body }) = transport.oneshot(request()).await);
        check!(status == 500);
        check!(body.as_ref() == b"body");
    }
}
