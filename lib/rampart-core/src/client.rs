//! Transport capability traits.
//!
//! - [`HttpClient`] issues one request and buffers the response.
//! - [`HttpClientStreaming`] issues one request and hands back the body as it
//!   arrives.
//!
//! Implementations report what the wire returned: a non-2xx status is a
//! successful [`Response`], not an error. Turning statuses into failures is
//! the pipeline's job.

use std::future::Future;
use std::sync::Arc;

use bytes::Bytes;
use url::Url;

use crate::{Request, Response, Result, StreamingResponse};

/// Core HTTP transport trait.
pub trait HttpClient: Send + Sync + 'static {
    /// Execute one request and return the buffered response.
    ///
    /// # Errors
    ///
    /// Returns an error if no response could be obtained: connection or TLS
    /// failure, transport timeout, malformed response.
    fn execute(&self, request: Request<Bytes>)
    -> impl Future<Output = Result<Response<Bytes>>> + Send;

    /// Base URL relative request URLs are resolved against.
    fn base_url(&self) -> Option<&Url> {
        None
    }
}

/// Streaming HTTP transport trait.
pub trait HttpClientStreaming: HttpClient {
    /// Execute one request and return a response whose body is read lazily.
    ///
    /// # Errors
    ///
    /// Same as [`HttpClient::execute`]; body chunk errors surface through the
    /// stream.
    fn execute_streaming(
        &self,
        request: Request<Bytes>,
    ) -> impl Future<Output = Result<StreamingResponse>> + Send;
}

impl<C: HttpClient> HttpClient for Arc<C> {
    fn execute(
        &self,
        request: Request<Bytes>,
    ) -> impl Future<Output = Result<Response<Bytes>>> + Send {
        (**self).execute(request)
    }

    fn base_url(&self) -> Option<&Url> {
        (**self).base_url()
    }
}

impl<C: HttpClientStreaming> HttpClientStreaming for Arc<C> {
    fn execute_streaming(
        &self,
        request: Request<Bytes>,
    ) -> impl Future<Output = Result<StreamingResponse>> + Send {
        (**self).execute_streaming(request)
    }
}
