//! Transport responses.
//!
//! [`Response`] is a fully buffered response. [`StreamingResponse`] keeps the
//! body as a stream of chunks for the lazy-sequence role.

use std::collections::HashMap;
use std::fmt;
use std::pin::Pin;

use bytes::{Bytes, BytesMut};
use futures_core::Stream;
use futures_util::TryStreamExt;

/// A streaming body: chunks of bytes arriving over time.
pub type StreamingBody = Pin<Box<dyn Stream<Item = crate::Result<Bytes>> + Send>>;

/// HTTP response with status, headers and a buffered body.
#[derive(Debug, Clone)]
pub struct Response<B = Bytes> {
    status: u16,
    headers: HashMap<String, String>,
    body: B,
}

impl<B> Response<B> {
    /// Creates a new response.
    #[must_use]
    pub const fn new(status: u16, headers: HashMap<String, String>, body: B) -> Self {
        Self {
            status,
            headers,
            body,
        }
    }

    /// HTTP status code.
    #[must_use]
    pub const fn status(&self) -> u16 {
        self.status
    }

    /// Response headers.
    #[must_use]
    pub const fn headers(&self) -> &HashMap<String, String> {
        &self.headers
    }

    /// Single header value by name.
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).map(String::as_str)
    }

    /// Response body.
    #[must_use]
    pub const fn body(&self) -> &B {
        &self.body
    }

    /// Consume into the body.
    #[must_use]
    pub fn into_body(self) -> B {
        self.body
    }

    /// Status is 2xx.
    #[must_use]
    pub const fn is_success(&self) -> bool {
        is_success(self.status)
    }
}

impl Response<Bytes> {
    /// Turn a non-2xx response into [`Error::Http`](crate::Error::Http).
    ///
    /// # Errors
    ///
    /// Returns the status error carrying the body when the status is not 2xx.
    pub fn error_for_status(self) -> crate::Result<Self> {
        if self.is_success() {
            Ok(self)
        } else {
            Err(crate::Error::http(self.status, self.body))
        }
    }
}

/// HTTP response with a streaming body.
pub struct StreamingResponse {
    status: u16,
    headers: HashMap<String, String>,
    body: StreamingBody,
}

impl StreamingResponse {
    /// Creates a new streaming response.
    #[must_use]
    pub fn new(status: u16, headers: HashMap<String, String>, body: StreamingBody) -> Self {
        Self {
            status,
            headers,
            body,
        }
    }

    /// HTTP status code.
    #[must_use]
    pub const fn status(&self) -> u16 {
        self.status
    }

    /// Response headers.
    #[must_use]
    pub const fn headers(&self) -> &HashMap<String, String> {
        &self.headers
    }

    /// Status is 2xx.
    #[must_use]
    pub const fn is_success(&self) -> bool {
        is_success(self.status)
    }

    /// Consume into the streaming body.
    #[must_use]
    pub fn into_body(self) -> StreamingBody {
        self.body
    }

    /// Buffer the whole stream into a [`Response`].
    ///
    /// # Errors
    ///
    /// Returns the first chunk error.
    pub async fn collect(self) -> crate::Result<Response<Bytes>> {
        let body = self
            .body
            .try_fold(BytesMut::new(), |mut acc, chunk| async move {
                acc.extend_from_slice(&chunk);
                Ok(acc)
            })
            .await?;

        Ok(Response::new(self.status, self.headers, body.freeze()))
    }

    /// Turn a non-2xx response into [`Error::Http`](crate::Error::Http).
    ///
    /// The body of an error response is buffered so it can be handed to the
    /// error mapping.
    ///
    /// # Errors
    ///
    /// Returns the status error, or the chunk error hit while buffering it.
    pub async fn error_for_status(self) -> crate::Result<Self> {
        if self.is_success() {
            return Ok(self);
        }
        let response = self.collect().await?;
        Err(crate::Error::http(response.status, response.body))
    }
}

impl fmt::Debug for StreamingResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StreamingResponse")
            .field("status", &self.status)
            .field("headers", &self.headers)
            .finish_non_exhaustive()
    }
}

const fn is_success(status: u16) -> bool {
    status >= 200 && status < 300
}
