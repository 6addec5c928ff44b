//! Resolved transport requests.
//!
//! A [`Request`] is what reaches the transport: an absolute URL, a header map
//! and a ready-to-send body. It is produced from a
//! [`RequestSpec`](crate::RequestSpec) when execution starts and is cloned for
//! every attempt, so each retry re-issues the call from scratch.

use std::collections::HashMap;

use bytes::Bytes;
use url::Url;

use crate::Method;

/// An HTTP request with method, absolute URL, headers and optional body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Request<B = Bytes> {
    method: Method,
    url: Url,
    headers: HashMap<String, String>,
    body: Option<B>,
}

impl<B> Request<B> {
    /// Request without headers or body.
    #[must_use]
    pub fn new(method: Method, url: Url) -> Self {
        Self::from_parts(method, url, HashMap::new(), None)
    }

    /// Reassemble a request from its parts.
    #[must_use]
    pub const fn from_parts(
        method: Method,
        url: Url,
        headers: HashMap<String, String>,
        body: Option<B>,
    ) -> Self {
        Self {
            method,
            url,
            headers,
            body,
        }
    }

    /// HTTP method.
    #[must_use]
    pub const fn method(&self) -> Method {
        self.method
    }

    /// Absolute request URL.
    #[must_use]
    pub const fn url(&self) -> &Url {
        &self.url
    }

    /// Request headers.
    #[must_use]
    pub const fn headers(&self) -> &HashMap<String, String> {
        &self.headers
    }

    /// Single header value by exact name.
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).map(String::as_str)
    }

    /// Request body.
    #[must_use]
    pub const fn body(&self) -> Option<&B> {
        self.body.as_ref()
    }

    /// Consume into `(method, url, headers, body)`.
    #[must_use]
    pub fn into_parts(self) -> (Method, Url, HashMap<String, String>, Option<B>) {
        (self.method, self.url, self.headers, self.body)
    }
}
