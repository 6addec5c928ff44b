//! Per-call request description.
//!
//! A [`RequestSpec`] accumulates everything one outbound call needs: method,
//! URL, headers, body, the deadline for the whole attempt sequence, the retry
//! budget and local status-code mappings. Nothing is validated or sent until
//! an executor consumes it.
//!
//! # Example
//!
//! ```
//! use std::time::Duration;
//!
//! use rampart_core::{ClientError, RequestSpec};
//!
//! #[derive(serde::Serialize)]
//! struct NewUser<'a> {
//!     name: &'a str,
//! }
//!
//! let spec = RequestSpec::<ClientError>::post("/users")
//!     .bearer_auth("s3cr3t")
//!     .header("X-Request-Id", "42")
//!     .body(&NewUser { name: "Alice" })
//!     .timeout(Duration::from_secs(2))
//!     .retry(2);
//!
//! assert_eq!(spec.header_value("Authorization"), Some("Bearer s3cr3t"));
//! assert_eq!(spec.header_value("content-type"), Some("application/json"));
//! assert_eq!(spec.retry_count(), 2);
//! ```

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;

use crate::{
    ClientError, ContentType, ErrorFactory, FailureDescription, Method, Result, StatusMappings,
};

/// Deadline applied when none is set.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Description of one outbound call before execution.
///
/// Mutators consume and return the spec so calls chain. A spec is built by
/// one caller, executed once and dropped.
pub struct RequestSpec<E = ClientError> {
    method: Method,
    url: String,
    headers: HashMap<String, String>,
    body: Option<Result<Bytes>>,
    timeout: Duration,
    retry_count: u32,
    error_map: StatusMappings<E>,
}

/// A [`RequestSpec`] taken apart for execution.
pub struct SpecParts<E> {
    /// HTTP method.
    pub method: Method,
    /// Target URL, possibly relative to the transport's base URL.
    pub url: String,
    /// Header map, one value per name.
    pub headers: HashMap<String, String>,
    /// Serialized body, or the serialization error to report at execution.
    pub body: Option<Result<Bytes>>,
    /// Deadline for the whole attempt sequence.
    pub timeout: Duration,
    /// Additional attempts after the first failure.
    pub retry_count: u32,
    /// Local status-code mappings.
    pub error_map: StatusMappings<E>,
}

impl<E> RequestSpec<E> {
    /// Spec for `method` on `url`.
    ///
    /// The URL may be absolute or relative to the transport's base URL; it is
    /// only parsed at execution time.
    #[must_use]
    pub fn new(method: Method, url: impl Into<String>) -> Self {
        Self {
            method,
            url: url.into(),
            headers: HashMap::new(),
            body: None,
            timeout: DEFAULT_TIMEOUT,
            retry_count: 0,
            error_map: HashMap::new(),
        }
    }

    /// `GET` spec.
    #[must_use]
    pub fn get(url: impl Into<String>) -> Self {
        Self::new(Method::Get, url)
    }

    /// `POST` spec.
    #[must_use]
    pub fn post(url: impl Into<String>) -> Self {
        Self::new(Method::Post, url)
    }

    /// `PUT` spec.
    #[must_use]
    pub fn put(url: impl Into<String>) -> Self {
        Self::new(Method::Put, url)
    }

    /// `PATCH` spec.
    #[must_use]
    pub fn patch(url: impl Into<String>) -> Self {
        Self::new(Method::Patch, url)
    }

    /// `DELETE` spec.
    #[must_use]
    pub fn delete(url: impl Into<String>) -> Self {
        Self::new(Method::Delete, url)
    }

    /// Set a header, replacing any value already set under the same name.
    ///
    /// Names compare case-insensitively.
    #[must_use]
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.insert_header(name.into(), value.into());
        self
    }

    /// Merge several headers; later entries win.
    #[must_use]
    pub fn headers<K, V>(mut self, headers: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        for (name, value) in headers {
            self.insert_header(name.into(), value.into());
        }
        self
    }

    /// Authenticate with `Authorization: Bearer <token>`.
    #[must_use]
    pub fn bearer_auth(self, token: impl fmt::Display) -> Self {
        self.header("Authorization", format!("Bearer {token}"))
    }

    /// Send `value` serialized as JSON.
    ///
    /// Sets `Content-Type: application/json` unless a content type is already
    /// set. A serialization failure is reported when the spec is executed.
    #[must_use]
    pub fn body<B: serde::Serialize + ?Sized>(mut self, value: &B) -> Self {
        self.body = Some(crate::to_json(value));
        if self.find_header(ContentType::HEADER).is_none() {
            self.insert_header(
                ContentType::HEADER.to_string(),
                ContentType::Json.to_string(),
            );
        }
        self
    }

    /// Send raw bytes with an explicit content type.
    #[must_use]
    pub fn body_bytes(self, body: impl Into<Bytes>, content_type: impl Into<String>) -> Self {
        let mut spec = self.header(ContentType::HEADER, content_type);
        spec.body = Some(Ok(body.into()));
        spec
    }

    /// Deadline for the whole call, retries included.
    #[must_use]
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Number of additional attempts after the first failure.
    #[must_use]
    pub fn retry(mut self, retry_count: u32) -> Self {
        self.retry_count = retry_count;
        self
    }

    /// Map failures with `status` through `factory` for this call only.
    ///
    /// Takes precedence over the shared [`ErrorMapper`](crate::ErrorMapper).
    #[must_use]
    pub fn map_status<F>(mut self, status: u16, factory: F) -> Self
    where
        F: Fn(&FailureDescription) -> E + Send + Sync + 'static,
    {
        let factory: ErrorFactory<E> = Arc::new(factory);
        self.error_map.insert(status, factory);
        self
    }

    /// HTTP method.
    #[must_use]
    pub const fn method(&self) -> Method {
        self.method
    }

    /// Target URL as given.
    #[must_use]
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Header value by name, case-insensitively.
    #[must_use]
    pub fn header_value(&self, name: &str) -> Option<&str> {
        self.find_header(name)
            .and_then(|key| self.headers.get(key))
            .map(String::as_str)
    }

    /// Configured deadline.
    #[must_use]
    pub const fn timeout_duration(&self) -> Duration {
        self.timeout
    }

    /// Configured retry budget.
    #[must_use]
    pub const fn retry_count(&self) -> u32 {
        self.retry_count
    }

    /// Take the spec apart for execution.
    #[must_use]
    pub fn into_parts(self) -> SpecParts<E> {
        SpecParts {
            method: self.method,
            url: self.url,
            headers: self.headers,
            body: self.body,
            timeout: self.timeout,
            retry_count: self.retry_count,
            error_map: self.error_map,
        }
    }

    fn find_header(&self, name: &str) -> Option<&str> {
        self.headers
            .keys()
            .find(|key| key.eq_ignore_ascii_case(name))
            .map(String::as_str)
    }

    fn insert_header(&mut self, name: String, value: String) {
        self.headers.retain(|key, _| !key.eq_ignore_ascii_case(&name));
        self.headers.insert(name, value);
    }
}

impl<E> fmt::Debug for RequestSpec<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut mapped: Vec<_> = self.error_map.keys().copied().collect();
        mapped.sort_unstable();
        f.debug_struct("RequestSpec")
            .field("method", &self.method)
            .field("url", &self.url)
            .field("headers", &self.headers.keys().collect::<Vec<_>>())
            .field("has_body", &self.body.is_some())
            .field("timeout", &self.timeout)
            .field("retry_count", &self.retry_count)
            .field("mapped_statuses", &mapped)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use assert2::{check, let_assert};

    use super::*;
    use crate::{Error, ErrorMapper};

    type Spec = RequestSpec<ClientError>;

    #[test]
    fn defaults() {
        let spec = Spec::get("https://api.example.com/users");

        check!(spec.method() == Method::Get);
        check!(spec.url() == "https://api.example.com/users");
        check!(spec.timeout_duration() == DEFAULT_TIMEOUT);
        check!(spec.retry_count() == 0);

        let parts = spec.into_parts();
        check!(parts.headers.is_empty());
        check!(parts.body.is_none());
        check!(parts.error_map.is_empty());
    }

    #[test]
    fn shortcuts_set_method() {
        check!(Spec::post("/").method() == Method::Post);
        check!(Spec::put("/").method() == Method::Put);
        check!(Spec::patch("/").method() == Method::Patch);
        check!(Spec::delete("/").method() == Method::Delete);
    }

    #[test]
    fn header_last_write_wins() {
        let spec = Spec::get("/")
            .header("Accept", "text/plain")
            .header("accept", "application/json");

        check!(spec.header_value("ACCEPT") == Some("application/json"));
        check!(spec.into_parts().headers.len() == 1);
    }

    #[test]
    fn bulk_headers_merge() {
        let spec = Spec::get("/")
            .header("X-Trace", "a")
            .headers([("X-Trace", "b"), ("X-Tenant", "acme")]);

        check!(spec.header_value("X-Trace") == Some("b"));
        check!(spec.header_value("X-Tenant") == Some("acme"));
    }

    #[test]
    fn bearer_auth_sets_authorization() {
        let spec = Spec::get("/").bearer_auth("token-123");
        check!(spec.header_value("authorization") == Some("Bearer token-123"));
    }

    #[test]
    fn json_body_sets_content_type() {
        #[derive(serde::Serialize)]
        struct Person {
            name: &'static str,
            age: u32,
        }

        let spec = Spec::post("/people").body(&Person {
            name: "John Doe",
            age: 30,
        });
        check!(spec.header_value("Content-Type") == Some("application/json"));

        let_assert!(Some(Ok(body)) = spec.into_parts().body);
        check!(body.as_ref() == br#"{"name":"John Doe","age":30}"#);
    }

    #[test]
    fn json_body_keeps_explicit_content_type() {
        let spec = Spec::post("/")
            .header("content-type", "application/merge-patch+json")
            .body(&["a", "b"]);

        check!(spec.header_value("Content-Type") == Some("application/merge-patch+json"));
    }

    #[test]
    fn serialization_error_is_deferred() {
        let mut map = BTreeMap::new();
        map.insert((1, 2), "pair");

        let spec = Spec::post("/").body(&map);
        let_assert!(Some(Err(Error::JsonSerialization(_))) = spec.into_parts().body);
    }

    #[test]
    fn raw_body() {
        let spec = Spec::put("/blob").body_bytes(&b"\x00\x01"[..], "application/octet-stream");

        check!(spec.header_value("Content-Type") == Some("application/octet-stream"));
        let_assert!(Some(Ok(body)) = spec.into_parts().body);
        check!(body.as_ref() == b"\x00\x01");
    }

    #[test]
    fn timeout_and_retry() {
        let spec = Spec::get("/")
            .timeout(Duration::from_millis(300))
            .retry(3);

        check!(spec.timeout_duration() == Duration::from_millis(300));
        check!(spec.retry_count() == 3);
    }

    #[test]
    fn local_mapping_is_kept_for_resolution() {
        let spec = RequestSpec::<String>::get("/")
            .map_status(404, |_| "local".to_string())
            .map_status(404, |_| "local again".to_string());

        let parts = spec.into_parts();
        let mapper = ErrorMapper::with_default(|_| "default".to_string())
            .map(404, |_| "shared".to_string());
        let failure = FailureDescription::from(Error::http(404, "Not Found"));

        check!(mapper.resolve_with(&parts.error_map, &failure) == "local again");
    }

    #[test]
    fn debug_hides_header_values() {
        let spec = Spec::get("/secure").bearer_auth("secret-token");
        let debug = format!("{spec:?}");

        check!(debug.contains("Authorization"));
        check!(!debug.contains("secret-token"));
    }
}
