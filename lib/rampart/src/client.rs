//! HTTP transport using hyper-util.

use std::collections::HashMap;
use std::fmt;
use std::time::Duration;

use bytes::Bytes;
use futures_util::TryStreamExt;
use http_body_util::{BodyExt, BodyStream, Full};
use hyper_rustls::HttpsConnector;
use hyper_util::client::legacy::{Client, ResponseFuture, connect::HttpConnector};
use hyper_util::rt::TokioExecutor;
use tokio::time::Timeout;
use url::Url;

use crate::config::{ClientConfig, ClientConfigBuilder};
use crate::connector::https_connector;
use crate::{Error, HttpClient, HttpClientStreaming, Request, Response, Result};
use rampart_core::{StreamingBody, StreamingResponse};

type Inner = Client<HttpsConnector<HttpConnector>, Full<Bytes>>;

/// Pooled HTTP/1.1 + HTTP/2 client over rustls.
///
/// Reports every response as-is, whatever its status. Cloning is cheap and
/// clones share the connection pool.
///
/// Connection tasks are spawned on the tokio runtime that issues the request.
///
/// # Example
///
/// ```no_run
/// use std::time::Duration;
///
/// use rampart::HyperClient;
///
/// let client = HyperClient::builder()
///     .base_url("https://api.example.com/v1/".parse().expect("valid URL"))
///     .timeout(Duration::from_secs(5))
///     .build();
/// ```
#[derive(Clone)]
pub struct HyperClient {
    inner: Inner,
    config: ClientConfig,
}

impl HyperClient {
    /// Client with default configuration and no base URL.
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(ClientConfig::default())
    }

    /// Client with a custom configuration.
    #[must_use]
    pub fn with_config(config: ClientConfig) -> Self {
        let inner = Client::builder(TokioExecutor::new())
            .pool_idle_timeout(config.pool_idle_timeout)
            .pool_max_idle_per_host(config.pool_max_idle_per_host)
            .retry_canceled_requests(config.retry_canceled_requests)
            .build(https_connector(&config));

        Self { inner, config }
    }

    /// Create a new client builder.
    #[must_use]
    pub fn builder() -> HyperClientBuilder {
        HyperClientBuilder::default()
    }

    /// Client configuration.
    #[must_use]
    pub const fn config(&self) -> &ClientConfig {
        &self.config
    }

    fn build_hyper_request(&self, request: Request<Bytes>) -> Result<http::Request<Full<Bytes>>> {
        let (method, url, headers, body) = request.into_parts();

        let mut builder = http::Request::builder()
            .method(http::Method::from(method))
            .uri(url.as_str());

        for (name, value) in &headers {
            builder = builder.header(name.as_str(), value.as_str());
        }

        if let Some(user_agent) = &self.config.user_agent {
            let has_user_agent = headers
                .keys()
                .any(|name| name.eq_ignore_ascii_case(http::header::USER_AGENT.as_str()));
            if !has_user_agent {
                builder = builder.header(http::header::USER_AGENT, user_agent.as_str());
            }
        }

        builder
            .body(body.map_or_else(Full::default, Full::new))
            .map_err(|err| Error::invalid_request(err.to_string()))
    }

    fn extract_headers(headers: &http::HeaderMap) -> HashMap<String, String> {
        headers
            .iter()
            .filter_map(|(name, value)| {
                value
                    .to_str()
                    .ok()
                    .map(|value| (name.to_string(), value.to_string()))
            })
            .collect()
    }

    #[allow(clippy::needless_pass_by_value)]
    fn map_hyper_error(err: hyper_util::client::legacy::Error) -> Error {
        let message = err.to_string();
        let detail = std::error::Error::source(&err)
            .map(ToString::to_string)
            .unwrap_or_default();
        let lowered = detail.to_ascii_lowercase();

        if lowered.contains("tls") || lowered.contains("certificate") {
            Error::tls(format!("{message}: {detail}"))
        } else if detail.is_empty() {
            Error::connection(message)
        } else {
            Error::connection(format!("{message}: {detail}"))
        }
    }

    fn send(&self, request: Request<Bytes>) -> Result<Timeout<ResponseFuture>> {
        let request = self.build_hyper_request(request)?;
        Ok(tokio::time::timeout(
            self.config.attempt_timeout,
            self.inner.request(request),
        ))
    }
}

impl Default for HyperClient {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for HyperClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HyperClient")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl HttpClient for HyperClient {
    async fn execute(&self, request: Request<Bytes>) -> Result<Response<Bytes>> {
        let response = self
            .send(request)?
            .await
            .map_err(|_| Error::Timeout)?
            .map_err(Self::map_hyper_error)?;

        let status = response.status().as_u16();
        let headers = Self::extract_headers(response.headers());
        let body = response
            .into_body()
            .collect()
            .await
            .map_err(|err| Error::connection(err.to_string()))?
            .to_bytes();

        Ok(Response::new(status, headers, body))
    }

    fn base_url(&self) -> Option<&Url> {
        self.config.base_url.as_ref()
    }
}

impl HttpClientStreaming for HyperClient {
    async fn execute_streaming(&self, request: Request<Bytes>) -> Result<StreamingResponse> {
        let response = self
            .send(request)?
            .await
            .map_err(|_| Error::Timeout)?
            .map_err(Self::map_hyper_error)?;

        let status = response.status().as_u16();
        let headers = Self::extract_headers(response.headers());
        let body: StreamingBody = Box::pin(
            BodyStream::new(response.into_body())
                .try_filter_map(|frame| async move { Ok(frame.into_data().ok()) })
                .map_err(|err| Error::connection(err.to_string())),
        );

        Ok(StreamingResponse::new(status, headers, body))
    }
}

/// Builder for [`HyperClient`].
#[derive(Debug, Clone, Default)]
pub struct HyperClientBuilder {
    config: ClientConfigBuilder,
}

impl HyperClientBuilder {
    /// Base URL relative spec URLs are resolved against.
    ///
    /// Joining follows RFC 3986: end the base path with `/` to keep its last
    /// segment.
    #[must_use]
    pub fn base_url(mut self, base_url: Url) -> Self {
        self.config = self.config.base_url(base_url);
        self
    }

    /// Per-attempt timeout.
    #[must_use]
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.config = self.config.attempt_timeout(timeout);
        self
    }

    /// TCP connect timeout.
    #[must_use]
    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.config = self.config.connect_timeout(timeout);
        self
    }

    /// Idle connections kept per host.
    #[must_use]
    pub fn pool_max_idle_per_host(mut self, count: usize) -> Self {
        self.config = self.config.pool_max_idle_per_host(count);
        self
    }

    /// Idle connection timeout.
    #[must_use]
    pub fn pool_idle_timeout(mut self, timeout: Duration) -> Self {
        self.config = self.config.pool_idle_timeout(timeout);
        self
    }

    /// Whether canceled pooled requests are re-sent.
    #[must_use]
    pub fn retry_canceled_requests(mut self, retry: bool) -> Self {
        self.config = self.config.retry_canceled_requests(retry);
        self
    }

    /// `User-Agent` for requests that do not set one.
    #[must_use]
    pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.config = self.config.user_agent(user_agent);
        self
    }

    /// Build the client.
    #[must_use]
    pub fn build(self) -> HyperClient {
        HyperClient::with_config(self.config.build())
    }
}

#[cfg(test)]
mod tests {
    use assert2::{check, let_assert};

    use super::*;
    use crate::Method;

    #[test]
    fn builder_sets_config() {
        let_assert!(Ok(base) = Url::parse("http://localhost:8080/api/"));
        let client = HyperClient::builder()
            .base_url(base.clone())
            .timeout(Duration::from_secs(60))
            .pool_max_idle_per_host(16)
            .build();

        check!(client.config().attempt_timeout == Duration::from_secs(60));
        check!(client.config().pool_max_idle_per_host == 16);
        check!(client.base_url() == Some(&base));
    }

    #[test]
    fn default_has_no_base_url() {
        check!(HyperClient::default().base_url().is_none());
    }

    #[test]
    fn hyper_request_carries_everything() {
        let_assert!(Ok(url) = Url::parse("http://localhost/items?page=2"));
        let mut headers = HashMap::new();
        headers.insert("X-Trace".to_string(), "abc".to_string());
        let request = Request::from_parts(
            Method::Put,
            url,
            headers,
            Some(Bytes::from_static(b"payload")),
        );

        let_assert!(Ok(hyper_request) = HyperClient::new().build_hyper_request(request));
        check!(hyper_request.method() == http::Method::PUT);
        check!(hyper_request.uri() == "http://localhost/items?page=2");
        check!(hyper_request.headers()["x-trace"] == "abc");
        check!(hyper_request.headers()[http::header::USER_AGENT] == crate::DEFAULT_USER_AGENT);
    }

    #[test]
    fn explicit_user_agent_wins() {
        let_assert!(Ok(url) = Url::parse("http://localhost/"));
        let headers = HashMap::from([("user-agent".to_string(), "custom-agent/1".to_string())]);
        let request = Request::from_parts(Method::Get, url, headers, None);

        let client = HyperClient::builder().user_agent("ignored/0").build();
        let_assert!(Ok(hyper_request) = client.build_hyper_request(request));
        let agents: Vec<_> = hyper_request
            .headers()
            .get_all(http::header::USER_AGENT)
            .iter()
            .collect();
        check!(agents == ["custom-agent/1"]);
    }

    #[test]
    fn invalid_header_is_invalid_request() {
        let_assert!(Ok(url) = Url::parse("http://localhost/"));
        let mut headers = HashMap::new();
        headers.insert("Bad Header".to_string(), "value".to_string());
        let request = Request::from_parts(Method::Get, url, headers, None);

        let result = HyperClient::new().build_hyper_request(request);
        let_assert!(Err(Error::InvalidRequest(_)) = result);
    }

    #[test]
    fn debug_shows_config() {
        let debug = format!("{:?}", HyperClient::new());
        check!(debug.starts_with("HyperClient { config: ClientConfig"));
    }
}
