//! Transport configuration.

use std::time::Duration;

use url::Url;

/// `User-Agent` sent when a request does not set one.
pub const DEFAULT_USER_AGENT: &str = concat!("rampart/", env!("CARGO_PKG_VERSION"));

/// Settings of a [`HyperClient`](crate::HyperClient).
///
/// These bound a single transport attempt. The deadline covering a whole
/// execution, retries included, comes from each
/// [`RequestSpec`](crate::RequestSpec).
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// From sending one attempt to receiving its response head.
    pub attempt_timeout: Duration,
    /// TCP connect timeout.
    pub connect_timeout: Duration,
    /// Idle connections kept per host.
    pub pool_max_idle_per_host: usize,
    /// How long an idle pooled connection is kept.
    pub pool_idle_timeout: Duration,
    /// Re-send a request whose pooled connection closed before it was written.
    pub retry_canceled_requests: bool,
    /// `User-Agent` header added to requests without one; `None` adds nothing.
    pub user_agent: Option<String>,
    /// Base that relative spec URLs are joined onto. Its path always ends with `/`.
    pub base_url: Option<Url>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            attempt_timeout: Duration::from_secs(30),
            connect_timeout: Duration::from_secs(10),
            pool_max_idle_per_host: 32,
            pool_idle_timeout: Duration::from_secs(90),
            retry_canceled_requests: true,
            user_agent: Some(DEFAULT_USER_AGENT.to_string()),
            base_url: None,
        }
    }
}

impl ClientConfig {
    /// Builder starting from the defaults.
    #[must_use]
    pub fn builder() -> ClientConfigBuilder {
        ClientConfigBuilder::default()
    }
}

/// Builder for [`ClientConfig`].
#[derive(Debug, Clone, Default)]
pub struct ClientConfigBuilder {
    config: ClientConfig,
}

impl ClientConfigBuilder {
    /// Per-attempt timeout.
    #[must_use]
    pub const fn attempt_timeout(mut self, timeout: Duration) -> Self {
        self.config.attempt_timeout = timeout;
        self
    }

    /// TCP connect timeout.
    #[must_use]
    pub const fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.config.connect_timeout = timeout;
        self
    }

    /// Idle connections kept per host.
    #[must_use]
    pub const fn pool_max_idle_per_host(mut self, count: usize) -> Self {
        self.config.pool_max_idle_per_host = count;
        self
    }

    /// Idle connection lifetime.
    #[must_use]
    pub const fn pool_idle_timeout(mut self, timeout: Duration) -> Self {
        self.config.pool_idle_timeout = timeout;
        self
    }

    /// Whether requests canceled by a closing pooled connection are re-sent.
    #[must_use]
    pub const fn retry_canceled_requests(mut self, retry: bool) -> Self {
        self.config.retry_canceled_requests = retry;
        self
    }

    /// `User-Agent` for requests that do not set one.
    #[must_use]
    pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.config.user_agent = Some(user_agent.into());
        self
    }

    /// Send no default `User-Agent`.
    #[must_use]
    pub fn no_user_agent(mut self) -> Self {
        self.config.user_agent = None;
        self
    }

    /// Base URL for relative spec URLs.
    ///
    /// A trailing `/` is added to the path when missing, so
    /// `https://host/api` joined with `users` gives `https://host/api/users`.
    #[must_use]
    pub fn base_url(mut self, mut base_url: Url) -> Self {
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }
        self.config.base_url = Some(base_url);
        self
    }

    /// Finish.
    #[must_use]
    pub fn build(self) -> ClientConfig {
        self.config
    }
}

#[cfg(test)]
mod tests {
    use assert2::{check, let_assert};

    use super::*;

    #[test]
    fn defaults() {
        let config = ClientConfig::default();
        check!(config.attempt_timeout == Duration::from_secs(30));
        check!(config.connect_timeout == Duration::from_secs(10));
        check!(config.pool_max_idle_per_host == 32);
        check!(config.pool_idle_timeout == Duration::from_secs(90));
        check!(config.retry_canceled_requests);
        check!(config.user_agent.as_deref() == Some(DEFAULT_USER_AGENT));
        check!(config.base_url.is_none());
    }

    #[test]
    fn builder_keeps_unset_defaults() {
        let config = ClientConfig::builder()
            .attempt_timeout(Duration::from_secs(5))
            .retry_canceled_requests(false)
            .no_user_agent()
            .build();

        check!(config.attempt_timeout == Duration::from_secs(5));
        check!(!config.retry_canceled_requests);
        check!(config.user_agent.is_none());
        check!(config.connect_timeout == Duration::from_secs(10));
        check!(config.pool_max_idle_per_host == 32);
    }

    #[test]
    fn base_url_path_gets_trailing_slash() {
        let_assert!(Ok(base) = Url::parse("https://api.example.com/v1"));
        let config = ClientConfig::builder().base_url(base).build();

        let_assert!(Some(base) = config.base_url);
        check!(base.as_str() == "https://api.example.com/v1/");
        let_assert!(Ok(joined) = base.join("users/7"));
        check!(joined.as_str() == "https://api.example.com/v1/users/7");
    }

    #[test]
    fn root_base_url_is_unchanged() {
        let_assert!(Ok(base) = Url::parse("http://localhost:8080"));
        let config = ClientConfig::builder().base_url(base).build();

        check!(config.base_url.map(String::from).as_deref() == Some("http://localhost:8080/"));
    }
}
