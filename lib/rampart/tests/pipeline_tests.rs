//! End-to-end tests of the execution pipeline through `RestClient`.

use std::sync::Arc;
use std::time::Duration;

use assert2::{check, let_assert};
use futures_util::{StreamExt, TryStreamExt};
use rampart::middleware::{CircuitBreaker, CircuitBreakerConfig, CircuitState};
use rampart::{
    ClientError, Error, ErrorMapper, FailureDescription, FailureKind, HyperClient, NoProtection,
    ProtectionGate, RequestSpec, RestClient, Text,
};
use serde::Deserialize;
use wiremock::{
    Mock, MockServer, ResponseTemplate,
    matchers::{header, method, path},
};

#[derive(Debug, PartialEq, Deserialize)]
struct Person {
    name: String,
    age: u32,
}

#[derive(Debug)]
enum ApiError {
    NotFound(String),
    Gone,
    Other(ClientError),
}

impl From<ClientError> for ApiError {
    fn from(error: ClientError) -> Self {
        Self::Other(error)
    }
}

fn http_client(server: &MockServer) -> HyperClient {
    HyperClient::builder()
        .base_url(format!("{}/", server.uri()).parse().expect("base url"))
        .build()
}

fn rest_client(server: &MockServer) -> RestClient {
    RestClient::new(http_client(server), Arc::new(NoProtection)).expect("client")
}

fn api_client(server: &MockServer) -> RestClient<HyperClient, ApiError> {
    let errors = ErrorMapper::new().map(404, |failure: &FailureDescription| {
        ApiError::NotFound(failure.body().to_string())
    });
    RestClient::with_error_mapper(http_client(server), Arc::new(NoProtection), errors)
        .expect("client")
}

async fn mount_status(server: &MockServer, status: u16, body: &str, hits: u64) {
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(status).set_body_string(body))
        .expect(hits)
        .mount(server)
        .await;
}

/// Gate that never lets anything through.
struct Closed;

impl ProtectionGate for Closed {
    fn try_acquire(&self) -> bool {
        false
    }

    fn on_success(&self) {}

    fn on_failure(&self, _error: &Error) {}
}

#[tokio::test]
async fn test_async_single_value() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/person"))
        .respond_with(ResponseTemplate::new(200).set_body_string(r#"{"name":"John Doe","age":30}"#))
        .mount(&server)
        .await;

    let client = rest_client(&server);
    let spec = RequestSpec::get("person");
    let_assert!(Ok(person) = client.asynchronous().execute::<Person>(spec).await);
    check!(
        person
            == Person {
                name: "John Doe".to_string(),
                age: 30
            }
    );
}

#[tokio::test]
async fn test_blocking_list() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/items"))
        .respond_with(ResponseTemplate::new(200).set_body_string(r#"["item1","item2"]"#))
        .mount(&server)
        .await;

    let client = rest_client(&server);
    let result = tokio::task::spawn_blocking(move || {
        client
            .blocking()
            .execute_list::<String>(RequestSpec::get("items"))
    })
    .await
    .expect("blocking task");

    let_assert!(Ok(items) = result);
    check!(items == ["item1", "item2"]);
}

#[tokio::test]
async fn test_streaming_lines() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/events"))
        .respond_with(ResponseTemplate::new(200).set_body_string("item1\nitem2\nitem3"))
        .mount(&server)
        .await;

    let client = rest_client(&server);
    let stream = client.streaming().execute_with(RequestSpec::get("events"), Text);
    let_assert!(Ok(items) = stream.try_collect::<Vec<_>>().await);
    check!(items == ["item1", "item2", "item3"]);
}

#[tokio::test]
async fn test_streaming_empty_body() {
    let server = MockServer::start().await;
    mount_status(&server, 200, "", 1).await;

    let client = rest_client(&server);
    let items: Vec<_> = client
        .streaming()
        .execute_with(RequestSpec::get("empty"), Text)
        .collect()
        .await;
    check!(items.is_empty());
}

#[tokio::test]
async fn test_streaming_error_status_is_single_element() {
    let server = MockServer::start().await;
    mount_status(&server, 500, "boom", 1).await;

    let client = rest_client(&server);
    let items: Vec<_> = client
        .streaming()
        .execute_with(RequestSpec::get("events"), Text)
        .collect()
        .await;

    let_assert!([Err(err)] = items.as_slice());
    check!(err.status() == Some(500));
    check!(err.body() == "boom");
}

#[tokio::test]
async fn test_default_mapping_keeps_status_and_body() {
    let server = MockServer::start().await;
    mount_status(&server, 404, "Not Found", 1).await;

    let client = rest_client(&server);
    let spec = RequestSpec::get("missing");
    let_assert!(Err(err) = client.asynchronous().execute::<Person>(spec).await);

    check!(err.kind() == FailureKind::Status);
    check!(err.status() == Some(404));
    insta::assert_snapshot!(err.to_string(), @"unexpected error (HTTP 404): Not Found");
}

#[tokio::test]
async fn test_shared_mapping() {
    let server = MockServer::start().await;
    mount_status(&server, 404, "no such user", 1).await;

    let client = api_client(&server);
    let_assert!(
        Err(ApiError::NotFound(body)) = client
            .asynchronous()
            .execute::<Person>(RequestSpec::get("users/7"))
            .await
    );
    check!(body == "no such user");
}

#[tokio::test]
async fn test_local_mapping_wins_over_shared() {
    let server = MockServer::start().await;
    mount_status(&server, 404, "", 1).await;

    let client = api_client(&server);
    let spec = RequestSpec::get("users/7").map_status(404, |_: &FailureDescription| ApiError::Gone);
    let_assert!(Err(ApiError::Gone) = client.asynchronous().execute::<Person>(spec).await);
}

#[tokio::test]
async fn test_unmapped_status_falls_back_to_default() {
    let server = MockServer::start().await;
    mount_status(&server, 503, "busy", 1).await;

    let client = api_client(&server);
    let_assert!(
        Err(ApiError::Other(err)) = client
            .asynchronous()
            .execute::<Person>(RequestSpec::get("users/7"))
            .await
    );
    check!(err.status() == Some(503));
}

#[tokio::test]
async fn test_retry_gives_n_plus_one_attempts() {
    for retries in [0_u32, 1, 3] {
        let server = MockServer::start().await;
        mount_status(&server, 503, "busy", u64::from(retries) + 1).await;

        let client = rest_client(&server);
        let spec = RequestSpec::get("flaky").retry(retries);
        let_assert!(Err(err) = client.asynchronous().execute_with(spec, Text).await);
        check!(err.status() == Some(503));

        server.verify().await;
    }
}

#[tokio::test]
async fn test_decode_failure_is_not_retried() {
    let server = MockServer::start().await;
    mount_status(&server, 200, "not json", 1).await;

    let client = rest_client(&server);
    let spec = RequestSpec::get("person").retry(3);
    let_assert!(Err(err) = client.asynchronous().execute::<Person>(spec).await);

    check!(err.kind() == FailureKind::Decode);
    check!(err.status() == Some(200));
    check!(err.body() == "not json");
}

#[tokio::test]
async fn test_gate_rejection_never_reaches_server() {
    let server = MockServer::start().await;
    mount_status(&server, 200, "ok", 0).await;

    let client: RestClient =
        RestClient::new(http_client(&server), Arc::new(Closed)).expect("client");
    let spec = RequestSpec::get("anything").retry(3);
    let_assert!(Err(err) = client.asynchronous().execute_with(spec, Text).await);

    check!(err.is_rejected());
    check!(err.kind() == FailureKind::Rejected);
}

#[tokio::test]
async fn test_circuit_breaker_opens_after_failures() {
    let server = MockServer::start().await;
    mount_status(&server, 500, "down", 1).await;

    let breaker = Arc::new(CircuitBreaker::new(
        CircuitBreakerConfig::default()
            .with_failure_threshold(1)
            .with_open_duration(Duration::from_secs(60)),
    ));
    let gate: Arc<dyn ProtectionGate> = breaker.clone();
    let client: RestClient = RestClient::new(http_client(&server), gate).expect("client");

    let_assert!(Err(first) = client.asynchronous().execute_with(RequestSpec::get("x"), Text).await);
    check!(first.status() == Some(500));
    check!(breaker.state() == CircuitState::Open);

    // Streaming shares the same gate.
    let items: Vec<_> = client
        .streaming()
        .execute_with(RequestSpec::get("x").retry(3), Text)
        .collect()
        .await;
    let_assert!([Err(second)] = items.as_slice());
    check!(second.is_rejected());
}

#[tokio::test]
async fn test_invalid_request_does_not_open_circuit() {
    let server = MockServer::start().await;
    mount_status(&server, 200, "ok", 1).await;

    let breaker = Arc::new(CircuitBreaker::new(
        CircuitBreakerConfig::default()
            .with_failure_threshold(1)
            .with_open_duration(Duration::from_secs(60)),
    ));
    let gate: Arc<dyn ProtectionGate> = breaker.clone();
    let client: RestClient = RestClient::new(http_client(&server), gate).expect("client");

    let bad = RequestSpec::get("x").header("X-Bad", "line\nbreak");
    let_assert!(Err(err) = client.asynchronous().execute_with(bad, Text).await);
    check!(err.kind() == FailureKind::Invalid);
    check!(breaker.state() == CircuitState::Closed);

    let_assert!(Ok(body) = client.asynchronous().execute_with(RequestSpec::get("x"), Text).await);
    check!(body == "ok");
}

#[tokio::test]
async fn test_debug_shows_pipeline() {
    let server = MockServer::start().await;
    let client = api_client(&server);

    let debug = format!("{client:?}");
    check!(debug.starts_with("RestClient"));
    check!(debug.contains("ExecutionPipeline"));
}

#[tokio::test]
async fn test_timeout_bounds_all_attempts() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(
            ResponseTemplate::new(503).set_delay(Duration::from_millis(150)),
        )
        .mount(&server)
        .await;

    let client = rest_client(&server);
    let spec = RequestSpec::get("slow")
        .timeout(Duration::from_millis(300))
        .retry(3);
    let_assert!(Err(err) = client.asynchronous().execute_with(spec, Text).await);

    check!(err.kind() == FailureKind::Timeout);
    check!(err.is_timeout());
    let requests = server.received_requests().await.expect("recording enabled");
    check!(requests.len() < 4);
}

#[tokio::test]
async fn test_bearer_auth_header() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/protected"))
        .and(header("Authorization", "Bearer my-secret-token"))
        .respond_with(ResponseTemplate::new(200).set_body_string("welcome"))
        .expect(1)
        .mount(&server)
        .await;

    let client = rest_client(&server);
    let spec = RequestSpec::get("protected").bearer_auth("my-secret-token");
    let_assert!(Ok(body) = client.asynchronous().execute_with(spec, Text).await);
    check!(body == "welcome");
}

#[tokio::test]
async fn test_post_json_body() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/people"))
        .and(header("Content-Type", "application/json"))
        .and(wiremock::matchers::body_json(serde_json::json!({"name": "Ann", "age": 41})))
        .respond_with(ResponseTemplate::new(201).set_body_string(r#"{"name":"Ann","age":41}"#))
        .expect(1)
        .mount(&server)
        .await;

    let client = rest_client(&server);
    let spec = RequestSpec::post("people").body(&serde_json::json!({"name": "Ann", "age": 41}));
    let_assert!(Ok(person) = client.asynchronous().execute::<Person>(spec).await);
    check!(person.name == "Ann");
}

#[tokio::test]
async fn test_absolute_url_ignores_base() {
    let server = MockServer::start().await;
    mount_status(&server, 200, "absolute", 1).await;

    let client: RestClient =
        RestClient::new(HyperClient::new(), Arc::new(NoProtection)).expect("client");
    let spec = RequestSpec::get(format!("{}/direct", server.uri()));
    let_assert!(Ok(body) = client.asynchronous().execute_with(spec, Text).await);
    check!(body == "absolute");
}

#[tokio::test]
async fn test_relative_url_without_base_is_invalid() {
    let client: RestClient =
        RestClient::new(HyperClient::new(), Arc::new(NoProtection)).expect("client");
    let spec = RequestSpec::get("/users");
    let_assert!(Err(err) = client.asynchronous().execute_with(spec, Text).await);
    check!(err.kind() == FailureKind::Invalid);
}
