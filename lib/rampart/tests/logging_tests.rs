//! Attempt logging as seen by a subscriber.

use std::io;
use std::sync::{Arc, Mutex, PoisonError};

use assert2::{check, let_assert};
use rampart::{HyperClient, NoProtection, RequestSpec, RestClient, Text};
use tracing::Level;
use wiremock::{Mock, MockServer, ResponseTemplate, matchers::method};

/// Writer appending formatted events to a shared buffer.
#[derive(Clone, Default)]
struct Captured(Arc<Mutex<Vec<u8>>>);

impl Captured {
    fn lines(&self) -> Vec<String> {
        let buffer = self.0.lock().unwrap_or_else(PoisonError::into_inner);
        String::from_utf8_lossy(&buffer)
            .lines()
            .map(str::to_string)
            .collect()
    }
}

impl io::Write for Captured {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

fn subscriber(writer: Captured) -> impl tracing::Subscriber + Send + Sync {
    tracing_subscriber::fmt()
        .with_max_level(Level::INFO)
        .with_ansi(false)
        .with_writer(move || writer.clone())
        .finish()
}

fn rest_client(server: &MockServer) -> RestClient {
    let http = HyperClient::builder()
        .base_url(format!("{}/", server.uri()).parse().expect("base url"))
        .build();
    RestClient::new(http, Arc::new(NoProtection)).expect("client")
}

#[tokio::test]
async fn test_every_attempt_is_logged() {
    let captured = Captured::default();
    let _guard = tracing::subscriber::set_default(subscriber(captured.clone()));

    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(503).set_body_string("busy"))
        .expect(3)
        .mount(&server)
        .await;

    let client = rest_client(&server);
    let spec = RequestSpec::get("flaky").retry(2);
    let_assert!(Err(err) = client.asynchronous().execute_with(spec, Text).await);
    check!(err.status() == Some(503));

    let url = format!("{}/flaky", server.uri());
    let lines = captured.lines();
    let sent: Vec<_> = lines
        .iter()
        .filter(|line| line.contains("sending request"))
        .collect();
    let failed: Vec<_> = lines
        .iter()
        .filter(|line| line.contains("request failed"))
        .collect();

    check!(sent.len() == 3);
    check!(failed.len() == 3);
    check!(sent.iter().chain(&failed).all(|line| line.contains(&url)));
    check!(failed.iter().all(|line| line.contains("HTTP status 503")));
    check!(!lines.iter().any(|line| line.contains("request succeeded")));
}

#[tokio::test]
async fn test_success_is_logged_once() {
    let captured = Captured::default();
    let _guard = tracing::subscriber::set_default(subscriber(captured.clone()));

    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_string("ok"))
        .mount(&server)
        .await;

    let client = rest_client(&server);
    let spec = RequestSpec::get("fine").retry(2);
    let_assert!(Ok(body) = client.asynchronous().execute_with(spec, Text).await);
    check!(body == "ok");

    let lines = captured.lines();
    check!(lines.iter().filter(|line| line.contains("sending request")).count() == 1);
    check!(lines.iter().filter(|line| line.contains("request succeeded")).count() == 1);
    check!(!lines.iter().any(|line| line.contains("request failed")));
}
