//! Resilient HTTP request execution.
//!
//! Describe a call with a [`RequestSpec`], then run it through a
//! [`RestClient`] in one of three roles: blocking, deferred or streaming.
//! Every role applies the same policies:
//!
//! - a shared [`ProtectionGate`] (such as [`middleware::CircuitBreaker`]) that
//!   can reject calls before anything is sent;
//! - one timeout bounding the whole attempt sequence;
//! - immediate retries up to the spec's budget;
//! - mapping of every terminal failure to a caller error type through the
//!   spec's own mappings, then the shared [`ErrorMapper`].
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use std::time::Duration;
//!
//! use rampart::prelude::*;
//!
//! #[derive(Debug, Deserialize)]
//! struct User {
//!     id: u64,
//!     name: String,
//! }
//!
//! # async fn run() -> std::result::Result<(), Box<dyn std::error::Error>> {
//! let breaker = Arc::new(CircuitBreaker::default());
//! let client: RestClient = RestClient::new(HyperClient::new(), breaker)?;
//!
//! let spec = RequestSpec::get("https://api.example.com/users")
//!     .bearer_auth("token")
//!     .timeout(Duration::from_secs(2))
//!     .retry(1);
//! let users: Vec<User> = client.asynchronous().execute(spec).await?;
//! # Ok(())
//! # }
//! ```

mod client;
mod config;
mod connector;
pub mod executor;
mod framing;
pub mod middleware;
mod pipeline;
pub mod prelude;
mod rest_client;
mod transport;

pub use client::{HyperClient, HyperClientBuilder};
pub use config::{ClientConfig, ClientConfigBuilder, DEFAULT_USER_AGENT};
pub use pipeline::{ExecutionPipeline, ResponseStream};
pub use rest_client::RestClient;
pub use transport::{StreamingTransport, Transport};

// Re-export tower for middleware composition
pub use tower;

// Re-export core types
pub use rampart_core::{
    ClientError, Codec, ContentType, DEFAULT_TIMEOUT, Error, ErrorFactory, ErrorMapper,
    FailureDescription, FailureKind, HttpClient, HttpClientStreaming, Json, Method, NoProtection,
    ProtectionGate, Request, RequestSpec, Response, Result, SpecParts, StatusMappings,
    StreamingBody, StreamingResponse, Text, from_json, to_json,
};

// Re-export http types for status codes and headers
pub use rampart_core::{StatusCode, header};

pub use url;
