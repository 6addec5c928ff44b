//! Core types and traits for the rampart resilient HTTP execution layer.
//!
//! This crate is transport-agnostic. It provides:
//! - [`RequestSpec`] - per-call description (method, URL, headers, body,
//!   deadline, retry budget, local error mappings)
//! - [`ErrorMapper`] - shared status-code to caller-error table
//! - [`FailureDescription`], [`FailureKind`] and [`ClientError`] - what error
//!   factories receive and the default error they produce
//! - [`Codec`] with [`Json`] and [`Text`] - response body decoding
//! - [`ProtectionGate`] and [`NoProtection`] - the circuit-breaker contract
//! - [`HttpClient`] and [`HttpClientStreaming`] - the transport contract
//! - [`Request`], [`Response`], [`StreamingResponse`] - transport values
//! - [`Error`] and [`Result`] - transport-level errors

mod body;
mod client;
mod codec;
mod error;
mod error_mapper;
mod failure;
mod gate;
mod method;
pub mod prelude;
mod request;
mod request_spec;
mod response;

pub use body::{ContentType, from_json, to_json};
pub use client::{HttpClient, HttpClientStreaming};
pub use codec::{Codec, Json, Text};
pub use error::{Error, Result};
pub use error_mapper::{ErrorFactory, ErrorMapper, StatusMappings};
pub use failure::{ClientError, FailureDescription, FailureKind};
pub use gate::{NoProtection, ProtectionGate};
pub use method::Method;
pub use request::Request;
pub use request_spec::{DEFAULT_TIMEOUT, RequestSpec, SpecParts};
pub use response::{Response, StreamingBody, StreamingResponse};

// Re-export http crate types for status codes and headers
pub use http::{StatusCode, header};
