//! Prelude module for convenient imports.
//!
//! ```
//! use rampart::prelude::*;
//! ```

pub use crate::executor::{AsyncExecutor, BlockingExecutor, Deferred, StreamingExecutor};
pub use crate::middleware::{CircuitBreaker, CircuitBreakerConfig};
pub use crate::{
    ClientConfig, ClientError, Codec, Error, ErrorMapper, FailureDescription, FailureKind,
    HttpClient, HyperClient, Json, Method, NoProtection, ProtectionGate, RequestSpec,
    ResponseStream, RestClient, Result, StatusCode, Text,
};
pub use serde::{Deserialize, Serialize};
