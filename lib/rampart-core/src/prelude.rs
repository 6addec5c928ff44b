//! Prelude module for convenient imports.
//!
//! ```
//! use rampart_core::prelude::*;
//! ```

pub use crate::{
    ClientError, Codec, Error, ErrorMapper, FailureDescription, FailureKind, HttpClient,
    HttpClientStreaming, Json, Method, NoProtection, ProtectionGate, RequestSpec, Result, Text,
};
