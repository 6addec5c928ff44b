//! Transport-level error type.
//!
//! [`Error`] describes what went wrong while issuing a call. It never reaches
//! callers of the executors directly: the pipeline wraps it into a
//! [`FailureDescription`](crate::FailureDescription) and resolves it through an
//! [`ErrorMapper`](crate::ErrorMapper).

use bytes::Bytes;
use derive_more::{Display, Error, From};
use http::StatusCode;

/// Everything that can fail between a spec and a decoded body.
#[derive(Debug, Display, Error, From)]
pub enum Error {
    /// The server answered with a non-2xx status.
    #[display("HTTP status {status}")]
    #[from(skip)]
    Http {
        /// Status code.
        status: u16,
        /// Body of the error response.
        #[error(not(source))]
        body: Bytes,
    },

    /// No response: refused, reset, DNS, protocol.
    #[display("connection failed: {_0}")]
    #[from(skip)]
    Connection(#[error(not(source))] String),

    /// TLS handshake or certificate failure.
    #[display("TLS failure: {_0}")]
    #[from(skip)]
    Tls(#[error(not(source))] String),

    /// An attempt or the whole execution ran out of time.
    #[display("timed out")]
    #[from(skip)]
    Timeout,

    /// The request could not be built.
    #[display("invalid request: {_0}")]
    #[from(skip)]
    InvalidRequest(#[error(not(source))] String),

    /// The spec URL does not parse.
    #[display("invalid URL: {_0}")]
    #[from]
    InvalidUrl(url::ParseError),

    /// The spec body could not be serialized.
    #[display("cannot serialize body as JSON: {_0}")]
    #[from]
    JsonSerialization(serde_json::Error),

    /// The body is not the expected JSON.
    #[display("invalid JSON at `{path}`: {message}")]
    #[from(skip)]
    JsonDeserialization {
        /// Where decoding stopped, `.` for the root.
        path: String,
        /// What serde reported.
        message: String,
    },

    /// The body could not be decoded by a non-JSON codec.
    #[display("decode error: {_0}")]
    #[from(skip)]
    Decode(#[error(not(source))] String),

    /// The protection gate refused to let the call through.
    #[display("call not permitted: protection gate is open")]
    #[from(skip)]
    CallNotPermitted,

    /// The execution was cancelled before it completed.
    #[display("execution cancelled")]
    #[from(skip)]
    Cancelled,

    /// No runtime was available to drive the execution.
    #[display("runtime error: {_0}")]
    #[from(skip)]
    Runtime(#[error(not(source))] String),
}

/// Shorthand for results carrying [`Error`].
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Non-2xx response with its body.
    #[must_use]
    pub fn http(status: u16, body: impl Into<Bytes>) -> Self {
        Self::Http {
            status,
            body: body.into(),
        }
    }

    /// [`Error::Connection`] with a message.
    #[must_use]
    pub fn connection(message: impl Into<String>) -> Self {
        Self::Connection(message.into())
    }

    /// [`Error::Tls`] with a message.
    #[must_use]
    pub fn tls(message: impl Into<String>) -> Self {
        Self::Tls(message.into())
    }

    /// [`Error::InvalidRequest`] with a message.
    #[must_use]
    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self::InvalidRequest(message.into())
    }

    /// [`Error::JsonDeserialization`] at `path`.
    #[must_use]
    pub fn json_deserialization(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self::JsonDeserialization {
            path: path.into(),
            message: message.into(),
        }
    }

    /// [`Error::Decode`] with a message.
    #[must_use]
    pub fn decode(message: impl Into<String>) -> Self {
        Self::Decode(message.into())
    }

    /// [`Error::Runtime`] with a message.
    #[must_use]
    pub fn runtime(message: impl Into<String>) -> Self {
        Self::Runtime(message.into())
    }

    /// An attempt or the whole execution ran out of time.
    #[must_use]
    pub const fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout)
    }

    /// No response was obtained.
    #[must_use]
    pub const fn is_connection(&self) -> bool {
        matches!(self, Self::Connection(_))
    }

    /// The protection gate rejected the call.
    #[must_use]
    pub const fn is_rejected(&self) -> bool {
        matches!(self, Self::CallNotPermitted)
    }

    /// The body could not be decoded, by any codec.
    #[must_use]
    pub const fn is_decode(&self) -> bool {
        matches!(self, Self::JsonDeserialization { .. } | Self::Decode(_))
    }

    /// Whether another attempt may succeed.
    ///
    /// Transport failures and non-success statuses are retryable; decode
    /// failures, gate rejections and request construction errors are not.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::Http { .. } | Self::Connection(_) | Self::Tls(_) | Self::Timeout
        )
    }

    /// Status of an [`Error::Http`].
    #[must_use]
    pub const fn status(&self) -> Option<u16> {
        if let Self::Http { status, .. } = self {
            Some(*status)
        } else {
            None
        }
    }

    /// A 4xx [`Error::Http`].
    #[must_use]
    pub fn is_client_error(&self) -> bool {
        self.status_code().is_some_and(|code| code.is_client_error())
    }

    /// A 5xx [`Error::Http`].
    #[must_use]
    pub fn is_server_error(&self) -> bool {
        self.status_code().is_some_and(|code| code.is_server_error())
    }

    /// Body of an [`Error::Http`].
    #[must_use]
    pub const fn body(&self) -> Option<&Bytes> {
        if let Self::Http { body, .. } = self {
            Some(body)
        } else {
            None
        }
    }

    fn status_code(&self) -> Option<StatusCode> {
        self.status()
            .and_then(|status| StatusCode::from_u16(status).ok())
    }
}
