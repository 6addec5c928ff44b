//! Terminal failure descriptions and the default caller error.

use std::fmt;
use std::sync::Arc;

use derive_more::Display;

use crate::Error;

/// Category of a terminal failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display)]
pub enum FailureKind {
    /// Connection, TLS or protocol failure before a response was obtained.
    #[display("transport")]
    Transport,
    /// A response was obtained with a non-success status code.
    #[display("status")]
    Status,
    /// The execution deadline elapsed.
    #[display("timeout")]
    Timeout,
    /// A success response could not be decoded into the target type.
    #[display("decode")]
    Decode,
    /// The protection gate refused the call.
    #[display("rejected")]
    Rejected,
    /// The request could not be built (bad URL, unserializable body, no runtime).
    #[display("invalid")]
    Invalid,
}

impl From<&Error> for FailureKind {
    fn from(error: &Error) -> Self {
        match error {
            Error::Http { .. } => Self::Status,
            Error::Connection(_) | Error::Tls(_) | Error::Cancelled => Self::Transport,
            Error::Timeout => Self::Timeout,
            Error::JsonDeserialization { .. } | Error::Decode(_) => Self::Decode,
            Error::CallNotPermitted => Self::Rejected,
            Error::InvalidRequest(_)
            | Error::InvalidUrl(_)
            | Error::JsonSerialization(_)
            | Error::Runtime(_) => Self::Invalid,
        }
    }
}

/// What an error factory receives: status code, body text and the cause.
#[derive(Debug, Clone)]
pub struct FailureDescription {
    kind: FailureKind,
    status: Option<u16>,
    body: String,
    cause: Arc<Error>,
}

impl FailureDescription {
    /// Describe a decode failure on an otherwise successful response.
    ///
    /// The raw body is kept as text for diagnostics.
    #[must_use]
    pub fn decoding(status: u16, body: &[u8], cause: Error) -> Self {
        Self {
            kind: FailureKind::Decode,
            status: Some(status),
            body: String::from_utf8_lossy(body).into_owned(),
            cause: Arc::new(cause),
        }
    }

    /// Failure category.
    #[must_use]
    pub const fn kind(&self) -> FailureKind {
        self.kind
    }

    /// HTTP status code, when a response was obtained.
    #[must_use]
    pub const fn status(&self) -> Option<u16> {
        self.status
    }

    /// Response body as text, empty when unavailable.
    #[must_use]
    pub fn body(&self) -> &str {
        &self.body
    }

    /// The originating error.
    #[must_use]
    pub fn cause(&self) -> &Error {
        &self.cause
    }

    /// Status code used for status-keyed mapping lookups.
    ///
    /// Only [`FailureKind::Status`] failures are looked up by code; every
    /// other kind resolves through the default factory.
    #[must_use]
    pub const fn lookup_status(&self) -> Option<u16> {
        match self.kind {
            FailureKind::Status => self.status,
            _ => None,
        }
    }
}

impl From<Error> for FailureDescription {
    fn from(error: Error) -> Self {
        let kind = FailureKind::from(&error);
        let status = error.status();
        let body = error
            .body()
            .map(|body| String::from_utf8_lossy(body).into_owned())
            .unwrap_or_default();
        Self {
            kind,
            status,
            body,
            cause: Arc::new(error),
        }
    }
}

impl fmt::Display for FailureDescription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.status {
            Some(status) => write!(f, "{} failure (HTTP {status}): {}", self.kind, self.cause),
            None => write!(f, "{} failure: {}", self.kind, self.cause),
        }
    }
}

/// Generic caller error produced by the default mapping.
///
/// Keeps the failure kind, the status code, the literal response body and the
/// originating [`Error`] as its source.
#[derive(Debug, Clone, derive_more::Error)]
pub struct ClientError {
    kind: FailureKind,
    status: Option<u16>,
    body: String,
    #[error(source)]
    cause: Arc<Error>,
}

impl ClientError {
    /// Failure category.
    #[must_use]
    pub const fn kind(&self) -> FailureKind {
        self.kind
    }

    /// HTTP status code, if a response was obtained.
    #[must_use]
    pub const fn status(&self) -> Option<u16> {
        self.status
    }

    /// Response body text, empty when unavailable.
    #[must_use]
    pub fn body(&self) -> &str {
        &self.body
    }

    /// The originating error.
    #[must_use]
    pub fn cause(&self) -> &Error {
        &self.cause
    }

    /// Returns `true` if the protection gate refused the call.
    #[must_use]
    pub fn is_rejected(&self) -> bool {
        self.kind == FailureKind::Rejected
    }

    /// Returns `true` if the execution deadline elapsed.
    #[must_use]
    pub fn is_timeout(&self) -> bool {
        self.kind == FailureKind::Timeout
    }

    /// Try to decode the body text as JSON.
    ///
    /// Returns `None` when there is no body.
    pub fn decode_body<T: serde::de::DeserializeOwned>(&self) -> Option<crate::Result<T>> {
        (!self.body.is_empty()).then(|| crate::from_json(self.body.as_bytes()))
    }
}

impl From<&FailureDescription> for ClientError {
    fn from(failure: &FailureDescription) -> Self {
        Self {
            kind: failure.kind,
            status: failure.status,
            body: failure.body.clone(),
            cause: Arc::clone(&failure.cause),
        }
    }
}

impl From<FailureDescription> for ClientError {
    fn from(failure: FailureDescription) -> Self {
        Self {
            kind: failure.kind,
            status: failure.status,
            body: failure.body,
            cause: failure.cause,
        }
    }
}

impl fmt::Display for ClientError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.kind, self.status) {
            (FailureKind::Rejected, _) => write!(f, "{}", self.cause),
            (FailureKind::Timeout, _) => write!(f, "request timed out"),
            (FailureKind::Decode, Some(status)) => write!(
                f,
                "unable to decode response (HTTP {status}): {}: {}",
                self.cause, self.body
            ),
            (_, Some(status)) => write!(f, "unexpected error (HTTP {status}): {}", self.body),
            (_, None) => write!(f, "unexpected error: {}", self.cause),
        }
    }
}
