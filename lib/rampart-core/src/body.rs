//! Body serialization helpers.

use bytes::Bytes;
use derive_more::Display;

use crate::Result;

/// Content types the crate sets on its own.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display)]
pub enum ContentType {
    /// `application/json`
    #[display("application/json")]
    Json,
    /// `application/x-ndjson`
    #[display("application/x-ndjson")]
    NdJson,
    /// `text/plain; charset=utf-8`
    #[display("text/plain; charset=utf-8")]
    PlainText,
    /// `application/octet-stream`
    #[display("application/octet-stream")]
    OctetStream,
}

impl ContentType {
    /// Header name the content type is sent under.
    pub const HEADER: &'static str = "Content-Type";

    /// MIME type string.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Json => "application/json",
            Self::NdJson => "application/x-ndjson",
            Self::PlainText => "text/plain; charset=utf-8",
            Self::OctetStream => "application/octet-stream",
        }
    }
}

/// Serialize a value to JSON bytes.
///
/// # Errors
///
/// Returns [`Error::JsonSerialization`](crate::Error::JsonSerialization) if the
/// value cannot be represented as JSON (e.g. a map with non-string keys).
///
/// # Example
///
/// ```
/// use rampart_core::to_json;
///
/// #[derive(serde::Serialize)]
/// struct User { name: String }
///
/// let bytes = to_json(&User { name: "Alice".to_string() }).expect("serialize");
/// assert_eq!(bytes.as_ref(), br#"{"name":"Alice"}"#);
/// ```
pub fn to_json<T: serde::Serialize + ?Sized>(value: &T) -> Result<Bytes> {
    Ok(Bytes::from(serde_json::to_vec(value)?))
}

/// Deserialize JSON bytes, reporting the path of the failing field.
///
/// # Errors
///
/// Returns [`Error::JsonDeserialization`](crate::Error::JsonDeserialization)
/// with the path to the offending field (e.g. `address.city`).
///
/// # Example
///
/// ```
/// use rampart_core::from_json;
///
/// #[derive(Debug, PartialEq, serde::Deserialize)]
/// struct User { name: String }
///
/// let user: User = from_json(br#"{"name":"Alice"}"#).expect("deserialize");
/// assert_eq!(user.name, "Alice");
/// ```
pub fn from_json<T: serde::de::DeserializeOwned>(bytes: &[u8]) -> Result<T> {
    let mut deserializer = serde_json::Deserializer::from_slice(bytes);
    serde_path_to_error::deserialize(&mut deserializer).map_err(|err| {
        crate::Error::json_deserialization(err.path().to_string(), err.inner().to_string())
    })
}
