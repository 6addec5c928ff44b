//! Response body decoding.
//!
//! A [`Codec`] turns raw response bytes into the caller's target type, either
//! as a single value or as an ordered list. The streaming role frames the body
//! on newlines and decodes each non-empty frame with [`Codec::decode`].

use serde::de::DeserializeOwned;

use crate::{Error, Result, from_json};

/// Decodes response bodies into `T`.
pub trait Codec<T>: Send + Sync + 'static {
    /// Decode a whole body (or one stream frame) into a single value.
    ///
    /// # Errors
    ///
    /// Returns a decode error if the bytes are not a valid `T`.
    fn decode(&self, body: &[u8]) -> Result<T>;

    /// Decode a whole body into an ordered list of values.
    ///
    /// # Errors
    ///
    /// Returns a decode error if the bytes are not a valid list of `T`.
    fn decode_seq(&self, body: &[u8]) -> Result<Vec<T>>;
}

/// JSON codec backed by `serde_json`.
///
/// An empty (or whitespace-only) body decodes as JSON `null`, so `Option<T>`
/// and `()` targets accept it. In list mode an empty body is an empty list.
#[derive(Debug, Clone, Copy, Default)]
pub struct Json;

impl<T> Codec<T> for Json
where
    T: DeserializeOwned + Send + 'static,
{
    fn decode(&self, body: &[u8]) -> Result<T> {
        if is_blank(body) {
            from_json(b"null")
        } else {
            from_json(body)
        }
    }

    fn decode_seq(&self, body: &[u8]) -> Result<Vec<T>> {
        if is_blank(body) {
            Ok(Vec::new())
        } else {
            from_json(body)
        }
    }
}

/// UTF-8 text codec.
///
/// In list mode every non-empty line is one element.
#[derive(Debug, Clone, Copy, Default)]
pub struct Text;

impl Codec<String> for Text {
    fn decode(&self, body: &[u8]) -> Result<String> {
        utf8(body).map(str::to_owned)
    }

    fn decode_seq(&self, body: &[u8]) -> Result<Vec<String>> {
        Ok(utf8(body)?
            .lines()
            .filter(|line| !line.is_empty())
            .map(str::to_owned)
            .collect())
    }
}

fn utf8(body: &[u8]) -> Result<&str> {
    std::str::from_utf8(body).map_err(|err| Error::decode(format!("invalid UTF-8: {err}")))
}

fn is_blank(body: &[u8]) -> bool {
    body.iter().all(u8::is_ascii_whitespace)
}
