//! Body kinds, percent-encoding and JSON helpers.

use bytes::Bytes;
use percent_encoding::{AsciiSet, CONTROLS, NON_ALPHANUMERIC, utf8_percent_encode};

use crate::Result;

/// Content type for request bodies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ContentType {
    /// JSON content type (`application/json`).
    Json,
    /// Form URL-encoded content type (`application/x-www-form-urlencoded`).
    FormUrlEncoded,
    /// Plain text content type (`text/plain`).
    PlainText,
    /// Binary content type (`application/octet-stream`).
    OctetStream,
}

impl ContentType {
    /// Get the MIME type string.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Json => "application/json",
            Self::FormUrlEncoded => "application/x-www-form-urlencoded",
            Self::PlainText => "text/plain; charset=utf-8",
            Self::OctetStream => "application/octet-stream",
        }
    }
}

impl std::fmt::Display for ContentType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// How a method's request body is produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, derive_more::Display)]
pub enum BodyKind {
    /// A single argument converted by a request body converter.
    #[display("raw body")]
    Raw,
    /// Form fields, sent as `application/x-www-form-urlencoded`.
    #[display("form-url-encoded body")]
    FormUrlEncoded,
    /// Parts, sent as `multipart/form-data`.
    #[display("multipart body")]
    Multipart,
}

/// RFC 3986 unreserved characters are kept, everything else is encoded.
const COMPONENT_ENCODE_SET: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'.')
    .remove(b'_')
    .remove(b'~');

/// Path segment encoding: sub-delimiters are kept, `/` is encoded.
const PATH_SEGMENT_ENCODE_SET: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'<')
    .add(b'>')
    .add(b'`')
    .add(b'?')
    .add(b'{')
    .add(b'}')
    .add(b'/')
    .add(b'\\')
    .add(b'%');

/// Percent-encode a query or form component (space becomes `%20`).
///
/// # Example
///
/// ```
/// use rivet_core::encode_component;
///
/// assert_eq!(encode_component("1 2&3"), "1%202%263");
/// ```
#[must_use]
pub fn encode_component(value: &str) -> String {
    utf8_percent_encode(value, COMPONENT_ENCODE_SET).to_string()
}

/// Percent-encode a single path segment.
///
/// # Example
///
/// ```
/// use rivet_core::encode_path_segment;
///
/// assert_eq!(encode_path_segment("a b/c"), "a%20b%2Fc");
/// ```
#[must_use]
pub fn encode_path_segment(value: &str) -> String {
    utf8_percent_encode(value, PATH_SEGMENT_ENCODE_SET).to_string()
}

/// Serialize a value to JSON bytes.
///
/// # Errors
///
/// Returns an error if JSON serialization fails.
pub fn to_json<T: serde::Serialize + ?Sized>(value: &T) -> Result<Bytes> {
    serde_json::to_vec(value)
        .map(Bytes::from)
        .map_err(Into::into)
}

/// Convert a call argument to the dynamic value parameter handlers consume.
///
/// # Errors
///
/// Returns an error if the value cannot be represented as JSON.
pub fn to_argument<T: serde::Serialize + ?Sized>(value: &T) -> Result<serde_json::Value> {
    serde_json::to_value(value).map_err(Into::into)
}

/// Deserialize JSON bytes to a value with path-aware error messages.
///
/// # Errors
///
/// Returns an error if JSON deserialization fails, with the error message
/// including the path to the problematic field (e.g., "user.address.city").
pub fn from_json<T: serde::de::DeserializeOwned>(bytes: &[u8]) -> Result<T> {
    let mut deserializer = serde_json::Deserializer::from_slice(bytes);
    serde_path_to_error::deserialize(&mut deserializer).map_err(|e| {
        crate::Error::json_deserialization(e.path().to_string(), e.inner().to_string())
    })
}

/// Deserialize an already decoded JSON value with path-aware error messages.
///
/// # Errors
///
/// Returns an error if the value does not match `T`.
pub fn from_value<T: serde::de::DeserializeOwned>(value: serde_json::Value) -> Result<T> {
    serde_path_to_error::deserialize(value).map_err(|e| {
        crate::Error::json_deserialization(e.path().to_string(), e.inner().to_string())
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn content_type_as_str() {
        assert_eq!(ContentType::Json.as_str(), "application/json");
        assert_eq!(
            ContentType::FormUrlEncoded.to_string(),
            "application/x-www-form-urlencoded"
        );
    }

    #[test]
    fn body_kind_display() {
        assert_eq!(BodyKind::Raw.to_string(), "raw body");
        assert_eq!(BodyKind::Multipart.to_string(), "multipart body");
    }

    #[test]
    fn encode_component_keeps_unreserved() {
        assert_eq!(encode_component("a-b_c.d~e"), "a-b_c.d~e");
        assert_eq!(encode_component("1 2"), "1%202");
        assert_eq!(encode_component("x=y&z"), "x%3Dy%26z");
        assert_eq!(encode_component("é"), "%C3%A9");
    }

    #[test]
    fn encode_path_segment_encodes_slash() {
        assert_eq!(encode_path_segment("hello world"), "hello%20world");
        assert_eq!(encode_path_segment("a/b"), "a%2Fb");
        assert_eq!(encode_path_segment("a&b=c"), "a&b=c");
    }

    #[test]
    fn from_value_reports_path() {
        #[derive(Debug, serde::Deserialize)]
        struct Address {
            #[allow(dead_code)]
            city: String,
        }

        #[derive(Debug, serde::Deserialize)]
        struct User {
            #[allow(dead_code)]
            address: Address,
        }

        let err = from_value::<User>(serde_json::json!({"address": {}})).expect_err("should fail");
        let msg = err.to_string();
        assert!(msg.contains("address"), "missing path in: {msg}");
        assert!(msg.contains("city"), "missing field in: {msg}");
    }

    #[test]
    fn from_json_roundtrip_through_bytes() {
        let bytes = to_json(&serde_json::json!({"id": 42})).expect("serialize");
        let value: serde_json::Value = from_json(&bytes).expect("deserialize");
        assert_eq!(value["id"], 42);
    }
}
