//! Pluggable value converters.
//!
//! A [`Converter`] has exactly one [`Capability`]:
//! - string conversion, for path, query, header and form values,
//! - request body conversion, for raw bodies and multipart parts,
//! - response body conversion, for decoding responses.
//!
//! Converters are looked up in a [`ConverterRegistry`] by the declared
//! [`TypeName`] and the capability an annotation requires. Registered
//! [`ConverterFactory`]s are consulted in order, then the built-in
//! [`JsonConverterFactory`].

use std::fmt;
use std::sync::Arc;

use bytes::Bytes;
use derive_more::Display;
use serde_json::Value;

use crate::{ConfigError, ConfigErrorKind, ContentType, Error, Result};

// ============================================================================
// Type names & capabilities
// ============================================================================

/// A declared Rust type, as written in the service declaration.
///
/// Whitespace is stripped so `Vec < User >` and `Vec<User>` are the same key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Display)]
#[display("{_0}")]
pub struct TypeName(String);

impl TypeName {
    /// Create a normalized type name.
    #[must_use]
    pub fn new(name: impl AsRef<str>) -> Self {
        Self(name.as_ref().split_whitespace().collect())
    }

    /// The normalized type name.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The unit type, used for methods without a response payload.
    #[must_use]
    pub fn unit() -> Self {
        Self::new("()")
    }
}

impl From<&str> for TypeName {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

/// What a converter can do.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display)]
pub enum Capability {
    /// Value to string.
    #[display("string")]
    String,
    /// Value to request body.
    #[display("request body")]
    RequestBody,
    /// Response body to value.
    #[display("response body")]
    ResponseBody,
}

// ============================================================================
// Converter traits
// ============================================================================

/// An encoded request body together with its content type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestBody {
    content_type: String,
    bytes: Bytes,
}

impl RequestBody {
    /// Create a request body.
    #[must_use]
    pub fn new(content_type: impl Into<String>, bytes: impl Into<Bytes>) -> Self {
        Self {
            content_type: content_type.into(),
            bytes: bytes.into(),
        }
    }

    /// The `Content-Type` of the body.
    #[must_use]
    pub fn content_type(&self) -> &str {
        &self.content_type
    }

    /// The encoded bytes.
    #[must_use]
    pub const fn bytes(&self) -> &Bytes {
        &self.bytes
    }

    /// Consume into (content type, bytes).
    #[must_use]
    pub fn into_parts(self) -> (String, Bytes) {
        (self.content_type, self.bytes)
    }
}

/// Converts an argument to its string form.
pub trait StringConverter: fmt::Debug + Send + Sync {
    /// Convert the value.
    ///
    /// # Errors
    ///
    /// Returns a conversion error if the value has no string form.
    fn convert(&self, value: &Value) -> Result<String>;
}

/// Converts an argument to a request body.
pub trait RequestBodyConverter: fmt::Debug + Send + Sync {
    /// Convert the value.
    ///
    /// # Errors
    ///
    /// Returns a conversion error if serialization fails.
    fn convert(&self, value: &Value) -> Result<RequestBody>;
}

/// Converts a response body to a value of the target type.
pub trait ResponseBodyConverter: fmt::Debug + Send + Sync {
    /// Convert the raw body.
    ///
    /// # Errors
    ///
    /// Returns a conversion error if the body cannot be decoded.
    fn convert(&self, body: &Bytes, target: &TypeName) -> Result<Value>;
}

/// A converter with a single capability.
#[derive(Debug, Clone)]
pub enum Converter {
    /// String conversion.
    String(Arc<dyn StringConverter>),
    /// Request body conversion.
    RequestBody(Arc<dyn RequestBodyConverter>),
    /// Response body conversion.
    ResponseBody(Arc<dyn ResponseBodyConverter>),
}

impl Converter {
    /// The capability of this converter.
    #[must_use]
    pub const fn capability(&self) -> Capability {
        match self {
            Self::String(_) => Capability::String,
            Self::RequestBody(_) => Capability::RequestBody,
            Self::ResponseBody(_) => Capability::ResponseBody,
        }
    }

    /// Human-readable description of an optional converter, for error messages.
    #[must_use]
    pub const fn describe(converter: Option<&Self>) -> &'static str {
        match converter {
            Some(Self::String(_)) => "string converter",
            Some(Self::RequestBody(_)) => "request body converter",
            Some(Self::ResponseBody(_)) => "response body converter",
            None => "no converter",
        }
    }

    /// The string converter, if that is this converter's capability.
    #[must_use]
    pub fn as_string(&self) -> Option<&Arc<dyn StringConverter>> {
        match self {
            Self::String(converter) => Some(converter),
            _ => None,
        }
    }

    /// The request body converter, if that is this converter's capability.
    #[must_use]
    pub fn as_request_body(&self) -> Option<&Arc<dyn RequestBodyConverter>> {
        match self {
            Self::RequestBody(converter) => Some(converter),
            _ => None,
        }
    }

    /// The response body converter, if that is this converter's capability.
    #[must_use]
    pub fn as_response_body(&self) -> Option<&Arc<dyn ResponseBodyConverter>> {
        match self {
            Self::ResponseBody(converter) => Some(converter),
            _ => None,
        }
    }
}

// ============================================================================
// Factories & registry
// ============================================================================

/// Provides converters for the types it knows about.
///
/// Every method defaults to `None`, so a factory only implements the
/// capabilities it supports.
pub trait ConverterFactory: fmt::Debug + Send + Sync {
    /// A string converter for `ty`.
    fn string_converter(&self, _ty: &TypeName) -> Option<Arc<dyn StringConverter>> {
        None
    }

    /// A request body converter for `ty`.
    fn request_body_converter(&self, _ty: &TypeName) -> Option<Arc<dyn RequestBodyConverter>> {
        None
    }

    /// A response body converter for `ty`.
    fn response_body_converter(&self, _ty: &TypeName) -> Option<Arc<dyn ResponseBodyConverter>> {
        None
    }
}

/// Ordered set of converter factories.
#[derive(Debug, Clone)]
pub struct ConverterRegistry {
    factories: Vec<Arc<dyn ConverterFactory>>,
    fallback: Option<Arc<dyn ConverterFactory>>,
}

impl Default for ConverterRegistry {
    fn default() -> Self {
        Self {
            factories: Vec::new(),
            fallback: Some(Arc::new(JsonConverterFactory)),
        }
    }
}

impl ConverterRegistry {
    /// A registry with the built-in JSON fallback.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry without any factory, not even the JSON fallback.
    #[must_use]
    pub fn empty() -> Self {
        Self {
            factories: Vec::new(),
            fallback: None,
        }
    }

    /// Add a factory, consulted before previously added ones' fallback.
    #[must_use]
    pub fn with_factory(mut self, factory: impl ConverterFactory + 'static) -> Self {
        self.factories.push(Arc::new(factory));
        self
    }

    /// Add a shared factory.
    pub fn add_factory(&mut self, factory: Arc<dyn ConverterFactory>) {
        self.factories.push(factory);
    }

    /// Find a converter for `ty` with the given capability.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigErrorKind::MissingConverter`] if no factory provides one.
    pub fn resolve(
        &self,
        ty: &TypeName,
        capability: Capability,
    ) -> std::result::Result<Converter, ConfigError> {
        self.factories
            .iter()
            .chain(self.fallback.iter())
            .find_map(|factory| match capability {
                Capability::String => factory.string_converter(ty).map(Converter::String),
                Capability::RequestBody => factory
                    .request_body_converter(ty)
                    .map(Converter::RequestBody),
                Capability::ResponseBody => factory
                    .response_body_converter(ty)
                    .map(Converter::ResponseBody),
            })
            .ok_or_else(|| {
                ConfigError::new(ConfigErrorKind::MissingConverter {
                    ty: ty.clone(),
                    capability,
                })
            })
    }
}

// ============================================================================
// Built-in converters
// ============================================================================

/// Strings as-is, numbers and booleans in their usual form, compound values as JSON.
#[derive(Debug, Clone, Copy, Default)]
pub struct ScalarStringConverter;

impl StringConverter for ScalarStringConverter {
    fn convert(&self, value: &Value) -> Result<String> {
        match value {
            Value::String(s) => Ok(s.clone()),
            Value::Number(n) => Ok(n.to_string()),
            Value::Bool(b) => Ok(b.to_string()),
            Value::Null => Ok(String::new()),
            Value::Array(_) | Value::Object(_) => {
                serde_json::to_string(value).map_err(Error::from)
            }
        }
    }
}

/// JSON request and response bodies.
///
/// An empty response body decodes to `null`, so `()` return types work
/// with `204 No Content`.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonConverter;

impl RequestBodyConverter for JsonConverter {
    fn convert(&self, value: &Value) -> Result<RequestBody> {
        let bytes = crate::to_json(value)?;
        Ok(RequestBody::new(ContentType::Json.as_str(), bytes))
    }
}

impl ResponseBodyConverter for JsonConverter {
    fn convert(&self, body: &Bytes, _target: &TypeName) -> Result<Value> {
        if body.iter().all(u8::is_ascii_whitespace) {
            return Ok(Value::Null);
        }
        crate::from_json(body)
    }
}

/// Plain text bodies, for `String` payloads.
#[derive(Debug, Clone, Copy, Default)]
pub struct TextConverter;

impl RequestBodyConverter for TextConverter {
    fn convert(&self, value: &Value) -> Result<RequestBody> {
        let text = ScalarStringConverter.convert(value)?;
        Ok(RequestBody::new(ContentType::PlainText.as_str(), text))
    }
}

impl ResponseBodyConverter for TextConverter {
    fn convert(&self, body: &Bytes, target: &TypeName) -> Result<Value> {
        String::from_utf8(body.to_vec())
            .map(Value::String)
            .map_err(|e| Error::conversion(format!("`{target}` body is not UTF-8: {e}")))
    }
}

/// The fallback factory: scalar strings and JSON bodies for every type.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonConverterFactory;

impl ConverterFactory for JsonConverterFactory {
    fn string_converter(&self, _ty: &TypeName) -> Option<Arc<dyn StringConverter>> {
        Some(Arc::new(ScalarStringConverter))
    }

    fn request_body_converter(&self, _ty: &TypeName) -> Option<Arc<dyn RequestBodyConverter>> {
        Some(Arc::new(JsonConverter))
    }

    fn response_body_converter(&self, _ty: &TypeName) -> Option<Arc<dyn ResponseBodyConverter>> {
        Some(Arc::new(JsonConverter))
    }
}

/// Sends and receives `String` and `&str` values as `text/plain`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TextConverterFactory;

impl TextConverterFactory {
    fn is_text(ty: &TypeName) -> bool {
        matches!(ty.as_str(), "String" | "&str" | "&'staticstr")
    }
}

impl ConverterFactory for TextConverterFactory {
    fn request_body_converter(&self, ty: &TypeName) -> Option<Arc<dyn RequestBodyConverter>> {
        Self::is_text(ty).then(|| Arc::new(TextConverter) as Arc<dyn RequestBodyConverter>)
    }

    fn response_body_converter(&self, ty: &TypeName) -> Option<Arc<dyn ResponseBodyConverter>> {
        Self::is_text(ty).then(|| Arc::new(TextConverter) as Arc<dyn ResponseBodyConverter>)
    }
}

#[cfg(test)]
mod tests {
    use assert2::{check, let_assert};
    use serde_json::json;

    use super::*;

    #[test]
    fn type_name_strips_whitespace() {
        check!(TypeName::new("Vec < User >") == TypeName::new("Vec<User>"));
        check!(TypeName::new("BTreeMap<String, u32>").as_str() == "BTreeMap<String,u32>");
    }

    #[test]
    fn scalar_string_converter() {
        let converter = ScalarStringConverter;
        check!(converter.convert(&json!("a b")).expect("string") == "a b");
        check!(converter.convert(&json!(42)).expect("number") == "42");
        check!(converter.convert(&json!(true)).expect("bool") == "true");
        check!(converter.convert(&json!([1, 2])).expect("array") == "[1,2]");
    }

    #[test]
    fn json_converter_body() {
        let body = RequestBodyConverter::convert(&JsonConverter, &json!({"name": "Alice"}))
            .expect("encode");
        check!(body.content_type() == "application/json");
        check!(body.bytes().as_ref() == br#"{"name":"Alice"}"#);
    }

    #[test]
    fn json_converter_empty_response_is_null() {
        let value = ResponseBodyConverter::convert(&JsonConverter, &Bytes::new(), &TypeName::unit())
            .expect("decode");
        check!(value == Value::Null);
    }

    #[test]
    fn text_converter_rejects_invalid_utf8() {
        let body = Bytes::from_static(&[0xFF, 0xFE]);
        let result = ResponseBodyConverter::convert(&TextConverter, &body, &TypeName::new("String"));
        let_assert!(Err(err) = result);
        check!(err.is_conversion());
    }

    #[test]
    fn registry_falls_back_to_json() {
        let registry = ConverterRegistry::new();
        let converter = registry
            .resolve(&TypeName::new("User"), Capability::ResponseBody)
            .expect("resolve");
        check!(converter.capability() == Capability::ResponseBody);
    }

    #[test]
    fn registry_consults_factories_first() {
        let registry = ConverterRegistry::new().with_factory(TextConverterFactory);
        let converter = registry
            .resolve(&TypeName::new("String"), Capability::ResponseBody)
            .expect("resolve");
        let_assert!(Some(text) = converter.as_response_body());
        let value = text
            .convert(&Bytes::from_static(b"plain"), &TypeName::new("String"))
            .expect("decode");
        check!(value == json!("plain"));
    }

    #[test]
    fn empty_registry_reports_missing_converter() {
        let err = ConverterRegistry::empty()
            .resolve(&TypeName::new("u64"), Capability::String)
            .expect_err("no factory");
        check!(
            err.kind()
                == &ConfigErrorKind::MissingConverter {
                    ty: TypeName::new("u64"),
                    capability: Capability::String,
                }
        );
    }

    #[test]
    fn describe_names_capability() {
        let converter = Converter::ResponseBody(Arc::new(JsonConverter));
        check!(Converter::describe(Some(&converter)) == "response body converter");
        check!(Converter::describe(None) == "no converter");
    }
}
