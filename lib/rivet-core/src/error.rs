//! Error types for rivet.
//!
//! Errors fall in three families:
//! - configuration errors, raised while resolving a service declaration,
//! - conversion errors, raised while encoding arguments or decoding a body,
//! - transport errors, passed through from the [`crate::HttpClient`].

use std::fmt;

use derive_more::{Display, Error, From};

use crate::{BodyKind, Capability, Method, Target, TypeName, Variant};

// ============================================================================
// Configuration Error
// ============================================================================

/// What went wrong while resolving a service.
#[derive(Debug, Clone, PartialEq, Eq, Display)]
pub enum ConfigErrorKind {
    /// A handler received an annotation of another variant.
    #[display("expected `{expected}` annotation, found `{found}`")]
    WrongAnnotation {
        /// The variant the handler accepts.
        expected: Variant,
        /// The variant it was given.
        found: Variant,
    },

    /// A handler needs an encodable annotation.
    #[display("annotation `{variant}` must be encodable")]
    NotEncodable {
        /// The offending variant.
        variant: Variant,
    },

    /// A handler received a converter lacking the capability it needs.
    #[display("converter must be a {required} converter, {found} found")]
    WrongConverter {
        /// The capability the handler needs.
        required: Capability,
        /// Description of the converter it was given.
        found: &'static str,
    },

    /// No converter factory provides the capability for a type.
    #[display("no {capability} converter available for `{ty}`")]
    MissingConverter {
        /// The declared type.
        ty: TypeName,
        /// The requested capability.
        capability: Capability,
    },

    /// No handler is registered for an annotation variant.
    #[display("no handler registered for annotation `{variant}`")]
    UnknownAnnotation {
        /// The unhandled variant.
        variant: Variant,
    },

    /// Two handlers registered for the same variant.
    #[display("a handler is already registered for annotation `{variant}`")]
    DuplicateHandler {
        /// The contested variant.
        variant: Variant,
    },

    /// An annotation declared where it does not apply.
    #[display("annotation `{variant}` cannot be declared on a {target}")]
    MisplacedAnnotation {
        /// The misplaced variant.
        variant: Variant,
        /// Where it was declared.
        target: Target,
    },

    /// The HTTP method was set twice.
    #[display("HTTP method already set to {existing}, cannot also set {new}")]
    DuplicateHttpMethod {
        /// The method set first.
        existing: Method,
        /// The method set second.
        new: Method,
    },

    /// No HTTP method was set.
    #[display("no HTTP method annotation")]
    MissingHttpMethod,

    /// The path template is empty and no dynamic URL parameter exists.
    #[display("empty path template requires a dynamic URL parameter")]
    EmptyPath,

    /// A dynamic URL parameter combined with a non-empty path template.
    #[display("dynamic URL parameter requires an empty path template, found `{path}`")]
    UrlWithPath {
        /// The declared template.
        path: String,
    },

    /// Two handlers registered at the same parameter index.
    #[display("parameter {index} already has a handler")]
    DuplicateParameter {
        /// The contested index.
        index: usize,
    },

    /// A handler registered past the method arity.
    #[display("parameter index {index} out of range for a method with {arity} parameters")]
    ParameterOutOfRange {
        /// The index.
        index: usize,
        /// Number of declared parameters.
        arity: usize,
    },

    /// A parameter annotation was handled without a parameter index.
    #[display("annotation `{variant}` requires a parameter index")]
    MissingParameterIndex {
        /// The parameter-level variant.
        variant: Variant,
    },

    /// A parameter has no annotation describing its role.
    #[display("parameter {index} has no annotation")]
    MissingParameterHandler {
        /// The unannotated index.
        index: usize,
    },

    /// Mutually exclusive body sources.
    #[display("conflicting request bodies: {first} and {second}")]
    ConflictingBody {
        /// First body kind.
        first: BodyKind,
        /// Second body kind.
        second: BodyKind,
    },

    /// More than one raw body parameter.
    #[display("only one body parameter is allowed")]
    DuplicateBody,

    /// More than one dynamic URL parameter.
    #[display("only one dynamic URL parameter is allowed")]
    DuplicateUrl,

    /// A placeholder without a path parameter.
    #[display("path placeholder `{{{name}}}` has no path parameter")]
    UnresolvedPlaceholder {
        /// The placeholder name.
        name: String,
    },

    /// A path parameter naming no placeholder.
    #[display("path parameter `{name}` does not match any placeholder")]
    UnknownPlaceholder {
        /// The path parameter name.
        name: String,
    },

    /// A placeholder bound by several path parameters.
    #[display("path placeholder `{{{name}}}` is bound more than once")]
    DuplicatePlaceholder {
        /// The placeholder name.
        name: String,
    },

    /// The response converter was set twice.
    #[display("response converter already set")]
    DuplicateResponseConverter,

    /// No response converter was set.
    #[display("no response converter")]
    MissingResponseConverter,

    /// A static header is not `Name: value`.
    #[display("malformed header `{value}`, expected `Name: value`")]
    InvalidHeader {
        /// The raw header line.
        value: String,
    },

    /// No base URL configured.
    #[display("missing base URL")]
    MissingBaseUrl,
}

/// A resolution-time error, with the service, method and parameter it concerns.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigError {
    service: Option<String>,
    method: Option<String>,
    parameter: Option<usize>,
    kind: ConfigErrorKind,
}

impl ConfigError {
    /// Create an error without location.
    #[must_use]
    pub const fn new(kind: ConfigErrorKind) -> Self {
        Self {
            service: None,
            method: None,
            parameter: None,
            kind,
        }
    }

    /// Attach the parameter index, unless one is already set.
    #[must_use]
    pub fn at_parameter(mut self, index: Option<usize>) -> Self {
        self.parameter = self.parameter.or(index);
        self
    }

    /// Attach the service and method names, unless already set.
    #[must_use]
    pub fn in_method(mut self, service: &str, method: &str) -> Self {
        self.service.get_or_insert_with(|| service.to_string());
        self.method.get_or_insert_with(|| method.to_string());
        self
    }

    /// Attach the service name, unless already set.
    #[must_use]
    pub fn in_service(mut self, service: &str) -> Self {
        self.service.get_or_insert_with(|| service.to_string());
        self
    }

    /// What went wrong.
    #[must_use]
    pub const fn kind(&self) -> &ConfigErrorKind {
        &self.kind
    }

    /// The service being resolved.
    #[must_use]
    pub fn service(&self) -> Option<&str> {
        self.service.as_deref()
    }

    /// The method being resolved.
    #[must_use]
    pub fn method(&self) -> Option<&str> {
        self.method.as_deref()
    }

    /// The parameter index, for parameter-level errors.
    #[must_use]
    pub const fn parameter(&self) -> Option<usize> {
        self.parameter
    }
}

impl From<ConfigErrorKind> for ConfigError {
    fn from(kind: ConfigErrorKind) -> Self {
        Self::new(kind)
    }
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (&self.service, &self.method) {
            (Some(service), Some(method)) => write!(f, "{service}::{method}")?,
            (Some(service), None) => write!(f, "{service}")?,
            (None, Some(method)) => write!(f, "{method}")?,
            (None, None) => {}
        }
        if let Some(index) = self.parameter {
            if self.service.is_some() || self.method.is_some() {
                write!(f, " ")?;
            }
            write!(f, "(parameter {index})")?;
        }
        if self.service.is_some() || self.method.is_some() || self.parameter.is_some() {
            write!(f, ": ")?;
        }
        write!(f, "{}", self.kind)
    }
}

impl std::error::Error for ConfigError {}

// ============================================================================
// Error Type
// ============================================================================

/// Main error type for rivet operations.
#[derive(Debug, Display, Error, From)]
pub enum Error {
    /// Invalid service declaration, raised before any request is built.
    #[display("configuration error: {_0}")]
    #[from]
    Configuration(ConfigError),

    /// A converter failed to encode an argument or decode a body.
    #[display("conversion error: {_0}")]
    #[from(skip)]
    Conversion(#[error(not(source))] String),

    /// JSON serialization error.
    #[display("JSON serialization error: {_0}")]
    #[from]
    JsonSerialization(serde_json::Error),

    /// JSON deserialization error with path context.
    #[display("JSON deserialization error at '{path}': {message}")]
    #[from(skip)]
    JsonDeserialization {
        /// JSON path to the error (e.g., "user.address.city").
        path: String,
        /// Error message.
        message: String,
    },

    /// HTTP-level errors (non-2xx status codes).
    #[display("HTTP error {status}: {message}")]
    #[from(skip)]
    Http {
        /// HTTP status code.
        status: u16,
        /// Error message.
        message: String,
        /// Response body, if available.
        #[error(not(source))]
        body: Option<bytes::Bytes>,
    },

    /// Network/connection errors.
    #[display("connection error: {_0}")]
    #[from(skip)]
    Connection(#[error(not(source))] String),

    /// TLS/SSL errors.
    #[display("TLS error: {_0}")]
    #[from(skip)]
    Tls(#[error(not(source))] String),

    /// Request timeout.
    #[display("request timeout")]
    #[from(skip)]
    Timeout,

    /// Invalid request or invocation.
    #[display("invalid request: {_0}")]
    #[from(skip)]
    InvalidRequest(#[error(not(source))] String),

    /// URL parsing error.
    #[display("invalid URL: {_0}")]
    #[from]
    InvalidUrl(url::ParseError),

    /// Writing generated listings to the cache directory failed.
    #[display("cache error: {_0}")]
    #[from]
    Cache(std::io::Error),
}

/// Result type alias using [`crate::Error`].
pub type Result<T> = std::result::Result<T, Error>;

impl From<ConfigErrorKind> for Error {
    fn from(kind: ConfigErrorKind) -> Self {
        Self::Configuration(ConfigError::new(kind))
    }
}

impl Error {
    /// Create an HTTP error with body.
    #[must_use]
    pub fn http_with_body(status: u16, message: impl Into<String>, body: bytes::Bytes) -> Self {
        Self::Http {
            status,
            message: message.into(),
            body: Some(body),
        }
    }

    /// Create a conversion error.
    #[must_use]
    pub fn conversion(message: impl Into<String>) -> Self {
        Self::Conversion(message.into())
    }

    /// Create a connection error.
    #[must_use]
    pub fn connection(message: impl Into<String>) -> Self {
        Self::Connection(message.into())
    }

    /// Create a TLS error.
    #[must_use]
    pub fn tls(message: impl Into<String>) -> Self {
        Self::Tls(message.into())
    }

    /// Create an invalid request error.
    #[must_use]
    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self::InvalidRequest(message.into())
    }

    /// Create a JSON deserialization error with path context.
    #[must_use]
    pub fn json_deserialization(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self::JsonDeserialization {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Returns the configuration error, if this is one.
    #[must_use]
    pub const fn as_configuration(&self) -> Option<&ConfigError> {
        match self {
            Self::Configuration(err) => Some(err),
            _ => None,
        }
    }

    /// Returns `true` for resolution-time errors.
    #[must_use]
    pub const fn is_configuration(&self) -> bool {
        matches!(self, Self::Configuration(_))
    }

    /// Returns `true` if a converter failed.
    #[must_use]
    pub const fn is_conversion(&self) -> bool {
        matches!(
            self,
            Self::Conversion(_) | Self::JsonSerialization(_) | Self::JsonDeserialization { .. }
        )
    }

    /// Returns `true` if this is a timeout error.
    #[must_use]
    pub const fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout)
    }

    /// Returns the HTTP status code if this is an HTTP error.
    #[must_use]
    pub const fn status(&self) -> Option<u16> {
        match self {
            Self::Http { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Returns the response body if this is an HTTP error with a body.
    #[must_use]
    pub fn body(&self) -> Option<&bytes::Bytes> {
        match self {
            Self::Http { body, .. } => body.as_ref(),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_error_display_with_location() {
        let err = ConfigError::new(ConfigErrorKind::DuplicateParameter { index: 1 })
            .at_parameter(Some(1))
            .in_method("UserApi", "get_user");
        assert_eq!(
            err.to_string(),
            "UserApi::get_user (parameter 1): parameter 1 already has a handler"
        );
    }

    #[test]
    fn config_error_display_without_location() {
        let err = ConfigError::new(ConfigErrorKind::MissingHttpMethod);
        assert_eq!(err.to_string(), "no HTTP method annotation");
    }

    #[test]
    fn config_error_keeps_innermost_location() {
        let err = ConfigError::new(ConfigErrorKind::EmptyPath)
            .in_method("Inner", "first")
            .in_method("Outer", "second");
        assert_eq!(err.service(), Some("Inner"));
        assert_eq!(err.method(), Some("first"));
    }

    #[test]
    fn wrong_converter_names_both_capabilities() {
        let kind = ConfigErrorKind::WrongConverter {
            required: Capability::String,
            found: "response body converter",
        };
        assert_eq!(
            kind.to_string(),
            "converter must be a string converter, response body converter found"
        );
    }

    #[test]
    fn error_families() {
        let err = Error::from(ConfigErrorKind::MissingBaseUrl);
        assert!(err.is_configuration());
        assert!(!err.is_conversion());

        assert!(Error::conversion("bad").is_conversion());
        assert!(Error::json_deserialization("a.b", "missing").is_conversion());
        assert!(Error::Timeout.is_timeout());
    }

    #[test]
    fn error_status_and_body() {
        let body = bytes::Bytes::from_static(b"nope");
        let err = Error::http_with_body(404, "Not Found", body.clone());
        assert_eq!(err.status(), Some(404));
        assert_eq!(err.body(), Some(&body));
        assert_eq!(err.to_string(), "HTTP error 404: Not Found");
        assert_eq!(Error::Timeout.status(), None);
    }
}
