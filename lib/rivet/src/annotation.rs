//! Built-in annotations.
//!
//! Method-level: [`Http`] (one variant per verb), [`Headers`], [`Async`].
//! Parameter-level: [`Path`], [`Url`], [`Query`], [`QueryMap`], [`QueryName`],
//! [`Header`], [`HeaderMap`], [`Field`], [`FieldMap`], [`Part`], [`PartMap`],
//! [`Body`].
//!
//! Each annotation is plain data; the matching handler in [`crate::handler`]
//! gives it meaning.

use std::any::Any;

use rivet_core::{
    Annotation, Capability, Encodable, Method, PathTemplate, Target, Variant,
};

/// Implements [`Annotation`] for a parameter-level annotation.
macro_rules! parameter_annotation {
    ($ty:ident, $variant:literal, $capability:expr) => {
        impl $ty {
            #[doc = concat!("The `", $variant, "` variant.")]
            pub const VARIANT: Variant = Variant::new($variant);
        }

        impl Annotation for $ty {
            fn variant(&self) -> Variant {
                Self::VARIANT
            }

            fn target(&self) -> Target {
                Target::Parameter
            }

            fn required_capability(&self) -> Option<Capability> {
                Some($capability)
            }

            fn as_any(&self) -> &dyn Any {
                self
            }
        }
    };
    ($ty:ident, $variant:literal, $capability:expr, encodable) => {
        impl $ty {
            #[doc = concat!("The `", $variant, "` variant.")]
            pub const VARIANT: Variant = Variant::new($variant);
        }

        impl Encodable for $ty {
            fn is_encoded(&self) -> bool {
                self.encoded
            }
        }

        impl Annotation for $ty {
            fn variant(&self) -> Variant {
                Self::VARIANT
            }

            fn target(&self) -> Target {
                Target::Parameter
            }

            fn required_capability(&self) -> Option<Capability> {
                Some($capability)
            }

            fn as_encodable(&self) -> Option<&dyn Encodable> {
                Some(self)
            }

            fn as_any(&self) -> &dyn Any {
                self
            }
        }
    };
}

// ============================================================================
// Method-level
// ============================================================================

/// HTTP verb and relative path, e.g. `Http::get("/users/{id}")`.
///
/// Each verb is its own variant (`GET`, `POST`, ...).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Http {
    method: Method,
    path: PathTemplate,
}

impl Http {
    /// Any verb with a path template.
    #[must_use]
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: PathTemplate::new(path),
        }
    }

    /// `GET` request.
    #[must_use]
    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::Get, path)
    }

    /// `POST` request.
    #[must_use]
    pub fn post(path: impl Into<String>) -> Self {
        Self::new(Method::Post, path)
    }

    /// `PUT` request.
    #[must_use]
    pub fn put(path: impl Into<String>) -> Self {
        Self::new(Method::Put, path)
    }

    /// `DELETE` request.
    #[must_use]
    pub fn delete(path: impl Into<String>) -> Self {
        Self::new(Method::Delete, path)
    }

    /// `PATCH` request.
    #[must_use]
    pub fn patch(path: impl Into<String>) -> Self {
        Self::new(Method::Patch, path)
    }

    /// `HEAD` request.
    #[must_use]
    pub fn head(path: impl Into<String>) -> Self {
        Self::new(Method::Head, path)
    }

    /// `OPTIONS` request.
    #[must_use]
    pub fn options(path: impl Into<String>) -> Self {
        Self::new(Method::Options, path)
    }

    /// The variant for a verb.
    #[must_use]
    pub const fn variant_of(method: Method) -> Variant {
        Variant::new(method.as_str())
    }

    /// The verb.
    #[must_use]
    pub const fn method(&self) -> Method {
        self.method
    }

    /// The path template, possibly empty.
    #[must_use]
    pub const fn path(&self) -> &PathTemplate {
        &self.path
    }
}

impl Annotation for Http {
    fn variant(&self) -> Variant {
        Self::variant_of(self.method)
    }

    fn target(&self) -> Target {
        Target::Method
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// Static headers, each line `Name: value`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Headers {
    lines: Vec<String>,
}

impl Headers {
    /// The `Headers` variant.
    pub const VARIANT: Variant = Variant::new("Headers");

    /// Headers from `Name: value` lines.
    #[must_use]
    pub fn new<I, S>(lines: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            lines: lines.into_iter().map(Into::into).collect(),
        }
    }

    /// The raw header lines.
    #[must_use]
    pub fn lines(&self) -> &[String] {
        &self.lines
    }
}

impl Annotation for Headers {
    fn variant(&self) -> Variant {
        Self::VARIANT
    }

    fn target(&self) -> Target {
        Target::Method
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// Dispatch the method asynchronously, returning a [`crate::Deferred`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Async;

impl Async {
    /// The `Async` variant.
    pub const VARIANT: Variant = Variant::new("Async");
}

impl Annotation for Async {
    fn variant(&self) -> Variant {
        Self::VARIANT
    }

    fn target(&self) -> Target {
        Target::Method
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

// ============================================================================
// Parameter-level
// ============================================================================

/// Substitutes the `{name}` placeholder of the path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Path {
    name: String,
    encoded: bool,
}

impl Path {
    /// Bind the `{name}` placeholder; the value is encoded as a path segment.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            encoded: false,
        }
    }

    /// The value is already encoded.
    #[must_use]
    pub const fn encoded(mut self) -> Self {
        self.encoded = true;
        self
    }

    /// The placeholder name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }
}

parameter_annotation!(Path, "Path", Capability::String, encodable);

/// Replaces the whole request URL; the path template must be empty.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Url;

parameter_annotation!(Url, "Url", Capability::String);

/// One query parameter. Array values repeat the parameter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Query {
    name: String,
    encoded: bool,
}

impl Query {
    /// A query parameter named `name`.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            encoded: false,
        }
    }

    /// Name and value are already encoded.
    #[must_use]
    pub const fn encoded(mut self) -> Self {
        self.encoded = true;
        self
    }

    /// The parameter name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }
}

parameter_annotation!(Query, "Query", Capability::String, encodable);

/// Every entry of a map argument as a query parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct QueryMap {
    encoded: bool,
}

impl QueryMap {
    /// Entries are encoded when sent.
    #[must_use]
    pub const fn new() -> Self {
        Self { encoded: false }
    }

    /// Entries are already encoded.
    #[must_use]
    pub const fn encoded(mut self) -> Self {
        self.encoded = true;
        self
    }
}

parameter_annotation!(QueryMap, "QueryMap", Capability::String, encodable);

/// A query parameter name without value, e.g. `?verbose`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct QueryName {
    encoded: bool,
}

impl QueryName {
    /// The name is encoded when sent.
    #[must_use]
    pub const fn new() -> Self {
        Self { encoded: false }
    }

    /// The name is already encoded.
    #[must_use]
    pub const fn encoded(mut self) -> Self {
        self.encoded = true;
        self
    }
}

parameter_annotation!(QueryName, "QueryName", Capability::String, encodable);

/// One request header. Array values repeat the header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Header {
    name: String,
}

impl Header {
    /// A header named `name`.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }

    /// The header name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }
}

parameter_annotation!(Header, "Header", Capability::String);

/// Every entry of a map argument as a header.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct HeaderMap;

parameter_annotation!(HeaderMap, "HeaderMap", Capability::String);

/// One form field; makes the body form-url-encoded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Field {
    name: String,
    encoded: bool,
}

impl Field {
    /// A form field named `name`.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            encoded: false,
        }
    }

    /// Name and value are already encoded.
    #[must_use]
    pub const fn encoded(mut self) -> Self {
        self.encoded = true;
        self
    }

    /// The field name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }
}

parameter_annotation!(Field, "Field", Capability::String, encodable);

/// Every entry of a map argument as a form field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FieldMap {
    encoded: bool,
}

impl FieldMap {
    /// Entries are encoded when sent.
    #[must_use]
    pub const fn new() -> Self {
        Self { encoded: false }
    }

    /// Entries are already encoded.
    #[must_use]
    pub const fn encoded(mut self) -> Self {
        self.encoded = true;
        self
    }
}

parameter_annotation!(FieldMap, "FieldMap", Capability::String, encodable);

/// One multipart part; makes the body multipart.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Part {
    name: String,
}

impl Part {
    /// A part named `name`.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }

    /// The part name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }
}

parameter_annotation!(Part, "Part", Capability::RequestBody);

/// Every entry of a map argument as a multipart part.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PartMap;

parameter_annotation!(PartMap, "PartMap", Capability::RequestBody);

/// The raw request body.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Body;

parameter_annotation!(Body, "Body", Capability::RequestBody);
