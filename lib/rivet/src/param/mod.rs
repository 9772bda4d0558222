//! Parameter handlers: per-argument request mutation, built once at
//! resolution and applied on every call.

mod body;
mod dynamic_url;
mod field;
mod header;
mod part;
mod path;
mod query;

use std::fmt;

use derive_more::Display;
use rivet_core::{BodyKind, Error, RequestBuilder, Result, encode_component};
use serde_json::{Map, Value};

pub use self::body::BodyParameter;
pub use self::dynamic_url::UrlParameter;
pub use self::field::{FieldMapParameter, FieldParameter};
pub use self::header::{HeaderMapParameter, HeaderParameter};
pub use self::part::{PartMapParameter, PartParameter};
pub use self::path::PathParameter;
pub use self::query::{QueryMapParameter, QueryNameParameter, QueryParameter};

/// Applies one argument to the request being built.
pub trait ParameterHandler: fmt::Debug + Send + Sync {
    /// What the parameter contributes to the request.
    fn role(&self) -> ParameterRole;

    /// The body kind this parameter produces, if any.
    ///
    /// Defaults to the kind implied by [`Self::role`]. Handlers with a
    /// [`ParameterRole::Custom`] role that write a body override this so
    /// that conflicting bodies are caught at resolution.
    fn body_kind(&self) -> Option<BodyKind> {
        self.role().body_kind()
    }

    /// Apply the argument.
    ///
    /// # Errors
    ///
    /// Returns a conversion error if the argument cannot be converted.
    fn apply(&self, builder: &mut RequestBuilder, value: &Value) -> Result<()>;
}

/// The part of the request a parameter contributes to.
#[derive(Debug, Clone, PartialEq, Eq, Display)]
pub enum ParameterRole {
    /// Path placeholder.
    #[display("path `{name}`{}", encoded_suffix(*encoded))]
    Path {
        /// Placeholder name.
        name: String,
        /// Already encoded.
        encoded: bool,
    },
    /// Dynamic request URL.
    #[display("url")]
    Url,
    /// One query parameter.
    #[display("query `{name}`{}", encoded_suffix(*encoded))]
    Query {
        /// Parameter name.
        name: String,
        /// Already encoded.
        encoded: bool,
    },
    /// Query parameters from a map.
    #[display("query map{}", encoded_suffix(*encoded))]
    QueryMap {
        /// Already encoded.
        encoded: bool,
    },
    /// Bare query names.
    #[display("query name{}", encoded_suffix(*encoded))]
    QueryName {
        /// Already encoded.
        encoded: bool,
    },
    /// One header.
    #[display("header `{name}`")]
    Header {
        /// Header name.
        name: String,
    },
    /// Headers from a map.
    #[display("header map")]
    HeaderMap,
    /// One form field.
    #[display("field `{name}`{}", encoded_suffix(*encoded))]
    Field {
        /// Field name.
        name: String,
        /// Already encoded.
        encoded: bool,
    },
    /// Form fields from a map.
    #[display("field map{}", encoded_suffix(*encoded))]
    FieldMap {
        /// Already encoded.
        encoded: bool,
    },
    /// One multipart part.
    #[display("part `{name}`")]
    Part {
        /// Part name.
        name: String,
    },
    /// Multipart parts from a map.
    #[display("part map")]
    PartMap,
    /// Raw request body.
    #[display("body")]
    Body,
    /// A role contributed by a custom handler.
    #[display("{_0}")]
    Custom(String),
}

fn encoded_suffix(encoded: bool) -> &'static str {
    if encoded { " (encoded)" } else { "" }
}

impl ParameterRole {
    /// The body kind this role implies, if any.
    #[must_use]
    pub const fn body_kind(&self) -> Option<BodyKind> {
        match self {
            Self::Field { .. } | Self::FieldMap { .. } => Some(BodyKind::FormUrlEncoded),
            Self::Part { .. } | Self::PartMap => Some(BodyKind::Multipart),
            Self::Body => Some(BodyKind::Raw),
            _ => None,
        }
    }
}

/// Non-null values of an argument: array elements, or the value itself.
fn each_value(value: &Value) -> impl Iterator<Item = &Value> {
    let values: &[Value] = match value {
        Value::Null => &[],
        Value::Array(items) => items,
        other => std::slice::from_ref(other),
    };
    values.iter().filter(|v| !v.is_null())
}

/// The entries of a map argument.
fn entries<'a>(value: &'a Value, role: &str) -> Result<&'a Map<String, Value>> {
    value
        .as_object()
        .ok_or_else(|| Error::conversion(format!("{role} argument must be a map, found {value}")))
}

fn encode_unless(value: &str, encoded: bool) -> String {
    if encoded {
        value.to_string()
    } else {
        encode_component(value)
    }
}
