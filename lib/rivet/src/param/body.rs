//! Raw request body.

use std::sync::Arc;

use rivet_core::{Error, RequestBodyConverter, RequestBuilder, Result};
use serde_json::Value;

use super::{ParameterHandler, ParameterRole};

/// The raw request body.
#[derive(Debug, Clone)]
pub struct BodyParameter {
    converter: Arc<dyn RequestBodyConverter>,
}

impl BodyParameter {
    /// A body parameter.
    #[must_use]
    pub fn new(converter: Arc<dyn RequestBodyConverter>) -> Self {
        Self { converter }
    }
}

impl ParameterHandler for BodyParameter {
    fn role(&self) -> ParameterRole {
        ParameterRole::Body
    }

    fn apply(&self, builder: &mut RequestBuilder, value: &Value) -> Result<()> {
        if value.is_null() {
            return Err(Error::conversion("body parameter value must not be null"));
        }
        builder.body(self.converter.convert(value)?)
    }
}

#[cfg(test)]
mod tests {
    use rivet_core::{JsonConverter, Method, PathTemplate};
    use serde_json::json;

    use super::*;

    #[test]
    fn body_is_json_encoded() {
        let handler = BodyParameter::new(Arc::new(JsonConverter));
        let base = url::Url::parse("http://localhost").expect("valid URL");
        let mut builder = RequestBuilder::new(Method::Post, base, &PathTemplate::new("/users"));
        handler
            .apply(&mut builder, &json!({"name": "Alice"}))
            .expect("apply");

        let request = builder.build().expect("build");
        assert_eq!(request.header("Content-Type"), Some("application/json"));
        assert_eq!(
            request.body().map(AsRef::as_ref),
            Some(&br#"{"name":"Alice"}"#[..])
        );
    }
}
