//! Form fields, single and from a map.

use std::sync::Arc;

use rivet_core::{RequestBuilder, Result, StringConverter};
use serde_json::Value;

use super::{ParameterHandler, ParameterRole, each_value, encode_unless, entries};

/// One form field; arrays repeat it, `null` omits it.
#[derive(Debug, Clone)]
pub struct FieldParameter {
    name: String,
    encoded: bool,
    converter: Arc<dyn StringConverter>,
}

impl FieldParameter {
    /// A form field named `name`.
    #[must_use]
    pub fn new(name: impl Into<String>, encoded: bool, converter: Arc<dyn StringConverter>) -> Self {
        Self {
            name: name.into(),
            encoded,
            converter,
        }
    }
}

impl ParameterHandler for FieldParameter {
    fn role(&self) -> ParameterRole {
        ParameterRole::Field {
            name: self.name.clone(),
            encoded: self.encoded,
        }
    }

    fn apply(&self, builder: &mut RequestBuilder, value: &Value) -> Result<()> {
        let name = encode_unless(&self.name, self.encoded);
        for item in each_value(value) {
            let converted = self.converter.convert(item)?;
            builder.field(name.clone(), encode_unless(&converted, self.encoded))?;
        }
        Ok(())
    }
}

/// Every map entry as a form field.
#[derive(Debug, Clone)]
pub struct FieldMapParameter {
    encoded: bool,
    converter: Arc<dyn StringConverter>,
}

impl FieldMapParameter {
    /// A field map parameter.
    #[must_use]
    pub fn new(encoded: bool, converter: Arc<dyn StringConverter>) -> Self {
        Self { encoded, converter }
    }
}

impl ParameterHandler for FieldMapParameter {
    fn role(&self) -> ParameterRole {
        ParameterRole::FieldMap {
            encoded: self.encoded,
        }
    }

    fn apply(&self, builder: &mut RequestBuilder, value: &Value) -> Result<()> {
        if value.is_null() {
            return Ok(());
        }
        for (key, entry) in entries(value, "field map")? {
            let name = encode_unless(key, self.encoded);
            for item in each_value(entry) {
                let converted = self.converter.convert(item)?;
                builder.field(name.clone(), encode_unless(&converted, self.encoded))?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use bytes::Bytes;
    use rivet_core::{BodyKind, Method, PathTemplate, ScalarStringConverter};
    use serde_json::json;

    use super::*;

    fn form_of(handler: &dyn ParameterHandler, value: &Value) -> Bytes {
        let base = url::Url::parse("http://localhost").expect("valid URL");
        let mut builder = RequestBuilder::new(Method::Post, base, &PathTemplate::new("/form"))
            .body_kind(Some(BodyKind::FormUrlEncoded));
        handler.apply(&mut builder, value).expect("apply");
        builder
            .build()
            .expect("build")
            .body()
            .cloned()
            .unwrap_or_default()
    }

    #[test]
    fn field_map_encodes_values() {
        let handler = FieldMapParameter::new(false, Arc::new(ScalarStringConverter));
        let body = form_of(&handler, &json!({"a": "1 2", "b": "x"}));
        assert_eq!(body.as_ref(), b"a=1%202&b=x");
    }

    #[test]
    fn encoded_field_map_is_literal() {
        let handler = FieldMapParameter::new(true, Arc::new(ScalarStringConverter));
        let body = form_of(&handler, &json!({"a": "1 2", "b": "x"}));
        assert_eq!(body.as_ref(), b"a=1 2&b=x");
    }

    #[test]
    fn field_skips_null() {
        let handler = FieldParameter::new("note", false, Arc::new(ScalarStringConverter));
        assert!(form_of(&handler, &Value::Null).is_empty());
    }
}
