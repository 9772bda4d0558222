//! Multipart parts, single and from a map.

use std::sync::Arc;

use rivet_core::{Part, RequestBodyConverter, RequestBuilder, Result};
use serde_json::Value;

use super::{ParameterHandler, ParameterRole, entries};

/// One multipart part, converted by a request body converter.
#[derive(Debug, Clone)]
pub struct PartParameter {
    name: String,
    converter: Arc<dyn RequestBodyConverter>,
}

impl PartParameter {
    /// A part named `name`.
    #[must_use]
    pub fn new(name: impl Into<String>, converter: Arc<dyn RequestBodyConverter>) -> Self {
        Self {
            name: name.into(),
            converter,
        }
    }
}

impl ParameterHandler for PartParameter {
    fn role(&self) -> ParameterRole {
        ParameterRole::Part {
            name: self.name.clone(),
        }
    }

    fn apply(&self, builder: &mut RequestBuilder, value: &Value) -> Result<()> {
        if value.is_null() {
            return Ok(());
        }
        let body = self.converter.convert(value)?;
        builder.part(Part::from_body(self.name.clone(), body))
    }
}

/// Every map entry as a multipart part.
#[derive(Debug, Clone)]
pub struct PartMapParameter {
    converter: Arc<dyn RequestBodyConverter>,
}

impl PartMapParameter {
    /// A part map parameter.
    #[must_use]
    pub fn new(converter: Arc<dyn RequestBodyConverter>) -> Self {
        Self { converter }
    }
}

impl ParameterHandler for PartMapParameter {
    fn role(&self) -> ParameterRole {
        ParameterRole::PartMap
    }

    fn apply(&self, builder: &mut RequestBuilder, value: &Value) -> Result<()> {
        if value.is_null() {
            return Ok(());
        }
        for (name, entry) in entries(value, "part map")? {
            if entry.is_null() {
                continue;
            }
            let body = self.converter.convert(entry)?;
            builder.part(Part::from_body(name.clone(), body))?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use rivet_core::{BodyKind, JsonConverter, Method, PathTemplate};
    use serde_json::json;

    use super::*;

    #[test]
    fn part_map_adds_json_parts() {
        let handler = PartMapParameter::new(Arc::new(JsonConverter));
        let base = url::Url::parse("http://localhost").expect("valid URL");
        let mut builder = RequestBuilder::new(Method::Post, base, &PathTemplate::new("/upload"))
            .body_kind(Some(BodyKind::Multipart));
        handler
            .apply(&mut builder, &json!({"meta": {"a": 1}, "skip": null}))
            .expect("apply");

        let request = builder.build().expect("build");
        let content_type = request.header("Content-Type").unwrap_or_default();
        assert!(content_type.starts_with("multipart/form-data; boundary="));

        let body = String::from_utf8(request.body().cloned().unwrap_or_default().to_vec())
            .expect("utf-8");
        assert!(body.contains("name=\"meta\""));
        assert!(body.contains("Content-Type: application/json"));
        assert!(body.contains(r#"{"a":1}"#));
        assert!(!body.contains("skip"));
    }
}
