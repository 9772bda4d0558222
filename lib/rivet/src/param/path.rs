//! Path placeholder substitution.

use std::sync::Arc;

use rivet_core::{Error, RequestBuilder, Result, StringConverter, encode_path_segment};
use serde_json::Value;

use super::{ParameterHandler, ParameterRole};

/// Substitutes one `{name}` placeholder.
#[derive(Debug, Clone)]
pub struct PathParameter {
    name: String,
    encoded: bool,
    converter: Arc<dyn StringConverter>,
}

impl PathParameter {
    /// Bind `{name}` with the given converter.
    #[must_use]
    pub fn new(name: impl Into<String>, encoded: bool, converter: Arc<dyn StringConverter>) -> Self {
        Self {
            name: name.into(),
            encoded,
            converter,
        }
    }
}

impl ParameterHandler for PathParameter {
    fn role(&self) -> ParameterRole {
        ParameterRole::Path {
            name: self.name.clone(),
            encoded: self.encoded,
        }
    }

    fn apply(&self, builder: &mut RequestBuilder, value: &Value) -> Result<()> {
        if value.is_null() {
            return Err(Error::conversion(format!(
                "path parameter `{}` value must not be null",
                self.name
            )));
        }
        let converted = self.converter.convert(value)?;
        let traverses = if self.encoded {
            converted.split('/').any(is_dot_segment)
        } else {
            is_dot_segment(&converted)
        };
        if traverses {
            return Err(Error::conversion(format!(
                "path parameter `{}` must not be a `.` or `..` segment, found `{converted}`",
                self.name
            )));
        }
        let segment = if self.encoded {
            converted
        } else {
            encode_path_segment(&converted)
        };
        builder.path_param(&self.name, &segment);
        Ok(())
    }
}

/// `Url::join` would normalize these away.
fn is_dot_segment(segment: &str) -> bool {
    segment == "." || segment == ".."
}

#[cfg(test)]
mod tests {
    use rivet_core::{Method, PathTemplate, ScalarStringConverter};
    use serde_json::json;

    use super::*;

    fn builder() -> RequestBuilder {
        let base = url::Url::parse("http://localhost").expect("valid URL");
        RequestBuilder::new(Method::Get, base, &PathTemplate::new("/files/{name}"))
    }

    #[test]
    fn encodes_segment() {
        let handler = PathParameter::new("name", false, Arc::new(ScalarStringConverter));
        let mut builder = builder();
        handler.apply(&mut builder, &json!("a b/c")).expect("apply");
        let request = builder.build().expect("build");
        assert_eq!(request.url().path(), "/files/a%20b%2Fc");
    }

    #[test]
    fn encoded_value_is_inserted_as_is() {
        let handler = PathParameter::new("name", true, Arc::new(ScalarStringConverter));
        let mut builder = builder();
        handler.apply(&mut builder, &json!("dir/file")).expect("apply");
        let request = builder.build().expect("build");
        assert_eq!(request.url().path(), "/files/dir/file");
    }

    #[test]
    fn dot_segments_are_rejected() {
        let handler = PathParameter::new("name", false, Arc::new(ScalarStringConverter));
        for value in [".", ".."] {
            let err = handler
                .apply(&mut builder(), &json!(value))
                .expect_err("dot segment");
            assert!(err.is_conversion());
        }
        handler
            .apply(&mut builder(), &json!("..hidden"))
            .expect("dots inside a name are fine");
    }

    #[test]
    fn encoded_value_cannot_climb_out() {
        let handler = PathParameter::new("name", true, Arc::new(ScalarStringConverter));
        let err = handler
            .apply(&mut builder(), &json!("docs/../admin"))
            .expect_err("dot segment");
        assert!(err.is_conversion());
    }

    #[test]
    fn null_is_rejected() {
        let handler = PathParameter::new("name", false, Arc::new(ScalarStringConverter));
        let err = handler
            .apply(&mut builder(), &Value::Null)
            .expect_err("null path");
        assert!(err.is_conversion());
    }
}
