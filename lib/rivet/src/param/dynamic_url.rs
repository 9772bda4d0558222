//! Dynamic request URL.

use std::sync::Arc;

use rivet_core::{Error, RequestBuilder, Result, StringConverter};
use serde_json::Value;

use super::{ParameterHandler, ParameterRole};

/// Replaces the request URL, resolved against the base URL.
#[derive(Debug, Clone)]
pub struct UrlParameter {
    converter: Arc<dyn StringConverter>,
}

impl UrlParameter {
    /// A dynamic URL parameter.
    #[must_use]
    pub fn new(converter: Arc<dyn StringConverter>) -> Self {
        Self { converter }
    }
}

impl ParameterHandler for UrlParameter {
    fn role(&self) -> ParameterRole {
        ParameterRole::Url
    }

    fn apply(&self, builder: &mut RequestBuilder, value: &Value) -> Result<()> {
        if value.is_null() {
            return Err(Error::conversion("URL parameter value must not be null"));
        }
        builder.url(self.converter.convert(value)?);
        Ok(())
    }
}
