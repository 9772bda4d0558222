//! Request headers, single and from a map.

use std::sync::Arc;

use rivet_core::{RequestBuilder, Result, StringConverter};
use serde_json::Value;

use super::{ParameterHandler, ParameterRole, each_value, entries};

/// One header; arrays repeat it, `null` omits it.
#[derive(Debug, Clone)]
pub struct HeaderParameter {
    name: String,
    converter: Arc<dyn StringConverter>,
}

impl HeaderParameter {
    /// A header named `name`.
    #[must_use]
    pub fn new(name: impl Into<String>, converter: Arc<dyn StringConverter>) -> Self {
        Self {
            name: name.into(),
            converter,
        }
    }
}

impl ParameterHandler for HeaderParameter {
    fn role(&self) -> ParameterRole {
        ParameterRole::Header {
            name: self.name.clone(),
        }
    }

    fn apply(&self, builder: &mut RequestBuilder, value: &Value) -> Result<()> {
        for item in each_value(value) {
            builder.header(self.name.clone(), self.converter.convert(item)?);
        }
        Ok(())
    }
}

/// Every map entry as a header.
#[derive(Debug, Clone)]
pub struct HeaderMapParameter {
    converter: Arc<dyn StringConverter>,
}

impl HeaderMapParameter {
    /// A header map parameter.
    #[must_use]
    pub fn new(converter: Arc<dyn StringConverter>) -> Self {
        Self { converter }
    }
}

impl ParameterHandler for HeaderMapParameter {
    fn role(&self) -> ParameterRole {
        ParameterRole::HeaderMap
    }

    fn apply(&self, builder: &mut RequestBuilder, value: &Value) -> Result<()> {
        if value.is_null() {
            return Ok(());
        }
        for (name, entry) in entries(value, "header map")? {
            for item in each_value(entry) {
                builder.header(name.clone(), self.converter.convert(item)?);
            }
        }
        Ok(())
    }
}
