//! Query parameters: single pairs, maps and bare names.

use std::sync::Arc;

use rivet_core::{RequestBuilder, Result, StringConverter};
use serde_json::Value;

use super::{ParameterHandler, ParameterRole, each_value, encode_unless, entries};

/// One query parameter; arrays repeat it, `null` omits it.
#[derive(Debug, Clone)]
pub struct QueryParameter {
    name: String,
    encoded: bool,
    converter: Arc<dyn StringConverter>,
}

impl QueryParameter {
    /// A query parameter named `name`.
    #[must_use]
    pub fn new(name: impl Into<String>, encoded: bool, converter: Arc<dyn StringConverter>) -> Self {
        Self {
            name: name.into(),
            encoded,
            converter,
        }
    }
}

impl ParameterHandler for QueryParameter {
    fn role(&self) -> ParameterRole {
        ParameterRole::Query {
            name: self.name.clone(),
            encoded: self.encoded,
        }
    }

    fn apply(&self, builder: &mut RequestBuilder, value: &Value) -> Result<()> {
        let name = encode_unless(&self.name, self.encoded);
        for item in each_value(value) {
            let converted = self.converter.convert(item)?;
            builder.query(name.clone(), Some(encode_unless(&converted, self.encoded)));
        }
        Ok(())
    }
}

/// Every map entry as a query parameter.
#[derive(Debug, Clone)]
pub struct QueryMapParameter {
    encoded: bool,
    converter: Arc<dyn StringConverter>,
}

impl QueryMapParameter {
    /// A query map parameter.
    #[must_use]
    pub fn new(encoded: bool, converter: Arc<dyn StringConverter>) -> Self {
        Self { encoded, converter }
    }
}

impl ParameterHandler for QueryMapParameter {
    fn role(&self) -> ParameterRole {
        ParameterRole::QueryMap {
            encoded: self.encoded,
        }
    }

    fn apply(&self, builder: &mut RequestBuilder, value: &Value) -> Result<()> {
        if value.is_null() {
            return Ok(());
        }
        for (key, entry) in entries(value, "query map")? {
            let name = encode_unless(key, self.encoded);
            for item in each_value(entry) {
                let converted = self.converter.convert(item)?;
                builder.query(name.clone(), Some(encode_unless(&converted, self.encoded)));
            }
        }
        Ok(())
    }
}

/// Bare query names, e.g. `?verbose&dry-run`.
#[derive(Debug, Clone)]
pub struct QueryNameParameter {
    encoded: bool,
    converter: Arc<dyn StringConverter>,
}

impl QueryNameParameter {
    /// A query name parameter.
    #[must_use]
    pub fn new(encoded: bool, converter: Arc<dyn StringConverter>) -> Self {
        Self { encoded, converter }
    }
}

impl ParameterHandler for QueryNameParameter {
    fn role(&self) -> ParameterRole {
        ParameterRole::QueryName {
            encoded: self.encoded,
        }
    }

    fn apply(&self, builder: &mut RequestBuilder, value: &Value) -> Result<()> {
        for item in each_value(value) {
            let converted = self.converter.convert(item)?;
            builder.query(encode_unless(&converted, self.encoded), None);
        }
        Ok(())
    }
}
