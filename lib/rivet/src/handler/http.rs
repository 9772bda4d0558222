//! HTTP verb and path.

use rivet_core::{Annotation, ConfigError, Converter, Method, Variant};

use super::{AnnotationHandler, downcast};
use crate::ServiceMethodBuilder;
use crate::annotation::Http;

/// Sets the verb and path of the method. One instance per verb.
#[derive(Debug, Clone, Copy)]
pub struct HttpHandler {
    method: Method,
}

impl HttpHandler {
    /// The handler for `method`.
    #[must_use]
    pub const fn new(method: Method) -> Self {
        Self { method }
    }
}

impl AnnotationHandler for HttpHandler {
    fn variant(&self) -> Variant {
        Http::variant_of(self.method)
    }

    fn handle(
        &self,
        annotation: &dyn Annotation,
        builder: &mut ServiceMethodBuilder,
        _converter: Option<&Converter>,
        _index: Option<usize>,
    ) -> Result<(), ConfigError> {
        let http = downcast::<Http>(annotation, self.variant())?;
        builder.http_method(http.method(), http.path().clone())
    }
}
