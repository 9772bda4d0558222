//! Annotation handlers: the table mapping each annotation variant to the
//! code that applies it to a [`ServiceMethodBuilder`].
//!
//! The table is open. Register an [`AnnotationHandler`] for a new
//! [`Variant`] to support a custom annotation.

mod asynchronous;
mod body;
mod field;
mod header;
mod http;
mod part;
mod path;
mod query;

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use rivet_core::{
    Annotation, Capability, ConfigError, ConfigErrorKind, Converter, Method, RequestBodyConverter,
    StringConverter, Variant,
};

pub use self::asynchronous::AsyncHandler;
pub use self::body::BodyHandler;
pub use self::field::{FieldHandler, FieldMapHandler};
pub use self::header::{HeaderHandler, HeaderMapHandler, HeadersHandler};
pub use self::http::HttpHandler;
pub use self::part::{PartHandler, PartMapHandler};
pub use self::path::{PathHandler, UrlHandler};
pub use self::query::{QueryHandler, QueryMapHandler, QueryNameHandler};

use crate::ServiceMethodBuilder;

/// Applies one annotation variant to the method being resolved.
pub trait AnnotationHandler: fmt::Debug + Send + Sync {
    /// The variant this handler accepts.
    fn variant(&self) -> Variant;

    /// Apply `annotation` to `builder`.
    ///
    /// `converter` is the converter resolved for the annotated parameter's
    /// type, when the annotation requires one. `index` is the parameter
    /// position for parameter-level annotations.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] when the annotation cannot be applied.
    fn handle(
        &self,
        annotation: &dyn Annotation,
        builder: &mut ServiceMethodBuilder,
        converter: Option<&Converter>,
        index: Option<usize>,
    ) -> Result<(), ConfigError>;
}

/// Downcast to the annotation type a handler expects.
///
/// The variant must match as well as the type: one annotation type may
/// carry several variants, such as one per HTTP verb.
pub(crate) fn downcast<A: Annotation>(
    annotation: &dyn Annotation,
    expected: Variant,
) -> Result<&A, ConfigError> {
    let found = annotation.variant();
    annotation
        .downcast_ref::<A>()
        .filter(|_| found == expected)
        .ok_or_else(|| ConfigErrorKind::WrongAnnotation { expected, found }.into())
}

pub(crate) fn string_converter(
    converter: Option<&Converter>,
) -> Result<Arc<dyn StringConverter>, ConfigError> {
    converter
        .and_then(Converter::as_string)
        .cloned()
        .ok_or_else(|| wrong_converter(Capability::String, converter))
}

pub(crate) fn request_body_converter(
    converter: Option<&Converter>,
) -> Result<Arc<dyn RequestBodyConverter>, ConfigError> {
    converter
        .and_then(Converter::as_request_body)
        .cloned()
        .ok_or_else(|| wrong_converter(Capability::RequestBody, converter))
}

fn wrong_converter(required: Capability, found: Option<&Converter>) -> ConfigError {
    ConfigErrorKind::WrongConverter {
        required,
        found: Converter::describe(found),
    }
    .into()
}

pub(crate) fn parameter_index(index: Option<usize>, variant: Variant) -> Result<usize, ConfigError> {
    index.ok_or_else(|| ConfigErrorKind::MissingParameterIndex { variant }.into())
}

/// The annotation handler table.
#[derive(Debug, Clone)]
pub struct HandlerRegistry {
    handlers: HashMap<Variant, Arc<dyn AnnotationHandler>>,
}

impl HandlerRegistry {
    /// A registry without any handler.
    #[must_use]
    pub fn empty() -> Self {
        Self {
            handlers: HashMap::new(),
        }
    }

    /// Register a handler.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigErrorKind::DuplicateHandler`] if the variant is taken.
    pub fn register(&mut self, handler: Arc<dyn AnnotationHandler>) -> Result<(), ConfigError> {
        let variant = handler.variant();
        if self.handlers.contains_key(&variant) {
            return Err(ConfigErrorKind::DuplicateHandler { variant }.into());
        }
        self.handlers.insert(variant, handler);
        Ok(())
    }

    /// Register a handler, builder style.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigErrorKind::DuplicateHandler`] if the variant is taken.
    pub fn with_handler(
        mut self,
        handler: impl AnnotationHandler + 'static,
    ) -> Result<Self, ConfigError> {
        self.register(Arc::new(handler))?;
        Ok(self)
    }

    /// The handler for a variant.
    #[must_use]
    pub fn get(&self, variant: Variant) -> Option<&Arc<dyn AnnotationHandler>> {
        self.handlers.get(&variant)
    }

    /// Number of registered handlers.
    #[must_use]
    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    /// Returns `true` if no handler is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }
}

/// Every built-in handler.
impl Default for HandlerRegistry {
    fn default() -> Self {
        let mut handlers: Vec<Arc<dyn AnnotationHandler>> = Method::ALL
            .iter()
            .map(|method| Arc::new(HttpHandler::new(*method)) as Arc<dyn AnnotationHandler>)
            .collect();
        handlers.extend([
            Arc::new(HeadersHandler) as Arc<dyn AnnotationHandler>,
            Arc::new(AsyncHandler),
            Arc::new(PathHandler),
            Arc::new(UrlHandler),
            Arc::new(QueryHandler),
            Arc::new(QueryMapHandler),
            Arc::new(QueryNameHandler),
            Arc::new(HeaderHandler),
            Arc::new(HeaderMapHandler),
            Arc::new(FieldHandler),
            Arc::new(FieldMapHandler),
            Arc::new(PartHandler),
            Arc::new(PartMapHandler),
            Arc::new(BodyHandler),
        ]);

        Self {
            handlers: handlers
                .into_iter()
                .map(|handler| (handler.variant(), handler))
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use assert2::{check, let_assert};
    use rivet_core::{JsonConverter, ScalarStringConverter};

    use super::*;
    use crate::annotation::{Body, Headers, Http, Query};

    #[test]
    fn default_registry_covers_every_builtin() {
        let registry = HandlerRegistry::default();
        check!(registry.len() == Method::ALL.len() + 14);
        for method in Method::ALL {
            check!(registry.get(Http::variant_of(method)).is_some());
        }
        check!(registry.get(Body::VARIANT).is_some());
        check!(registry.get(Variant::new("Unknown")).is_none());
    }

    #[test]
    fn registering_twice_fails() {
        let_assert!(Err(err) = HandlerRegistry::default().with_handler(BodyHandler));
        check!(
            err.kind()
                == &ConfigErrorKind::DuplicateHandler {
                    variant: Body::VARIANT
                }
        );

        let registry = HandlerRegistry::empty()
            .with_handler(BodyHandler)
            .expect("first registration");
        check!(registry.len() == 1);
    }

    #[test]
    fn downcast_mismatch_names_both_variants() {
        let annotation = Headers::new(["Accept: text/plain"]);
        let_assert!(Err(err) = downcast::<Query>(&annotation, Query::VARIANT));
        check!(
            err.kind()
                == &ConfigErrorKind::WrongAnnotation {
                    expected: Query::VARIANT,
                    found: Headers::VARIANT,
                }
        );
    }

    #[test]
    fn converter_capability_is_checked() {
        let body = Converter::RequestBody(Arc::new(JsonConverter));
        let_assert!(Err(err) = string_converter(Some(&body)));
        check!(
            err.to_string() == "converter must be a string converter, request body converter found"
        );
        let_assert!(Err(err) = request_body_converter(None));
        check!(
            err.kind()
                == &ConfigErrorKind::WrongConverter {
                    required: Capability::RequestBody,
                    found: "no converter",
                }
        );

        let string = Converter::String(Arc::new(ScalarStringConverter));
        check!(string_converter(Some(&string)).is_ok());
    }

    #[test]
    fn parameter_annotations_need_an_index() {
        let_assert!(Err(err) = parameter_index(None, Query::VARIANT));
        check!(
            err.kind()
                == &ConfigErrorKind::MissingParameterIndex {
                    variant: Query::VARIANT
                }
        );
        check!(parameter_index(Some(2), Query::VARIANT) == Ok(2));
    }
}
