//! Marks a method asynchronous.

use rivet_core::{Annotation, ConfigError, Converter, Variant};

use super::{AnnotationHandler, downcast};
use crate::ServiceMethodBuilder;
use crate::annotation::Async;

/// Marks the method for deferred dispatch.
#[derive(Debug, Clone, Copy, Default)]
pub struct AsyncHandler;

impl AnnotationHandler for AsyncHandler {
    fn variant(&self) -> Variant {
        Async::VARIANT
    }

    fn handle(
        &self,
        annotation: &dyn Annotation,
        builder: &mut ServiceMethodBuilder,
        _converter: Option<&Converter>,
        _index: Option<usize>,
    ) -> Result<(), ConfigError> {
        downcast::<Async>(annotation, Async::VARIANT)?;
        builder.asynchronous();
        Ok(())
    }
}
