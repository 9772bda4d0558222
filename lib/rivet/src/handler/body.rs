//! Raw body annotation handler.

use rivet_core::{Annotation, ConfigError, Converter, Variant};

use super::{AnnotationHandler, downcast, parameter_index, request_body_converter};
use crate::ServiceMethodBuilder;
use crate::annotation::Body;
use crate::param::BodyParameter;

/// The raw request body.
#[derive(Debug, Clone, Copy, Default)]
pub struct BodyHandler;

impl AnnotationHandler for BodyHandler {
    fn variant(&self) -> Variant {
        Body::VARIANT
    }

    fn handle(
        &self,
        annotation: &dyn Annotation,
        builder: &mut ServiceMethodBuilder,
        converter: Option<&Converter>,
        index: Option<usize>,
    ) -> Result<(), ConfigError> {
        downcast::<Body>(annotation, Body::VARIANT)?;
        let index = parameter_index(index, Body::VARIANT)?;
        builder.parameter(index, BodyParameter::new(request_body_converter(converter)?))
    }
}
