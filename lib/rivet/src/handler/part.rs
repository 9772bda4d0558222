//! Multipart annotation handlers.

use rivet_core::{Annotation, BodyKind, ConfigError, Converter, Variant};

use super::{AnnotationHandler, downcast, parameter_index, request_body_converter};
use crate::ServiceMethodBuilder;
use crate::annotation::{Part, PartMap};
use crate::param::{PartMapParameter, PartParameter};

/// One multipart part.
#[derive(Debug, Clone, Copy, Default)]
pub struct PartHandler;

impl AnnotationHandler for PartHandler {
    fn variant(&self) -> Variant {
        Part::VARIANT
    }

    fn handle(
        &self,
        annotation: &dyn Annotation,
        builder: &mut ServiceMethodBuilder,
        converter: Option<&Converter>,
        index: Option<usize>,
    ) -> Result<(), ConfigError> {
        let part = downcast::<Part>(annotation, Part::VARIANT)?;
        let index = parameter_index(index, Part::VARIANT)?;
        let converter = request_body_converter(converter)?;
        builder.body_kind(BodyKind::Multipart)?;
        builder.parameter(index, PartParameter::new(part.name(), converter))
    }
}

/// Multipart parts from a map parameter.
#[derive(Debug, Clone, Copy, Default)]
pub struct PartMapHandler;

impl AnnotationHandler for PartMapHandler {
    fn variant(&self) -> Variant {
        PartMap::VARIANT
    }

    fn handle(
        &self,
        annotation: &dyn Annotation,
        builder: &mut ServiceMethodBuilder,
        converter: Option<&Converter>,
        index: Option<usize>,
    ) -> Result<(), ConfigError> {
        downcast::<PartMap>(annotation, PartMap::VARIANT)?;
        let index = parameter_index(index, PartMap::VARIANT)?;
        builder.body_kind(BodyKind::Multipart)?;
        builder.parameter(
            index,
            PartMapParameter::new(request_body_converter(converter)?),
        )
    }
}
