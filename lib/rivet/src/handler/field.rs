//! Form field annotation handlers.

use rivet_core::{Annotation, BodyKind, ConfigError, ConfigErrorKind, Converter, Variant};

use super::{AnnotationHandler, downcast, parameter_index, string_converter};
use crate::ServiceMethodBuilder;
use crate::annotation::{Field, FieldMap};
use crate::param::{FieldMapParameter, FieldParameter};

/// One form field.
#[derive(Debug, Clone, Copy, Default)]
pub struct FieldHandler;

impl AnnotationHandler for FieldHandler {
    fn variant(&self) -> Variant {
        Field::VARIANT
    }

    fn handle(
        &self,
        annotation: &dyn Annotation,
        builder: &mut ServiceMethodBuilder,
        converter: Option<&Converter>,
        index: Option<usize>,
    ) -> Result<(), ConfigError> {
        let field = downcast::<Field>(annotation, Field::VARIANT)?;
        let index = parameter_index(index, Field::VARIANT)?;
        let converter = string_converter(converter)?;
        let encoded = annotation
            .as_encodable()
            .is_some_and(|encodable| encodable.is_encoded());
        builder.body_kind(BodyKind::FormUrlEncoded)?;
        builder.parameter(index, FieldParameter::new(field.name(), encoded, converter))
    }
}

/// Form fields from a map parameter.
///
/// Only the annotation's encodable view is consulted, so any annotation
/// registered under the `FieldMap` variant works as long as it carries an
/// encoded flag.
#[derive(Debug, Clone, Copy, Default)]
pub struct FieldMapHandler;

impl AnnotationHandler for FieldMapHandler {
    fn variant(&self) -> Variant {
        FieldMap::VARIANT
    }

    fn handle(
        &self,
        annotation: &dyn Annotation,
        builder: &mut ServiceMethodBuilder,
        converter: Option<&Converter>,
        index: Option<usize>,
    ) -> Result<(), ConfigError> {
        let variant = annotation.variant();
        if variant != FieldMap::VARIANT {
            return Err(ConfigErrorKind::WrongAnnotation {
                expected: FieldMap::VARIANT,
                found: variant,
            }
            .into());
        }
        let encodable = annotation
            .as_encodable()
            .ok_or(ConfigErrorKind::NotEncodable { variant })?;
        let index = parameter_index(index, variant)?;
        let converter = string_converter(converter)?;
        builder.body_kind(BodyKind::FormUrlEncoded)?;
        builder.parameter(index, FieldMapParameter::new(encodable.is_encoded(), converter))
    }
}
