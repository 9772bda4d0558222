//! Query annotation handlers.

use rivet_core::{Annotation, ConfigError, Converter, Variant};

use super::{AnnotationHandler, downcast, parameter_index, string_converter};
use crate::ServiceMethodBuilder;
use crate::annotation::{Query, QueryMap, QueryName};
use crate::param::{QueryMapParameter, QueryNameParameter, QueryParameter};

fn is_encoded(annotation: &dyn Annotation) -> bool {
    annotation
        .as_encodable()
        .is_some_and(|encodable| encodable.is_encoded())
}

/// One named query parameter.
#[derive(Debug, Clone, Copy, Default)]
pub struct QueryHandler;

impl AnnotationHandler for QueryHandler {
    fn variant(&self) -> Variant {
        Query::VARIANT
    }

    fn handle(
        &self,
        annotation: &dyn Annotation,
        builder: &mut ServiceMethodBuilder,
        converter: Option<&Converter>,
        index: Option<usize>,
    ) -> Result<(), ConfigError> {
        let query = downcast::<Query>(annotation, Query::VARIANT)?;
        let index = parameter_index(index, Query::VARIANT)?;
        let converter = string_converter(converter)?;
        builder.parameter(
            index,
            QueryParameter::new(query.name(), is_encoded(annotation), converter),
        )
    }
}

/// Query parameters from a map argument.
#[derive(Debug, Clone, Copy, Default)]
pub struct QueryMapHandler;

impl AnnotationHandler for QueryMapHandler {
    fn variant(&self) -> Variant {
        QueryMap::VARIANT
    }

    fn handle(
        &self,
        annotation: &dyn Annotation,
        builder: &mut ServiceMethodBuilder,
        converter: Option<&Converter>,
        index: Option<usize>,
    ) -> Result<(), ConfigError> {
        downcast::<QueryMap>(annotation, QueryMap::VARIANT)?;
        let index = parameter_index(index, QueryMap::VARIANT)?;
        let converter = string_converter(converter)?;
        builder.parameter(
            index,
            QueryMapParameter::new(is_encoded(annotation), converter),
        )
    }
}

/// Query names without values.
#[derive(Debug, Clone, Copy, Default)]
pub struct QueryNameHandler;

impl AnnotationHandler for QueryNameHandler {
    fn variant(&self) -> Variant {
        QueryName::VARIANT
    }

    fn handle(
        &self,
        annotation: &dyn Annotation,
        builder: &mut ServiceMethodBuilder,
        converter: Option<&Converter>,
        index: Option<usize>,
    ) -> Result<(), ConfigError> {
        downcast::<QueryName>(annotation, QueryName::VARIANT)?;
        let index = parameter_index(index, QueryName::VARIANT)?;
        let converter = string_converter(converter)?;
        builder.parameter(
            index,
            QueryNameParameter::new(is_encoded(annotation), converter),
        )
    }
}
