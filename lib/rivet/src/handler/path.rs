//! Path placeholder and dynamic URL handlers.

use rivet_core::{Annotation, ConfigError, Converter, Variant};

use super::{AnnotationHandler, downcast, parameter_index, string_converter};
use crate::ServiceMethodBuilder;
use crate::annotation::{Path, Url};
use crate::param::{PathParameter, UrlParameter};

/// Binds a parameter to a path placeholder.
#[derive(Debug, Clone, Copy, Default)]
pub struct PathHandler;

impl AnnotationHandler for PathHandler {
    fn variant(&self) -> Variant {
        Path::VARIANT
    }

    fn handle(
        &self,
        annotation: &dyn Annotation,
        builder: &mut ServiceMethodBuilder,
        converter: Option<&Converter>,
        index: Option<usize>,
    ) -> Result<(), ConfigError> {
        let path = downcast::<Path>(annotation, Path::VARIANT)?;
        let index = parameter_index(index, Path::VARIANT)?;
        let converter = string_converter(converter)?;
        let encoded = annotation
            .as_encodable()
            .is_some_and(|encodable| encodable.is_encoded());
        builder.parameter(index, PathParameter::new(path.name(), encoded, converter))
    }
}

/// Binds a parameter to the whole request URL.
#[derive(Debug, Clone, Copy, Default)]
pub struct UrlHandler;

impl AnnotationHandler for UrlHandler {
    fn variant(&self) -> Variant {
        Url::VARIANT
    }

    fn handle(
        &self,
        annotation: &dyn Annotation,
        builder: &mut ServiceMethodBuilder,
        converter: Option<&Converter>,
        index: Option<usize>,
    ) -> Result<(), ConfigError> {
        downcast::<Url>(annotation, Url::VARIANT)?;
        let index = parameter_index(index, Url::VARIANT)?;
        builder.parameter(index, UrlParameter::new(string_converter(converter)?))
    }
}
