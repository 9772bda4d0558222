//! Static and per-argument header handlers.

use rivet_core::{Annotation, ConfigError, ConfigErrorKind, Converter, Variant};

use super::{AnnotationHandler, downcast, parameter_index, string_converter};
use crate::ServiceMethodBuilder;
use crate::annotation::{Header, HeaderMap, Headers};
use crate::param::{HeaderMapParameter, HeaderParameter};

/// Static `Name: value` headers on a method.
#[derive(Debug, Clone, Copy, Default)]
pub struct HeadersHandler;

impl HeadersHandler {
    fn parse(line: &str) -> Result<(&str, &str), ConfigError> {
        line.split_once(':')
            .map(|(name, value)| (name.trim(), value.trim()))
            .filter(|(name, _)| !name.is_empty())
            .ok_or_else(|| {
                ConfigErrorKind::InvalidHeader {
                    value: line.to_string(),
                }
                .into()
            })
    }
}

impl AnnotationHandler for HeadersHandler {
    fn variant(&self) -> Variant {
        Headers::VARIANT
    }

    fn handle(
        &self,
        annotation: &dyn Annotation,
        builder: &mut ServiceMethodBuilder,
        _converter: Option<&Converter>,
        _index: Option<usize>,
    ) -> Result<(), ConfigError> {
        let headers = downcast::<Headers>(annotation, Headers::VARIANT)?;
        for line in headers.lines() {
            let (name, value) = Self::parse(line)?;
            builder.header(name, value);
        }
        Ok(())
    }
}

/// One header from a parameter.
#[derive(Debug, Clone, Copy, Default)]
pub struct HeaderHandler;

impl AnnotationHandler for HeaderHandler {
    fn variant(&self) -> Variant {
        Header::VARIANT
    }

    fn handle(
        &self,
        annotation: &dyn Annotation,
        builder: &mut ServiceMethodBuilder,
        converter: Option<&Converter>,
        index: Option<usize>,
    ) -> Result<(), ConfigError> {
        let header = downcast::<Header>(annotation, Header::VARIANT)?;
        let index = parameter_index(index, Header::VARIANT)?;
        let converter = string_converter(converter)?;
        builder.parameter(index, HeaderParameter::new(header.name(), converter))
    }
}

/// Headers from a map parameter.
#[derive(Debug, Clone, Copy, Default)]
pub struct HeaderMapHandler;

impl AnnotationHandler for HeaderMapHandler {
    fn variant(&self) -> Variant {
        HeaderMap::VARIANT
    }

    fn handle(
        &self,
        annotation: &dyn Annotation,
        builder: &mut ServiceMethodBuilder,
        converter: Option<&Converter>,
        index: Option<usize>,
    ) -> Result<(), ConfigError> {
        downcast::<HeaderMap>(annotation, HeaderMap::VARIANT)?;
        let index = parameter_index(index, HeaderMap::VARIANT)?;
        builder.parameter(index, HeaderMapParameter::new(string_converter(converter)?))
    }
}
