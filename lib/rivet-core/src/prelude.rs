//! Prelude module for convenient imports.
//!
//! ```ignore
//! use rivet_core::prelude::*;
//! ```

pub use crate::{
    Annotation, Capability, ConfigError, ConfigErrorKind, Converter, ConverterFactory,
    ConverterRegistry, Error, HttpClient, Method, PathTemplate, Request, RequestBuilder, Response,
    Result, Target, TypeName, Variant, to_argument,
};
