//! Core types and traits for the rivet declarative HTTP client.
//!
//! This crate provides the pieces shared by the resolver, the generated
//! clients and the transport:
//! - [`Annotation`], [`Variant`] and [`Target`] - the annotation abstraction
//! - [`Converter`], [`ConverterRegistry`] and [`ConverterFactory`] - value converters
//! - [`Request`], [`RequestBuilder`] and [`Response`] - HTTP messages
//! - [`HttpClient`] - the transport interface
//! - [`Error`], [`ConfigError`] and [`Result`] - error handling
//! - [`PathTemplate`] and [`Method`] - request line building blocks

mod annotation;
mod body;
mod client;
mod converter;
mod error;
mod method;
mod multipart;
mod path_template;
pub mod prelude;
mod request;
mod response;

pub use annotation::{Annotation, Encodable, Target, Variant};
pub use body::{
    BodyKind, ContentType, encode_component, encode_path_segment, from_json, from_value,
    to_argument, to_json,
};
pub use client::HttpClient;
pub use converter::{
    Capability, Converter, ConverterFactory, ConverterRegistry, JsonConverter,
    JsonConverterFactory, RequestBody, RequestBodyConverter, ResponseBodyConverter,
    ScalarStringConverter, StringConverter, TextConverter, TextConverterFactory, TypeName,
};
pub use error::{ConfigError, ConfigErrorKind, Error, Result};
pub use method::Method;
pub use multipart::{Form, Part};
pub use path_template::PathTemplate;
pub use request::{Request, RequestBuilder};
pub use response::Response;

// Re-export http crate types for status codes and headers
pub use http::{StatusCode, header};
