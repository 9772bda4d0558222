//! Declarative HTTP client for Rust.
//!
//! Describe a service as an annotated trait, let rivet resolve the
//! annotations into immutable method descriptors and generate a client that
//! builds requests, sends them and decodes the responses.
//!
//! # Example
//!
//! ```ignore
//! use rivet::prelude::*;
//!
//! #[derive(Debug, Deserialize)]
//! pub struct User {
//!     id: u64,
//!     name: String,
//! }
//!
//! #[rivet::service]
//! pub trait UserApi {
//!     #[get("/users/{id}")]
//!     async fn get_user(&self, #[path] id: u64) -> rivet::Result<User>;
//!
//!     #[post("/users")]
//!     #[asynchronous]
//!     fn create_user(&self, #[body] user: &NewUser) -> rivet::Result<Deferred<User>>;
//! }
//!
//! let rivet = Rivet::builder().base_url("https://api.example.com").build()?;
//! let users: UserApiClient = rivet.create()?;
//! let user = users.get_user(42).await?;
//! ```
//!
//! The pipeline is open: new annotations are added by implementing
//! [`Annotation`] and registering an [`handler::AnnotationHandler`] for its
//! [`Variant`].

pub mod annotation;
mod client;
mod config;
mod connector;
mod declaration;
pub mod generation;
pub mod handler;
pub mod middleware;
pub mod param;
pub mod prelude;
mod resolver;
mod rivet;
mod service_method;

pub use client::{BoxedService, HyperClient, HyperClientBuilder, ServiceFuture};
pub use config::{ClientConfig, ClientConfigBuilder};
pub use declaration::{MethodDeclaration, ParameterDeclaration, ServiceDeclaration};
pub use generation::{Deferred, Emitter, GeneratedService, Generator};
pub use resolver::{ServiceDefinition, ServiceResolver};
pub use rivet::{Rivet, RivetBuilder, ServiceInterface};
pub use service_method::{ServiceMethodBuilder, ServiceMethodDescriptor};

// Re-export tower for middleware composition
pub use tower;

// Re-export core types
pub use rivet_core::{
    Annotation, BodyKind, Capability, ConfigError, ConfigErrorKind, ContentType, Converter,
    ConverterFactory, ConverterRegistry, Encodable, Error, Form, HttpClient, JsonConverter,
    JsonConverterFactory, Method, Part, PathTemplate, Request, RequestBody, RequestBodyConverter,
    RequestBuilder, Response, ResponseBodyConverter, Result, ScalarStringConverter,
    StringConverter, Target, TextConverter, TextConverterFactory, TypeName, Variant, from_json,
    from_value, to_argument, to_json,
};

// Re-export http types for status codes and headers
pub use rivet_core::{StatusCode, header};

// Re-export crates for macro-generated code
pub use serde_json;
pub use url;

// Re-export the service macro
pub use rivet_macro::service;
