//! Tower layers for [`crate::HyperClient`].
//!
//! - [`LoggingLayer`] - logs requests and responses with `tracing`
//! - [`ConcurrencyLimitLayer`] - caps in-flight requests (from tower)
//!
//! Any tower layer over [`crate::BoxedService`] can be added with
//! [`crate::HyperClientBuilder::layer`].

mod logging;

pub use logging::{LogLevel, Logging, LoggingLayer};
pub use tower::limit::ConcurrencyLimitLayer;
