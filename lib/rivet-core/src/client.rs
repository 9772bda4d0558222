//! The HTTP transport interface.
//!
//! A single async primitive serves both dispatch modes: synchronous methods
//! await it inline, asynchronous methods wrap it in a deferred handle.

use std::sync::Arc;

use futures_util::future::BoxFuture;

use crate::{Request, Response, Result};

/// Executes HTTP requests.
///
/// The trait is object-safe so a generated service can hold any transport as
/// `Arc<dyn HttpClient>`. Implement it to stub the network in tests.
pub trait HttpClient: Send + Sync {
    /// Execute a request and buffer the response.
    ///
    /// Implementations return the response as-is, whatever its status.
    ///
    /// # Errors
    ///
    /// Returns an error on network, TLS or timeout failures.
    fn execute(&self, request: Request) -> BoxFuture<'static, Result<Response>>;
}

impl<C: HttpClient + ?Sized> HttpClient for Arc<C> {
    fn execute(&self, request: Request) -> BoxFuture<'static, Result<Response>> {
        (**self).execute(request)
    }
}

impl<C: HttpClient + ?Sized> HttpClient for Box<C> {
    fn execute(&self, request: Request) -> BoxFuture<'static, Result<Response>> {
        (**self).execute(request)
    }
}
