//! The handle returned by asynchronous calls.

use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};

use futures_util::FutureExt;
use futures_util::future::BoxFuture;

use crate::Result;

/// The pending result of an asynchronous service method.
///
/// Awaiting it sends the request and decodes the response, exactly like the
/// synchronous call would.
#[must_use = "a deferred call does nothing unless awaited"]
pub struct Deferred<T> {
    inner: BoxFuture<'static, Result<T>>,
}

impl<T> Deferred<T> {
    /// Wrap a future producing the call result.
    pub fn new<F>(future: F) -> Self
    where
        F: Future<Output = Result<T>> + Send + 'static,
    {
        Self {
            inner: future.boxed(),
        }
    }

    /// A deferred result that is already known.
    pub fn ready(result: Result<T>) -> Self
    where
        T: Send + 'static,
    {
        Self::new(async move { result })
    }

    /// Transform the successful value.
    pub fn map<U, F>(self, f: F) -> Deferred<U>
    where
        T: 'static,
        F: FnOnce(T) -> U + Send + 'static,
    {
        Deferred::new(self.inner.map(|result| result.map(f)))
    }
}

impl<T> Future for Deferred<T> {
    type Output = Result<T>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        self.inner.as_mut().poll(cx)
    }
}

impl<T> fmt::Debug for Deferred<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Deferred").finish_non_exhaustive()
    }
}
