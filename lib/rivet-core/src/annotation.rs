//! The annotation abstraction consumed by the resolver.
//!
//! Annotations are produced generically by an annotation source (hand-written
//! declarations or the `#[service]` macro) and handed to handlers as
//! `&dyn Annotation`. Handlers dispatch on [`Variant`] and downcast to the
//! concrete type they expect.

use std::any::Any;
use std::fmt;

use derive_more::Display;

use crate::Capability;

/// Stable identity of an annotation variant, used as the handler table key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Display)]
#[display("{_0}")]
pub struct Variant(&'static str);

impl Variant {
    /// Create a variant identity from its name.
    #[must_use]
    pub const fn new(name: &'static str) -> Self {
        Self(name)
    }

    /// The variant name.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        self.0
    }
}

/// Where an annotation may be declared.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display)]
pub enum Target {
    /// On a service method.
    #[display("method")]
    Method,
    /// On a method parameter.
    #[display("parameter")]
    Parameter,
}

/// Annotations that carry an "already percent-encoded" flag.
pub trait Encodable {
    /// Returns `true` if values are already encoded and must be sent as-is.
    fn is_encoded(&self) -> bool;
}

/// Declarative metadata attached to a service method or parameter.
///
/// Implement this trait (and register an
/// `AnnotationHandler` for its [`Variant`]) to add new annotation kinds.
pub trait Annotation: fmt::Debug + Send + Sync + 'static {
    /// The variant identity used for handler dispatch.
    fn variant(&self) -> Variant;

    /// Where the annotation may be declared.
    fn target(&self) -> Target;

    /// The converter capability the handler of this annotation needs, if any.
    fn required_capability(&self) -> Option<Capability> {
        None
    }

    /// View this annotation as [`Encodable`], if it carries an encoded flag.
    fn as_encodable(&self) -> Option<&dyn Encodable> {
        None
    }

    /// Upcast for downcasting to the concrete annotation type.
    fn as_any(&self) -> &dyn Any;
}

impl dyn Annotation {
    /// Downcast to a concrete annotation type.
    #[must_use]
    pub fn downcast_ref<A: Annotation>(&self) -> Option<&A> {
        self.as_any().downcast_ref::<A>()
    }
}
