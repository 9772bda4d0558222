//! Service declarations: the annotation source the resolver reads.
//!
//! Declarations are usually produced by `#[rivet::service]`, but can be
//! written by hand:
//!
//! ```
//! use rivet::annotation::{Http, Path};
//! use rivet::{MethodDeclaration, ParameterDeclaration, ServiceDeclaration};
//!
//! let declaration = ServiceDeclaration::new("UserApi").method(
//!     MethodDeclaration::new("get_user")
//!         .annotate(Http::get("/users/{id}"))
//!         .parameter(ParameterDeclaration::new("id", "u64").annotate(Path::new("id")))
//!         .returns("User"),
//! );
//! assert_eq!(declaration.methods().len(), 1);
//! ```

use std::sync::Arc;

use rivet_core::{Annotation, TypeName};

/// A service interface: a name and its methods.
#[derive(Debug, Clone)]
pub struct ServiceDeclaration {
    name: String,
    methods: Vec<MethodDeclaration>,
}

impl ServiceDeclaration {
    /// An empty service.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            methods: Vec::new(),
        }
    }

    /// Add a method.
    #[must_use]
    pub fn method(mut self, method: MethodDeclaration) -> Self {
        self.methods.push(method);
        self
    }

    /// The service name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The methods, in declaration order.
    #[must_use]
    pub fn methods(&self) -> &[MethodDeclaration] {
        &self.methods
    }
}

/// One service method: annotations, parameters and return type.
#[derive(Debug, Clone)]
pub struct MethodDeclaration {
    name: String,
    annotations: Vec<Arc<dyn Annotation>>,
    parameters: Vec<ParameterDeclaration>,
    returns: TypeName,
}

impl MethodDeclaration {
    /// A method returning `()`.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            annotations: Vec::new(),
            parameters: Vec::new(),
            returns: TypeName::unit(),
        }
    }

    /// Add a method-level annotation.
    #[must_use]
    pub fn annotate(self, annotation: impl Annotation) -> Self {
        self.annotate_shared(Arc::new(annotation))
    }

    /// Add a shared method-level annotation.
    #[must_use]
    pub fn annotate_shared(mut self, annotation: Arc<dyn Annotation>) -> Self {
        self.annotations.push(annotation);
        self
    }

    /// Add the next positional parameter.
    #[must_use]
    pub fn parameter(mut self, parameter: ParameterDeclaration) -> Self {
        self.parameters.push(parameter);
        self
    }

    /// Set the declared return type.
    #[must_use]
    pub fn returns(mut self, ty: impl AsRef<str>) -> Self {
        self.returns = TypeName::new(ty);
        self
    }

    /// The method name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Method-level annotations, in declaration order.
    #[must_use]
    pub fn annotations(&self) -> &[Arc<dyn Annotation>] {
        &self.annotations
    }

    /// Parameters, in positional order.
    #[must_use]
    pub fn parameters(&self) -> &[ParameterDeclaration] {
        &self.parameters
    }

    /// The declared return type.
    #[must_use]
    pub const fn return_type(&self) -> &TypeName {
        &self.returns
    }
}

/// One method parameter.
#[derive(Debug, Clone)]
pub struct ParameterDeclaration {
    name: String,
    ty: TypeName,
    annotations: Vec<Arc<dyn Annotation>>,
}

impl ParameterDeclaration {
    /// A parameter of the given declared type.
    #[must_use]
    pub fn new(name: impl Into<String>, ty: impl AsRef<str>) -> Self {
        Self {
            name: name.into(),
            ty: TypeName::new(ty),
            annotations: Vec::new(),
        }
    }

    /// Add an annotation.
    #[must_use]
    pub fn annotate(self, annotation: impl Annotation) -> Self {
        self.annotate_shared(Arc::new(annotation))
    }

    /// Add a shared annotation.
    #[must_use]
    pub fn annotate_shared(mut self, annotation: Arc<dyn Annotation>) -> Self {
        self.annotations.push(annotation);
        self
    }

    /// The parameter name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The declared type.
    #[must_use]
    pub const fn ty(&self) -> &TypeName {
        &self.ty
    }

    /// Annotations, in declaration order.
    #[must_use]
    pub fn annotations(&self) -> &[Arc<dyn Annotation>] {
        &self.annotations
    }
}
