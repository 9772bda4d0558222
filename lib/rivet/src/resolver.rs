//! Service resolution: declarations in, immutable definitions out.

use std::fmt;
use std::sync::Arc;

use rivet_core::{
    Annotation, Capability, ConfigError, ConfigErrorKind, ConverterFactory, ConverterRegistry,
    Target, TypeName,
};
use tracing::debug;
use url::Url;

use crate::declaration::{MethodDeclaration, ServiceDeclaration};
use crate::handler::{AnnotationHandler, HandlerRegistry};
use crate::service_method::{ServiceMethodBuilder, ServiceMethodDescriptor};

/// A resolved service: name, base URL and one descriptor per method.
#[derive(Debug, Clone)]
pub struct ServiceDefinition {
    name: String,
    base_url: Url,
    methods: Vec<Arc<ServiceMethodDescriptor>>,
}

impl ServiceDefinition {
    /// The service name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The base URL every request path is joined to.
    #[must_use]
    pub const fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// The descriptors, in declaration order.
    #[must_use]
    pub fn methods(&self) -> &[Arc<ServiceMethodDescriptor>] {
        &self.methods
    }

    /// The descriptor of a method.
    #[must_use]
    pub fn method(&self, name: &str) -> Option<&Arc<ServiceMethodDescriptor>> {
        self.methods.iter().find(|method| method.name() == name)
    }
}

impl fmt::Display for ServiceDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "service {} @ {}", self.name, self.base_url)?;
        for method in &self.methods {
            writeln!(f)?;
            write!(f, "{method}")?;
        }
        Ok(())
    }
}

/// Turns service declarations into definitions.
///
/// Resolution is fail-fast: the first configuration error aborts the whole
/// service.
#[derive(Debug, Clone, Default)]
pub struct ServiceResolver {
    handlers: HandlerRegistry,
    converters: ConverterRegistry,
}

impl ServiceResolver {
    /// A resolver with explicit handler and converter registries.
    #[must_use]
    pub const fn new(handlers: HandlerRegistry, converters: ConverterRegistry) -> Self {
        Self {
            handlers,
            converters,
        }
    }

    /// Register an extra annotation handler.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigErrorKind::DuplicateHandler`] if the variant is taken.
    pub fn with_handler(
        mut self,
        handler: impl AnnotationHandler + 'static,
    ) -> Result<Self, ConfigError> {
        self.handlers.register(Arc::new(handler))?;
        Ok(self)
    }

    /// Add a converter factory, consulted before the built-in fallback.
    #[must_use]
    pub fn with_converter_factory(mut self, factory: impl ConverterFactory + 'static) -> Self {
        self.converters.add_factory(Arc::new(factory));
        self
    }

    /// Add a shared converter factory.
    pub fn add_converter_factory(&mut self, factory: Arc<dyn ConverterFactory>) {
        self.converters.add_factory(factory);
    }

    /// The annotation handler table.
    #[must_use]
    pub const fn handlers(&self) -> &HandlerRegistry {
        &self.handlers
    }

    /// The converter registry.
    #[must_use]
    pub const fn converters(&self) -> &ConverterRegistry {
        &self.converters
    }

    /// Resolve every method of `declaration`.
    ///
    /// # Errors
    ///
    /// Returns the first [`ConfigError`], located at its service, method and
    /// parameter.
    pub fn resolve(
        &self,
        declaration: &ServiceDeclaration,
        base_url: &Url,
    ) -> Result<ServiceDefinition, ConfigError> {
        let service = declaration.name();
        let methods = declaration
            .methods()
            .iter()
            .map(|method| {
                self.resolve_method(service, method)
                    .map_err(|err| err.in_method(service, method.name()))
            })
            .collect::<Result<Vec<_>, _>>()?;

        debug!(service, methods = methods.len(), base_url = %base_url, "resolved service");
        Ok(ServiceDefinition {
            name: service.to_string(),
            base_url: base_url.clone(),
            methods,
        })
    }

    fn resolve_method(
        &self,
        service: &str,
        declaration: &MethodDeclaration,
    ) -> Result<Arc<ServiceMethodDescriptor>, ConfigError> {
        let parameters = declaration.parameters();
        let mut builder = ServiceMethodBuilder::new(service, declaration.name(), parameters.len());

        for annotation in declaration.annotations() {
            self.apply(annotation.as_ref(), Target::Method, &mut builder, None, None)?;
        }

        for (index, parameter) in parameters.iter().enumerate() {
            for annotation in parameter.annotations() {
                self.apply(
                    annotation.as_ref(),
                    Target::Parameter,
                    &mut builder,
                    Some(parameter.ty()),
                    Some(index),
                )
                .map_err(|err| err.at_parameter(Some(index)))?;
            }
        }

        let response = self
            .converters
            .resolve(declaration.return_type(), Capability::ResponseBody)?;
        builder.response(declaration.return_type().clone(), &response)?;

        let descriptor = builder.build()?;
        debug!(
            service,
            method = descriptor.name(),
            http_method = %descriptor.method(),
            path = %descriptor.path(),
            asynchronous = descriptor.is_asynchronous(),
            "resolved method"
        );
        Ok(descriptor)
    }

    fn apply(
        &self,
        annotation: &dyn Annotation,
        declared_on: Target,
        builder: &mut ServiceMethodBuilder,
        ty: Option<&TypeName>,
        index: Option<usize>,
    ) -> Result<(), ConfigError> {
        let variant = annotation.variant();
        let handler = self
            .handlers
            .get(variant)
            .ok_or(ConfigErrorKind::UnknownAnnotation { variant })?;

        if annotation.target() != declared_on {
            return Err(ConfigErrorKind::MisplacedAnnotation {
                variant,
                target: declared_on,
            }
            .into());
        }

        let converter = match (annotation.required_capability(), ty) {
            (Some(capability), Some(ty)) => Some(self.converters.resolve(ty, capability)?),
            _ => None,
        };

        handler.handle(annotation, builder, converter.as_ref(), index)
    }
}
