//! The entry point: configure once, create service clients from it.

use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

use rivet_core::{ConfigErrorKind, ConverterFactory};
use tracing::debug;
use url::Url;

use crate::declaration::ServiceDeclaration;
use crate::generation::{GeneratedService, Generator};
use crate::resolver::{ServiceDefinition, ServiceResolver};
use crate::{HttpClient, HyperClient, Result};

/// A typed client that can be created by [`Rivet::create`].
///
/// Implemented by the `#[rivet::service]` macro for the generated
/// `<Trait>Client` struct.
pub trait ServiceInterface: Sized {
    /// The annotated declaration of the service.
    fn declaration() -> ServiceDeclaration;

    /// Wrap the generated service.
    fn from_service(service: GeneratedService) -> Self;
}

/// Resolves declarations and generates clients sharing one base URL and
/// one HTTP client.
///
/// # Example
///
/// ```ignore
/// use rivet::prelude::*;
///
/// #[rivet::service]
/// pub trait UserApi {
///     #[get("/users/{id}")]
///     async fn get_user(&self, #[path] id: u64) -> rivet::Result<User>;
/// }
///
/// let rivet = Rivet::builder().base_url("https://api.example.com").build()?;
/// let users: UserApiClient = rivet.create()?;
/// let user = users.get_user(42).await?;
/// ```
#[derive(Clone)]
pub struct Rivet {
    base_url: Url,
    client: Arc<dyn HttpClient>,
    resolver: ServiceResolver,
    generator: Generator,
}

impl fmt::Debug for Rivet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Rivet")
            .field("base_url", &self.base_url.as_str())
            .field("resolver", &self.resolver)
            .field("generator", &self.generator)
            .finish_non_exhaustive()
    }
}

impl Rivet {
    /// Create a builder.
    #[must_use]
    pub fn builder() -> RivetBuilder {
        RivetBuilder::default()
    }

    /// The base URL.
    #[must_use]
    pub const fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// The resolver.
    #[must_use]
    pub const fn resolver(&self) -> &ServiceResolver {
        &self.resolver
    }

    /// The generator.
    #[must_use]
    pub const fn generator(&self) -> &Generator {
        &self.generator
    }

    /// Create a typed client.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if the declaration is invalid, or a
    /// cache error if the listing cannot be written.
    pub fn create<S: ServiceInterface>(&self) -> Result<S> {
        let service = self.generate(&S::declaration())?;
        Ok(S::from_service(service))
    }

    /// Resolve a declaration against the base URL.
    ///
    /// # Errors
    ///
    /// Returns the first configuration error.
    pub fn resolve(&self, declaration: &ServiceDeclaration) -> Result<ServiceDefinition> {
        Ok(self.resolver.resolve(declaration, &self.base_url)?)
    }

    /// Resolve a declaration and generate its client.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if the declaration is invalid, or a
    /// cache error if the listing cannot be written.
    pub fn generate(&self, declaration: &ServiceDeclaration) -> Result<GeneratedService> {
        let definition = self.resolve(declaration)?;
        let service = self
            .generator
            .generate(&definition, Arc::clone(&self.client))?;
        debug!(service = service.name(), base_url = %self.base_url, "created service");
        Ok(service)
    }
}

/// Builder for [`Rivet`]. Every unset component gets its default in
/// [`RivetBuilder::build`].
#[derive(Default)]
pub struct RivetBuilder {
    base_url: Option<String>,
    client: Option<Arc<dyn HttpClient>>,
    converter_factories: Vec<Arc<dyn ConverterFactory>>,
    resolver: Option<ServiceResolver>,
    generator: Option<Generator>,
    cache_dir: Option<PathBuf>,
    without_cache: bool,
}

impl fmt::Debug for RivetBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RivetBuilder")
            .field("base_url", &self.base_url)
            .field("client", &self.client.is_some())
            .field("converter_factories", &self.converter_factories)
            .field("resolver", &self.resolver)
            .field("generator", &self.generator)
            .field("cache_dir", &self.cache_dir)
            .field("without_cache", &self.without_cache)
            .finish()
    }
}

impl RivetBuilder {
    /// Set the base URL. Paths are joined to it, so keep a trailing `/` to
    /// preserve a base path.
    #[must_use]
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }

    /// Set the HTTP client. Defaults to [`HyperClient::new`].
    #[must_use]
    pub fn client(self, client: impl HttpClient + 'static) -> Self {
        self.shared_client(Arc::new(client))
    }

    /// Set a shared HTTP client.
    #[must_use]
    pub fn shared_client(mut self, client: Arc<dyn HttpClient>) -> Self {
        self.client = Some(client);
        self
    }

    /// Add a converter factory to the resolver.
    #[must_use]
    pub fn converter_factory(mut self, factory: impl ConverterFactory + 'static) -> Self {
        self.converter_factories.push(Arc::new(factory));
        self
    }

    /// Set the resolver. Defaults to [`ServiceResolver::default`].
    #[must_use]
    pub fn resolver(mut self, resolver: ServiceResolver) -> Self {
        self.resolver = Some(resolver);
        self
    }

    /// Set the generator. When set, the cache directory is ignored.
    #[must_use]
    pub fn generator(mut self, generator: Generator) -> Self {
        self.generator = Some(generator);
        self
    }

    /// Set the listing directory. Defaults to `rivet` in the system
    /// temporary directory.
    #[must_use]
    pub fn cache_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.cache_dir = Some(dir.into());
        self
    }

    /// Do not write listings.
    #[must_use]
    pub const fn without_cache(mut self) -> Self {
        self.without_cache = true;
        self
    }

    /// Build the [`Rivet`].
    ///
    /// # Errors
    ///
    /// Returns [`ConfigErrorKind::MissingBaseUrl`] if no base URL was set, or
    /// [`crate::Error::InvalidUrl`] if it does not parse.
    pub fn build(self) -> Result<Rivet> {
        let base_url = self.base_url.ok_or(ConfigErrorKind::MissingBaseUrl)?;
        let base_url = Url::parse(&base_url)?;

        let client = self
            .client
            .unwrap_or_else(|| Arc::new(HyperClient::new()) as Arc<dyn HttpClient>);

        let mut resolver = self.resolver.unwrap_or_default();
        for factory in self.converter_factories {
            resolver.add_converter_factory(factory);
        }

        let generator = match (self.generator, self.without_cache) {
            (Some(generator), _) => generator,
            (None, true) => Generator::new(),
            (None, false) => Generator::new().with_cache_dir(
                self.cache_dir
                    .unwrap_or_else(|| std::env::temp_dir().join("rivet")),
            ),
        };

        Ok(Rivet {
            base_url,
            client,
            resolver,
            generator,
        })
    }
}
