//! Client generation: a two-phase visitor over a [`ServiceDefinition`].
//!
//! [`Generator::drive`] calls [`Emitter::emit_start`] once, then
//! [`Emitter::emit_method`] for every method in declaration order, then
//! [`Emitter::finish`]. Two backends ship with the crate:
//! - [`ProxyEmitter`] builds the working [`GeneratedService`],
//! - [`ListingEmitter`] renders a readable listing of the generated client.

mod deferred;
mod listing;
mod proxy;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::debug;

pub use self::deferred::Deferred;
pub use self::listing::ListingEmitter;
pub use self::proxy::{GeneratedMethod, GeneratedService, ProxyEmitter};

use crate::resolver::ServiceDefinition;
use crate::service_method::ServiceMethodDescriptor;
use crate::{HttpClient, Result};

/// A generation backend.
pub trait Emitter {
    /// What the backend produces.
    type Output;

    /// Start phase: the service identity and base URL.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend cannot start.
    fn emit_start(&mut self, definition: &ServiceDefinition) -> Result<()>;

    /// Method phase, once per descriptor.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend cannot emit the method.
    fn emit_method(&mut self, method: &Arc<ServiceMethodDescriptor>) -> Result<()>;

    /// Produce the output.
    ///
    /// # Errors
    ///
    /// Returns an error if the start phase never ran.
    fn finish(self) -> Result<Self::Output>;
}

/// Drives emitters over resolved services.
#[derive(Debug, Clone, Default)]
pub struct Generator {
    cache_dir: Option<PathBuf>,
}

impl Generator {
    /// A generator that writes no listing.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Write a listing of each generated service to `dir`.
    #[must_use]
    pub fn with_cache_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.cache_dir = Some(dir.into());
        self
    }

    /// The listing directory, if any.
    #[must_use]
    pub fn cache_dir(&self) -> Option<&Path> {
        self.cache_dir.as_deref()
    }

    /// Run `emitter` over `definition`.
    ///
    /// # Errors
    ///
    /// Returns the first emitter error.
    pub fn drive<E: Emitter>(&self, definition: &ServiceDefinition, mut emitter: E) -> Result<E::Output> {
        emitter.emit_start(definition)?;
        for method in definition.methods() {
            emitter.emit_method(method)?;
        }
        emitter.finish()
    }

    /// Generate the client for `definition`, writing its listing when a cache
    /// directory is set.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::Cache`] if the listing cannot be written.
    pub fn generate(
        &self,
        definition: &ServiceDefinition,
        client: Arc<dyn HttpClient>,
    ) -> Result<GeneratedService> {
        if let Some(dir) = &self.cache_dir {
            let listing = self.drive(definition, ListingEmitter::new())?;
            let path = write_listing(dir, definition.name(), &listing)?;
            debug!(service = definition.name(), path = %path.display(), "wrote listing");
        }

        let service = self.drive(definition, ProxyEmitter::new(client))?;
        debug!(
            service = definition.name(),
            methods = definition.methods().len(),
            "generated service"
        );
        Ok(service)
    }
}

fn write_listing(dir: &Path, service: &str, listing: &str) -> Result<PathBuf> {
    std::fs::create_dir_all(dir)?;
    let path = dir.join(listing_file_name(service));
    std::fs::write(&path, listing)?;
    Ok(path)
}

/// `<service>.rivet`, with anything but ASCII alphanumerics, `_`, `-`
/// and `.` replaced so the file stays inside the cache directory.
fn listing_file_name(service: &str) -> String {
    let stem: String = service
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.') {
                c
            } else {
                '_'
            }
        })
        .collect();
    format!("{stem}.rivet")
}
