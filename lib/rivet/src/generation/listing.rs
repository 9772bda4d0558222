//! Text listing of a generated client.

use std::sync::Arc;

use super::Emitter;
use crate::resolver::ServiceDefinition;
use crate::service_method::ServiceMethodDescriptor;
use crate::{Error, Result};

/// Renders a readable listing of the generated client, one block per method.
#[derive(Debug, Default)]
pub struct ListingEmitter {
    listing: Option<String>,
}

impl ListingEmitter {
    /// An empty listing.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl Emitter for ListingEmitter {
    type Output = String;

    fn emit_start(&mut self, definition: &ServiceDefinition) -> Result<()> {
        self.listing = Some(format!(
            "service {} @ {}\n",
            definition.name(),
            definition.base_url()
        ));
        Ok(())
    }

    fn emit_method(&mut self, method: &Arc<ServiceMethodDescriptor>) -> Result<()> {
        let listing = self
            .listing
            .as_mut()
            .ok_or_else(|| Error::invalid_request("no service started"))?;
        listing.push('\n');
        listing.push_str(&method.to_string());
        Ok(())
    }

    fn finish(self) -> Result<String> {
        self.listing
            .ok_or_else(|| Error::invalid_request("no service started"))
    }
}

#[cfg(test)]
mod tests {
    use url::Url;

    use super::*;
    use crate::annotation::{Field, Http};
    use crate::declaration::{MethodDeclaration, ParameterDeclaration, ServiceDeclaration};
    use crate::generation::Generator;
    use crate::resolver::ServiceResolver;

    #[test]
    fn listing_matches_definition_display() {
        let declaration = ServiceDeclaration::new("FormApi").method(
            MethodDeclaration::new("submit")
                .annotate(Http::post("/submit"))
                .parameter(
                    ParameterDeclaration::new("name", "String")
                        .annotate(Field::new("name").encoded()),
                )
                .returns("Receipt"),
        );
        let base_url = Url::parse("https://forms.example.com").expect("valid URL");
        let definition = ServiceResolver::default()
            .resolve(&declaration, &base_url)
            .expect("resolved");

        let listing = Generator::new()
            .drive(&definition, ListingEmitter::new())
            .expect("listing");
        assert_eq!(listing, definition.to_string());
        assert_eq!(
            listing,
            "service FormApi @ https://forms.example.com/\n\
             \n\
             fn submit -> Receipt\n    \
             POST /submit\n    \
             form-url-encoded body\n    \
             #0 field `name` (encoded)\n"
        );
    }

    #[test]
    fn methods_need_a_started_service() {
        assert!(ListingEmitter::new().finish().is_err());
    }
}
