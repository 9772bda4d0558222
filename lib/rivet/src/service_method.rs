//! Per-method staging builder and the immutable descriptor it produces.
//!
//! Annotation handlers mutate a [`ServiceMethodBuilder`]; the resolver then
//! calls [`ServiceMethodBuilder::build`], which consumes the builder,
//! validates the accumulated state and freezes it into a
//! [`ServiceMethodDescriptor`].

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use rivet_core::{
    BodyKind, Capability, ConfigError, ConfigErrorKind, Converter, Error, Method, PathTemplate,
    Request, RequestBuilder, Response, ResponseBodyConverter, Result, TypeName,
};
use serde_json::Value;
use url::Url;

use crate::param::{ParameterHandler, ParameterRole};

type ConfigResult<T> = std::result::Result<T, ConfigError>;

/// Mutable state accumulated while resolving one method.
#[derive(Debug)]
pub struct ServiceMethodBuilder {
    service: String,
    name: String,
    arity: usize,
    http: Option<(Method, PathTemplate)>,
    headers: Vec<(String, String)>,
    body_kind: Option<BodyKind>,
    parameters: BTreeMap<usize, Arc<dyn ParameterHandler>>,
    response: Option<(TypeName, Arc<dyn ResponseBodyConverter>)>,
    asynchronous: bool,
}

impl ServiceMethodBuilder {
    /// A fresh builder for `service::name` with `arity` parameters.
    #[must_use]
    pub fn new(service: impl Into<String>, name: impl Into<String>, arity: usize) -> Self {
        Self {
            service: service.into(),
            name: name.into(),
            arity,
            http: None,
            headers: Vec::new(),
            body_kind: None,
            parameters: BTreeMap::new(),
            response: None,
            asynchronous: false,
        }
    }

    /// The method name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Number of declared parameters.
    #[must_use]
    pub const fn arity(&self) -> usize {
        self.arity
    }

    /// Set the verb and path template.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigErrorKind::DuplicateHttpMethod`] if already set.
    pub fn http_method(&mut self, method: Method, path: PathTemplate) -> ConfigResult<()> {
        if let Some((existing, _)) = &self.http {
            return Err(ConfigErrorKind::DuplicateHttpMethod {
                existing: *existing,
                new: method,
            }
            .into());
        }
        self.http = Some((method, path));
        Ok(())
    }

    /// Add a static header.
    pub fn header(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.headers.push((name.into(), value.into()));
    }

    /// Declare how the request body is encoded.
    ///
    /// Declaring the same kind again is a no-op, so every form field
    /// handler of a method may declare it.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigErrorKind::ConflictingBody`] if another kind was
    /// declared.
    pub fn body_kind(&mut self, kind: BodyKind) -> ConfigResult<()> {
        match self.body_kind {
            Some(first) if first != kind => Err(ConfigErrorKind::ConflictingBody {
                first,
                second: kind,
            }
            .into()),
            _ => {
                self.body_kind = Some(kind);
                Ok(())
            }
        }
    }

    /// Mark the method asynchronous.
    pub fn asynchronous(&mut self) {
        self.asynchronous = true;
    }

    /// Register the handler for the parameter at `index`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigErrorKind::ParameterOutOfRange`] or
    /// [`ConfigErrorKind::DuplicateParameter`].
    pub fn parameter(
        &mut self,
        index: usize,
        handler: impl ParameterHandler + 'static,
    ) -> ConfigResult<()> {
        if index >= self.arity {
            return Err(ConfigError::new(ConfigErrorKind::ParameterOutOfRange {
                index,
                arity: self.arity,
            })
            .at_parameter(Some(index)));
        }
        if self.parameters.contains_key(&index) {
            return Err(ConfigError::new(ConfigErrorKind::DuplicateParameter { index })
                .at_parameter(Some(index)));
        }
        self.parameters.insert(index, Arc::new(handler));
        Ok(())
    }

    /// Set the response type and converter.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigErrorKind::WrongConverter`] for a converter without
    /// response body capability, or
    /// [`ConfigErrorKind::DuplicateResponseConverter`] if already set.
    pub fn response(&mut self, ty: TypeName, converter: &Converter) -> ConfigResult<()> {
        let Some(converter) = converter.as_response_body() else {
            return Err(ConfigErrorKind::WrongConverter {
                required: Capability::ResponseBody,
                found: Converter::describe(Some(converter)),
            }
            .into());
        };
        if self.response.is_some() {
            return Err(ConfigErrorKind::DuplicateResponseConverter.into());
        }
        self.response = Some((ty, Arc::clone(converter)));
        Ok(())
    }

    /// Validate and freeze into a descriptor.
    ///
    /// # Errors
    ///
    /// Returns the first violated rule, located at this method.
    pub fn build(self) -> ConfigResult<Arc<ServiceMethodDescriptor>> {
        let service = self.service.clone();
        let name = self.name.clone();
        self.validate()
            .map(Arc::new)
            .map_err(|err| err.in_method(&service, &name))
    }

    fn validate(self) -> ConfigResult<ServiceMethodDescriptor> {
        let Some((method, path)) = self.http else {
            return Err(ConfigErrorKind::MissingHttpMethod.into());
        };

        let mut parameters = Vec::with_capacity(self.arity);
        for index in 0..self.arity {
            let handler = self.parameters.get(&index).ok_or_else(|| {
                ConfigError::new(ConfigErrorKind::MissingParameterHandler { index })
                    .at_parameter(Some(index))
            })?;
            parameters.push(Arc::clone(handler));
        }
        let roles: Vec<ParameterRole> = parameters.iter().map(|handler| handler.role()).collect();

        let body_kind = Self::resolve_body_kind(self.body_kind, &parameters)?;
        Self::check_url(&roles, &path)?;
        Self::check_placeholders(&roles, &path)?;

        let Some((response_type, response_converter)) = self.response else {
            return Err(ConfigErrorKind::MissingResponseConverter.into());
        };

        Ok(ServiceMethodDescriptor {
            service: self.service,
            name: self.name,
            method,
            path,
            headers: self.headers,
            body_kind,
            parameters,
            response_type,
            response_converter,
            asynchronous: self.asynchronous,
        })
    }

    fn resolve_body_kind(
        declared: Option<BodyKind>,
        parameters: &[Arc<dyn ParameterHandler>],
    ) -> ConfigResult<Option<BodyKind>> {
        let mut body_kind = declared;
        let mut raw_seen = false;
        for (index, handler) in parameters.iter().enumerate() {
            let Some(kind) = handler.body_kind() else {
                continue;
            };
            if kind == BodyKind::Raw {
                if raw_seen {
                    return Err(
                        ConfigError::new(ConfigErrorKind::DuplicateBody).at_parameter(Some(index))
                    );
                }
                raw_seen = true;
            }
            match body_kind {
                Some(first) if first != kind => {
                    return Err(ConfigError::new(ConfigErrorKind::ConflictingBody {
                        first,
                        second: kind,
                    })
                    .at_parameter(Some(index)));
                }
                _ => body_kind = Some(kind),
            }
        }
        Ok(body_kind)
    }

    fn check_url(roles: &[ParameterRole], path: &PathTemplate) -> ConfigResult<()> {
        let mut urls = roles
            .iter()
            .enumerate()
            .filter(|(_, role)| **role == ParameterRole::Url)
            .map(|(index, _)| index);

        match (urls.next(), urls.next()) {
            (Some(_), Some(second)) => {
                Err(ConfigError::new(ConfigErrorKind::DuplicateUrl).at_parameter(Some(second)))
            }
            (Some(index), None) if !path.is_empty() => Err(ConfigError::new(
                ConfigErrorKind::UrlWithPath {
                    path: path.to_string(),
                },
            )
            .at_parameter(Some(index))),
            (None, _) if path.is_empty() => Err(ConfigErrorKind::EmptyPath.into()),
            _ => Ok(()),
        }
    }

    fn check_placeholders(roles: &[ParameterRole], path: &PathTemplate) -> ConfigResult<()> {
        let placeholders = path.placeholders();
        let mut bound: Vec<&str> = Vec::new();

        for (index, role) in roles.iter().enumerate() {
            let ParameterRole::Path { name, .. } = role else {
                continue;
            };
            if bound.contains(&name.as_str()) {
                return Err(ConfigError::new(ConfigErrorKind::DuplicatePlaceholder {
                    name: name.clone(),
                })
                .at_parameter(Some(index)));
            }
            if !placeholders.contains(&name.as_str()) {
                return Err(ConfigError::new(ConfigErrorKind::UnknownPlaceholder {
                    name: name.clone(),
                })
                .at_parameter(Some(index)));
            }
            bound.push(name);
        }

        match placeholders.iter().find(|name| !bound.contains(*name)) {
            Some(name) => Err(ConfigErrorKind::UnresolvedPlaceholder {
                name: (*name).to_string(),
            }
            .into()),
            None => Ok(()),
        }
    }
}

/// Everything needed to turn one call into a request and decode its response.
pub struct ServiceMethodDescriptor {
    service: String,
    name: String,
    method: Method,
    path: PathTemplate,
    headers: Vec<(String, String)>,
    body_kind: Option<BodyKind>,
    parameters: Vec<Arc<dyn ParameterHandler>>,
    response_type: TypeName,
    response_converter: Arc<dyn ResponseBodyConverter>,
    asynchronous: bool,
}

impl ServiceMethodDescriptor {
    /// The owning service name.
    #[must_use]
    pub fn service(&self) -> &str {
        &self.service
    }

    /// The method name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The HTTP verb.
    #[must_use]
    pub const fn method(&self) -> Method {
        self.method
    }

    /// The path template.
    #[must_use]
    pub const fn path(&self) -> &PathTemplate {
        &self.path
    }

    /// Static headers.
    #[must_use]
    pub fn headers(&self) -> &[(String, String)] {
        &self.headers
    }

    /// How the body is produced, if there is one.
    #[must_use]
    pub const fn body_kind(&self) -> Option<BodyKind> {
        self.body_kind
    }

    /// Parameter handlers, indexed by position.
    #[must_use]
    pub fn parameters(&self) -> &[Arc<dyn ParameterHandler>] {
        &self.parameters
    }

    /// Number of parameters.
    #[must_use]
    pub fn arity(&self) -> usize {
        self.parameters.len()
    }

    /// The declared response type.
    #[must_use]
    pub const fn response_type(&self) -> &TypeName {
        &self.response_type
    }

    /// Whether calls return a deferred handle.
    #[must_use]
    pub const fn is_asynchronous(&self) -> bool {
        self.asynchronous
    }

    /// Build the request for one call.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidRequest`] on an argument count mismatch, or
    /// the first conversion error.
    pub fn build_request(&self, base_url: &Url, arguments: &[Value]) -> Result<Request> {
        if arguments.len() != self.arity() {
            return Err(Error::invalid_request(format!(
                "`{}::{}` takes {} arguments, {} given",
                self.service,
                self.name,
                self.arity(),
                arguments.len()
            )));
        }

        let mut builder =
            RequestBuilder::new(self.method, base_url.clone(), &self.path).body_kind(self.body_kind);
        for (name, value) in &self.headers {
            builder.header(name.clone(), value.clone());
        }
        for (handler, argument) in self.parameters.iter().zip(arguments) {
            handler.apply(&mut builder, argument)?;
        }
        builder.build()
    }

    /// Check the status and convert the response body.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Http`] for non-2xx statuses, or a conversion error.
    pub fn decode(&self, response: Response) -> Result<Value> {
        let response = response.error_for_status()?;
        self.response_converter
            .convert(response.body(), &self.response_type)
    }
}

impl fmt::Debug for ServiceMethodDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServiceMethodDescriptor")
            .field("service", &self.service)
            .field("name", &self.name)
            .field("method", &self.method)
            .field("path", &self.path)
            .field("headers", &self.headers)
            .field("body_kind", &self.body_kind)
            .field("parameters", &self.parameters)
            .field("response_type", &self.response_type)
            .field("asynchronous", &self.asynchronous)
            .finish_non_exhaustive()
    }
}

/// The listing form of a method, e.g.
///
/// ```text
/// fn get_user -> User
///     GET /users/{id}
///     #0 path `id`
/// ```
impl fmt::Display for ServiceMethodDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mode = if self.asynchronous { "async " } else { "" };
        writeln!(f, "{mode}fn {} -> {}", self.name, self.response_type)?;
        writeln!(f, "    {} {}", self.method, self.path)?;
        for (name, value) in &self.headers {
            writeln!(f, "    header {name}: {value}")?;
        }
        if let Some(kind) = self.body_kind {
            writeln!(f, "    {kind}")?;
        }
        for (index, handler) in self.parameters.iter().enumerate() {
            writeln!(f, "    #{index} {}", handler.role())?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use assert2::{check, let_assert};
    use rivet_core::{JsonConverter, ScalarStringConverter};

    use super::*;
    use crate::param::{BodyParameter, FieldParameter, PathParameter, QueryParameter, UrlParameter};

    fn json() -> Converter {
        Converter::ResponseBody(Arc::new(JsonConverter))
    }

    fn builder(arity: usize) -> ServiceMethodBuilder {
        let mut builder = ServiceMethodBuilder::new("UserApi", "get_user", arity);
        builder
            .response(TypeName::new("User"), &json())
            .expect("response");
        builder
    }

    fn path(name: &str) -> PathParameter {
        PathParameter::new(name, false, Arc::new(ScalarStringConverter))
    }

    fn kind(result: ConfigResult<Arc<ServiceMethodDescriptor>>) -> ConfigErrorKind {
        let_assert!(Err(err) = result);
        err.kind().clone()
    }

    #[test]
    fn builds_descriptor() {
        let mut builder = builder(2);
        builder
            .http_method(Method::Get, PathTemplate::new("/users/{id}"))
            .expect("verb");
        builder.header("Accept", "application/json");
        builder.parameter(0, path("id")).expect("path");
        builder
            .parameter(1, QueryParameter::new("fields", false, Arc::new(ScalarStringConverter)))
            .expect("query");

        let descriptor = builder.build().expect("build");
        check!(descriptor.method() == Method::Get);
        check!(descriptor.arity() == 2);
        check!(descriptor.body_kind().is_none());
        check!(!descriptor.is_asynchronous());
        check!(
            descriptor.to_string()
                == "fn get_user -> User\n    GET /users/{id}\n    header Accept: application/json\n    #0 path `id`\n    #1 query `fields`\n"
        );
    }

    #[test]
    fn missing_verb_fails() {
        let builder = builder(0);
        let_assert!(Err(err) = builder.build());
        check!(err.kind() == &ConfigErrorKind::MissingHttpMethod);
        check!(err.method() == Some("get_user"));
        check!(err.service() == Some("UserApi"));
    }

    #[test]
    fn verb_cannot_be_set_twice() {
        let mut builder = builder(0);
        builder
            .http_method(Method::Get, PathTemplate::new("/a"))
            .expect("first");
        let err = builder
            .http_method(Method::Post, PathTemplate::new("/b"))
            .expect_err("second");
        check!(
            err.kind()
                == &ConfigErrorKind::DuplicateHttpMethod {
                    existing: Method::Get,
                    new: Method::Post,
                }
        );
    }

    #[test]
    fn duplicate_index_rejected_at_registration() {
        let mut builder = builder(1);
        builder.parameter(0, path("id")).expect("first");
        let err = builder.parameter(0, path("id")).expect_err("second");
        check!(err.kind() == &ConfigErrorKind::DuplicateParameter { index: 0 });
        check!(err.parameter() == Some(0));
    }

    #[test]
    fn index_must_be_below_arity() {
        let mut builder = builder(1);
        let err = builder.parameter(1, path("id")).expect_err("out of range");
        check!(err.kind() == &ConfigErrorKind::ParameterOutOfRange { index: 1, arity: 1 });
    }

    #[test]
    fn every_parameter_needs_a_handler() {
        let mut builder = builder(2);
        builder
            .http_method(Method::Get, PathTemplate::new("/users/{id}"))
            .expect("verb");
        builder.parameter(0, path("id")).expect("path");
        check!(kind(builder.build()) == ConfigErrorKind::MissingParameterHandler { index: 1 });
    }

    #[test]
    fn form_and_raw_body_conflict() {
        let mut builder = builder(2);
        builder
            .http_method(Method::Post, PathTemplate::new("/users"))
            .expect("verb");
        builder
            .parameter(0, FieldParameter::new("name", false, Arc::new(ScalarStringConverter)))
            .expect("field");
        builder
            .parameter(1, BodyParameter::new(Arc::new(JsonConverter)))
            .expect("body");
        check!(
            kind(builder.build())
                == ConfigErrorKind::ConflictingBody {
                    first: BodyKind::FormUrlEncoded,
                    second: BodyKind::Raw,
                }
        );
    }

    #[test]
    fn only_one_raw_body() {
        let mut builder = builder(2);
        builder
            .http_method(Method::Post, PathTemplate::new("/users"))
            .expect("verb");
        builder
            .parameter(0, BodyParameter::new(Arc::new(JsonConverter)))
            .expect("body");
        builder
            .parameter(1, BodyParameter::new(Arc::new(JsonConverter)))
            .expect("body");
        check!(kind(builder.build()) == ConfigErrorKind::DuplicateBody);
    }

    #[test]
    fn declared_body_kind_reaches_the_descriptor() {
        let mut builder = builder(0);
        builder
            .http_method(Method::Post, PathTemplate::new("/login"))
            .expect("verb");
        builder.body_kind(BodyKind::FormUrlEncoded).expect("form");
        builder.body_kind(BodyKind::FormUrlEncoded).expect("same kind again");
        let_assert!(Err(err) = builder.body_kind(BodyKind::Multipart));
        check!(
            err.kind()
                == &ConfigErrorKind::ConflictingBody {
                    first: BodyKind::FormUrlEncoded,
                    second: BodyKind::Multipart,
                }
        );

        let descriptor = builder.build().expect("build");
        check!(descriptor.body_kind() == Some(BodyKind::FormUrlEncoded));
    }

    /// Writes a raw body under a role of its own.
    #[derive(Debug)]
    struct SignedBody;

    impl ParameterHandler for SignedBody {
        fn role(&self) -> ParameterRole {
            ParameterRole::Custom("signed body".to_string())
        }

        fn body_kind(&self) -> Option<BodyKind> {
            Some(BodyKind::Raw)
        }

        fn apply(&self, builder: &mut RequestBuilder, value: &Value) -> Result<()> {
            builder.body(rivet_core::RequestBody::new(
                "application/json",
                rivet_core::to_json(value)?,
            ))
        }
    }

    #[test]
    fn custom_raw_body_conflicts_with_declared_form() {
        let mut builder = builder(1);
        builder
            .http_method(Method::Post, PathTemplate::new("/upload"))
            .expect("verb");
        builder.body_kind(BodyKind::FormUrlEncoded).expect("form");
        builder.parameter(0, SignedBody).expect("custom");
        let_assert!(Err(err) = builder.build());
        check!(
            err.kind()
                == &ConfigErrorKind::ConflictingBody {
                    first: BodyKind::FormUrlEncoded,
                    second: BodyKind::Raw,
                }
        );
        check!(err.parameter() == Some(0));
    }

    #[test]
    fn placeholders_must_match_path_parameters() {
        let mut unresolved = builder(0);
        unresolved
            .http_method(Method::Get, PathTemplate::new("/users/{id}"))
            .expect("verb");
        check!(
            kind(unresolved.build())
                == ConfigErrorKind::UnresolvedPlaceholder {
                    name: "id".to_string()
                }
        );

        let mut unknown = builder(1);
        unknown
            .http_method(Method::Get, PathTemplate::new("/users"))
            .expect("verb");
        unknown.parameter(0, path("id")).expect("path");
        check!(
            kind(unknown.build())
                == ConfigErrorKind::UnknownPlaceholder {
                    name: "id".to_string()
                }
        );

        let mut duplicate = builder(2);
        duplicate
            .http_method(Method::Get, PathTemplate::new("/users/{id}"))
            .expect("verb");
        duplicate.parameter(0, path("id")).expect("path");
        duplicate.parameter(1, path("id")).expect("path");
        check!(
            kind(duplicate.build())
                == ConfigErrorKind::DuplicatePlaceholder {
                    name: "id".to_string()
                }
        );
    }

    #[test]
    fn dynamic_url_requires_empty_path() {
        let mut with_path = builder(1);
        with_path
            .http_method(Method::Get, PathTemplate::new("/users"))
            .expect("verb");
        with_path
            .parameter(0, UrlParameter::new(Arc::new(ScalarStringConverter)))
            .expect("url");
        check!(
            kind(with_path.build())
                == ConfigErrorKind::UrlWithPath {
                    path: "/users".to_string()
                }
        );

        let mut empty = builder(0);
        empty
            .http_method(Method::Get, PathTemplate::default())
            .expect("verb");
        check!(kind(empty.build()) == ConfigErrorKind::EmptyPath);
    }

    #[test]
    fn response_converter_is_required_and_unique() {
        let mut builder = ServiceMethodBuilder::new("UserApi", "ping", 0);
        builder
            .http_method(Method::Get, PathTemplate::new("/ping"))
            .expect("verb");
        let err = builder
            .response(
                TypeName::unit(),
                &Converter::String(Arc::new(ScalarStringConverter)),
            )
            .expect_err("string converter");
        check!(
            err.kind()
                == &ConfigErrorKind::WrongConverter {
                    required: Capability::ResponseBody,
                    found: "string converter",
                }
        );
        check!(kind(builder.build()) == ConfigErrorKind::MissingResponseConverter);
    }

    #[test]
    fn build_request_checks_arity() {
        let mut builder = builder(1);
        builder
            .http_method(Method::Get, PathTemplate::new("/users/{id}"))
            .expect("verb");
        builder.parameter(0, path("id")).expect("path");
        let descriptor = builder.build().expect("build");

        let base = Url::parse("http://localhost").expect("valid URL");
        let request = descriptor
            .build_request(&base, &[serde_json::json!(42)])
            .expect("request");
        check!(request.url().path() == "/users/42");

        let_assert!(Err(Error::InvalidRequest(_)) = descriptor.build_request(&base, &[]));
    }
}
