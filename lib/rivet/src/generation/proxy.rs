//! The runtime client: descriptors compiled into callable methods.

use std::fmt;
use std::sync::Arc;

use futures_util::FutureExt;
use futures_util::future::BoxFuture;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::trace;
use url::Url;

use super::{Deferred, Emitter};
use crate::resolver::ServiceDefinition;
use crate::service_method::ServiceMethodDescriptor;
use crate::{Error, HttpClient, Result, from_value};

/// One compiled method of a generated client.
#[derive(Debug, Clone)]
pub struct GeneratedMethod {
    descriptor: Arc<ServiceMethodDescriptor>,
}

impl GeneratedMethod {
    /// Compile a descriptor.
    #[must_use]
    pub const fn new(descriptor: Arc<ServiceMethodDescriptor>) -> Self {
        Self { descriptor }
    }

    /// The method name.
    #[must_use]
    pub fn name(&self) -> &str {
        self.descriptor.name()
    }

    /// The descriptor this method was compiled from.
    #[must_use]
    pub const fn descriptor(&self) -> &Arc<ServiceMethodDescriptor> {
        &self.descriptor
    }

    /// Build the request, hand it to `client` and attach response decoding.
    ///
    /// The request is built eagerly, so argument errors surface before the
    /// returned future is polled.
    ///
    /// # Errors
    ///
    /// Returns an argument count or conversion error.
    pub fn invoke(
        &self,
        base_url: &Url,
        client: &dyn HttpClient,
        arguments: &[Value],
    ) -> Result<BoxFuture<'static, Result<Value>>> {
        let request = self.descriptor.build_request(base_url, arguments)?;
        trace!(
            service = self.descriptor.service(),
            method = self.descriptor.name(),
            http_method = %request.method(),
            url = %request.url(),
            "dispatching call"
        );

        let response = client.execute(request);
        let descriptor = Arc::clone(&self.descriptor);
        Ok(async move { descriptor.decode(response.await?) }.boxed())
    }
}

struct ServiceInner {
    name: String,
    base_url: Url,
    client: Arc<dyn HttpClient>,
    methods: Vec<GeneratedMethod>,
}

/// A generated client: dispatches named calls through an [`HttpClient`].
///
/// Cloning is cheap; clones share the client and the compiled methods.
#[derive(Clone)]
pub struct GeneratedService {
    inner: Arc<ServiceInner>,
}

impl fmt::Debug for GeneratedService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GeneratedService")
            .field("name", &self.inner.name)
            .field("base_url", &self.inner.base_url.as_str())
            .field("methods", &self.inner.methods.len())
            .finish_non_exhaustive()
    }
}

impl GeneratedService {
    /// The service name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.inner.name
    }

    /// The base URL.
    #[must_use]
    pub fn base_url(&self) -> &Url {
        &self.inner.base_url
    }

    /// The compiled methods, in declaration order.
    pub fn methods(&self) -> impl Iterator<Item = &GeneratedMethod> {
        self.inner.methods.iter()
    }

    /// A compiled method by name.
    #[must_use]
    pub fn method(&self, name: &str) -> Option<&GeneratedMethod> {
        self.inner.methods.iter().find(|method| method.name() == name)
    }

    fn lookup(&self, name: &str, asynchronous: bool) -> Result<&GeneratedMethod> {
        let method = self.method(name).ok_or_else(|| {
            Error::invalid_request(format!("`{}` has no method `{name}`", self.inner.name))
        })?;

        match (method.descriptor.is_asynchronous(), asynchronous) {
            (true, false) => Err(Error::invalid_request(format!(
                "`{}::{name}` is asynchronous and must be called through `call_deferred`",
                self.inner.name
            ))),
            (false, true) => Err(Error::invalid_request(format!(
                "`{}::{name}` is synchronous and must be called through `call`",
                self.inner.name
            ))),
            _ => Ok(method),
        }
    }

    /// Call a synchronous method and decode its response into `T`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidRequest`] for an unknown or asynchronous
    /// method or a wrong argument count, the transport error, or a
    /// conversion error.
    pub async fn call<T: DeserializeOwned>(&self, name: &str, arguments: &[Value]) -> Result<T> {
        let method = self.lookup(name, false)?;
        let response = method.invoke(&self.inner.base_url, self.inner.client.as_ref(), arguments)?;
        from_value(response.await?)
    }

    /// Start an asynchronous method and return its deferred result.
    ///
    /// The request is sent when the returned [`Deferred`] is first polled.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidRequest`] for an unknown or synchronous
    /// method or a wrong argument count, or a conversion error while
    /// building the request.
    pub fn call_deferred<T>(&self, name: &str, arguments: &[Value]) -> Result<Deferred<T>>
    where
        T: DeserializeOwned + Send + 'static,
    {
        let method = self.lookup(name, true)?;
        let response = method.invoke(&self.inner.base_url, self.inner.client.as_ref(), arguments)?;
        Ok(Deferred::new(async move { from_value(response.await?) }))
    }
}

/// The default backend: compiles every descriptor into a [`GeneratedMethod`].
pub struct ProxyEmitter {
    client: Arc<dyn HttpClient>,
    service: Option<(String, Url)>,
    methods: Vec<GeneratedMethod>,
}

impl ProxyEmitter {
    /// A backend dispatching through `client`.
    #[must_use]
    pub fn new(client: Arc<dyn HttpClient>) -> Self {
        Self {
            client,
            service: None,
            methods: Vec::new(),
        }
    }
}

impl fmt::Debug for ProxyEmitter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProxyEmitter")
            .field("service", &self.service)
            .field("methods", &self.methods.len())
            .finish_non_exhaustive()
    }
}

impl Emitter for ProxyEmitter {
    type Output = GeneratedService;

    fn emit_start(&mut self, definition: &ServiceDefinition) -> Result<()> {
        self.service = Some((definition.name().to_string(), definition.base_url().clone()));
        self.methods.clear();
        Ok(())
    }

    fn emit_method(&mut self, method: &Arc<ServiceMethodDescriptor>) -> Result<()> {
        self.methods.push(GeneratedMethod::new(Arc::clone(method)));
        Ok(())
    }

    fn finish(self) -> Result<GeneratedService> {
        let Some((name, base_url)) = self.service else {
            return Err(Error::invalid_request("no service started"));
        };
        Ok(GeneratedService {
            inner: Arc::new(ServiceInner {
                name,
                base_url,
                client: self.client,
                methods: self.methods,
            }),
        })
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::sync::Mutex;

    use assert2::{check, let_assert};
    use bytes::Bytes;
    use serde::Deserialize;
    use serde_json::json;

    use super::*;
    use crate::annotation::{Async, Http, Path, Query};
    use crate::declaration::{MethodDeclaration, ParameterDeclaration, ServiceDeclaration};
    use crate::generation::Generator;
    use crate::resolver::ServiceResolver;
    use crate::{Request, Response};

    #[derive(Debug, Default)]
    struct Stub {
        urls: Mutex<Vec<String>>,
    }

    impl HttpClient for Stub {
        fn execute(&self, request: Request) -> BoxFuture<'static, Result<Response>> {
            if let Ok(mut urls) = self.urls.lock() {
                urls.push(request.url().to_string());
            }
            let body = Bytes::from_static(br#"{"id":42,"name":"Ada"}"#);
            async move { Ok(Response::new(200, HashMap::new(), body)) }.boxed()
        }
    }

    #[derive(Debug, PartialEq, Deserialize)]
    struct User {
        id: u64,
        name: String,
    }

    fn service(client: Arc<Stub>) -> GeneratedService {
        let declaration = ServiceDeclaration::new("UserApi")
            .method(
                MethodDeclaration::new("get_user")
                    .annotate(Http::get("/users/{id}"))
                    .parameter(ParameterDeclaration::new("id", "u64").annotate(Path::new("id")))
                    .returns("User"),
            )
            .method(
                MethodDeclaration::new("find_user")
                    .annotate(Http::get("/users"))
                    .annotate(Async)
                    .parameter(ParameterDeclaration::new("name", "String").annotate(Query::new("name")))
                    .returns("User"),
            );
        let base_url = Url::parse("http://localhost").expect("valid URL");
        let definition = ServiceResolver::default()
            .resolve(&declaration, &base_url)
            .expect("resolved");
        Generator::new()
            .generate(&definition, client)
            .expect("generated")
    }

    #[tokio::test]
    async fn sync_call_decodes_response() {
        let stub = Arc::new(Stub::default());
        let service = service(Arc::clone(&stub));

        let user: User = service.call("get_user", &[json!(42)]).await.expect("call");
        check!(user == User { id: 42, name: "Ada".to_string() });
        check!(stub.urls.lock().expect("lock").as_slice() == ["http://localhost/users/42"]);
    }

    #[tokio::test]
    async fn deferred_call_resolves_when_awaited() {
        let stub = Arc::new(Stub::default());
        let service = service(Arc::clone(&stub));

        let deferred = service
            .call_deferred::<User>("find_user", &[json!("Ada Lovelace")])
            .expect("deferred");
        let user = deferred.await.expect("resolved");
        check!(user.name == "Ada");
        check!(
            stub.urls.lock().expect("lock").as_slice()
                == ["http://localhost/users?name=Ada%20Lovelace"]
        );
    }

    #[tokio::test]
    async fn dispatch_mode_must_match() {
        let service = service(Arc::new(Stub::default()));

        let_assert!(Err(Error::InvalidRequest(message)) = service.call::<User>("find_user", &[json!("x")]).await);
        check!(message.contains("call_deferred"));

        let_assert!(Err(Error::InvalidRequest(_)) = service.call_deferred::<User>("get_user", &[json!(1)]));
        let_assert!(Err(Error::InvalidRequest(_)) = service.call::<User>("missing", &[]).await);
    }

    #[tokio::test]
    async fn argument_count_is_checked_before_sending() {
        let stub = Arc::new(Stub::default());
        let service = service(Arc::clone(&stub));

        let_assert!(Err(Error::InvalidRequest(_)) = service.call::<User>("get_user", &[]).await);
        check!(stub.urls.lock().expect("lock").is_empty());
    }

    #[test]
    fn finish_requires_start() {
        let emitter = ProxyEmitter::new(Arc::new(Stub::default()));
        let_assert!(Err(Error::InvalidRequest(_)) = emitter.finish());
    }
}
