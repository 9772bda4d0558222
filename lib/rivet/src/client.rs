//! The default [`HttpClient`]: hyper over rustls, wrapped in tower layers.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};
use std::task::{Context, Poll};
use std::time::Duration;

use bytes::Bytes;
use futures_util::FutureExt;
use futures_util::future::BoxFuture;
use http_body_util::{BodyExt, Full};
use hyper_rustls::HttpsConnector;
use hyper_util::client::legacy::Client;
use hyper_util::client::legacy::connect::HttpConnector;
use hyper_util::rt::TokioExecutor;
use tower::{Layer, ServiceExt};
use tower::limit::ConcurrencyLimitLayer;
use tower::util::BoxCloneService;
use tower_service::Service;

use crate::config::{ClientConfig, ClientConfigBuilder};
use crate::connector::https_connector;
use crate::middleware::LoggingLayer;
use crate::{Error, HttpClient, Request, Response, Result};

/// Type-erased tower service the transport layers are composed over.
pub type BoxedService = BoxCloneService<Request, Response, Error>;

/// Future returned by [`BoxedService`].
pub type ServiceFuture = BoxFuture<'static, Result<Response>>;

type LayerFn = Arc<dyn Fn(BoxedService) -> BoxedService + Send + Sync>;

/// The innermost service: one round trip under the configured deadline.
#[derive(Clone)]
struct Transport {
    client: Client<HttpsConnector<HttpConnector>, Full<Bytes>>,
    config: Arc<ClientConfig>,
}

impl Transport {
    fn new(config: Arc<ClientConfig>) -> Self {
        let client = Client::builder(TokioExecutor::new())
            .pool_idle_timeout(config.pool_idle_timeout)
            .pool_max_idle_per_host(config.pool_idle_per_host)
            .build(https_connector(&config));
        Self { client, config }
    }

    fn to_http(&self, request: Request) -> Result<http::Request<Full<Bytes>>> {
        let (method, url, headers, body) = request.into_parts();
        let mut builder = http::Request::builder()
            .method(http::Method::from(method))
            .uri(url.as_str());

        for (name, value) in self.config.missing_headers(&headers) {
            builder = builder.header(name, value);
        }
        for (name, value) in &headers {
            builder = builder.header(name.as_str(), value.as_str());
        }

        builder
            .body(body.map_or_else(Full::default, Full::new))
            .map_err(|e| Error::invalid_request(e.to_string()))
    }

    async fn round_trip(self, request: Request) -> Result<Response> {
        let request = self.to_http(request)?;
        let exchange = async {
            let response = self
                .client
                .request(request)
                .await
                .map_err(|e| transport_error(&e))?;
            let status = response.status().as_u16();
            let headers = response_headers(response.headers());
            let body = response
                .into_body()
                .collect()
                .await
                .map_err(|e| Error::connection(e.to_string()))?
                .to_bytes();
            Ok(Response::new(status, headers, body))
        };

        tokio::time::timeout(self.config.timeout, exchange)
            .await
            .map_err(|_| Error::Timeout)?
    }
}

impl Service<Request> for Transport {
    type Response = Response;
    type Error = Error;
    type Future = ServiceFuture;

    fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<()>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, request: Request) -> Self::Future {
        self.clone().round_trip(request).boxed()
    }
}

/// Lowercase names; the first of repeated headers wins.
fn response_headers(headers: &http::HeaderMap) -> HashMap<String, String> {
    let mut collected = HashMap::with_capacity(headers.len());
    for (name, value) in headers {
        if let Ok(value) = value.to_str() {
            collected
                .entry(name.as_str().to_string())
                .or_insert_with(|| value.to_string());
        }
    }
    collected
}

fn transport_error(err: &hyper_util::client::legacy::Error) -> Error {
    let message = err.to_string();
    if err.is_connect() {
        return Error::connection(message);
    }
    let lower = message.to_ascii_lowercase();
    if lower.contains("tls") || lower.contains("certificate") {
        Error::tls(message)
    } else {
        Error::connection(message)
    }
}

/// HTTP client with connection pooling, TLS and tower layers.
///
/// This is the transport a [`crate::Rivet`] uses when none is configured.
/// Clones share the connection pool.
///
/// # Example
///
/// ```ignore
/// use rivet::HyperClient;
/// use std::time::Duration;
///
/// let client = HyperClient::builder()
///     .timeout(Duration::from_secs(5))
///     .default_header("Accept", "application/json")
///     .with_logging()
///     .build();
/// ```
#[derive(Clone)]
pub struct HyperClient {
    // `BoxCloneService` is `Send` but not `Sync`; each call clones it out.
    service: Arc<Mutex<BoxedService>>,
    config: Arc<ClientConfig>,
}

impl std::fmt::Debug for HyperClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HyperClient")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl HyperClient {
    /// A client with the default configuration and no layers.
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(ClientConfig::default())
    }

    /// A client with `config` and no layers.
    #[must_use]
    pub fn with_config(config: ClientConfig) -> Self {
        Self::builder().config(config).build()
    }

    /// Create a client builder.
    #[must_use]
    pub fn builder() -> HyperClientBuilder {
        HyperClientBuilder::default()
    }

    /// The client configuration.
    #[must_use]
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }
}

impl Default for HyperClient {
    fn default() -> Self {
        Self::new()
    }
}

impl HttpClient for HyperClient {
    fn execute(&self, request: Request) -> BoxFuture<'static, Result<Response>> {
        let service = self
            .service
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();
        service.oneshot(request).boxed()
    }
}

/// Builder for [`HyperClient`].
#[derive(Default)]
pub struct HyperClientBuilder {
    config: ClientConfigBuilder,
    layers: Vec<LayerFn>,
    default_layers: bool,
}

impl std::fmt::Debug for HyperClientBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HyperClientBuilder")
            .field("config", &self.config)
            .field("layers", &self.layers.len())
            .field("default_layers", &self.default_layers)
            .finish()
    }
}

impl HyperClientBuilder {
    /// Replace the whole configuration.
    #[must_use]
    pub fn config(mut self, config: ClientConfig) -> Self {
        self.config = ClientConfigBuilder::from(config);
        self
    }

    /// Set the round-trip timeout.
    #[must_use]
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.config = self.config.timeout(timeout);
        self
    }

    /// Set the connection timeout.
    #[must_use]
    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.config = self.config.connect_timeout(timeout);
        self
    }

    /// Set the idle connections kept per host.
    #[must_use]
    pub fn pool_idle_per_host(mut self, count: usize) -> Self {
        self.config = self.config.pool_idle_per_host(count);
        self
    }

    /// Set the idle connection timeout.
    #[must_use]
    pub fn pool_idle_timeout(mut self, timeout: Duration) -> Self {
        self.config = self.config.pool_idle_timeout(timeout);
        self
    }

    /// Set the `User-Agent`, or `None` to send none.
    #[must_use]
    pub fn user_agent(mut self, user_agent: Option<String>) -> Self {
        self.config = self.config.user_agent(user_agent);
        self
    }

    /// Add a header sent with every request that does not set it.
    #[must_use]
    pub fn default_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.config = self.config.default_header(name, value);
        self
    }

    /// Add a tower layer. The first layer added sees requests first.
    #[must_use]
    pub fn layer<L>(mut self, layer: L) -> Self
    where
        L: Layer<BoxedService> + Send + Sync + 'static,
        L::Service: Service<Request, Response = Response, Error = Error> + Clone + Send + 'static,
        <L::Service as Service<Request>>::Future: Send,
    {
        self.layers
            .push(Arc::new(move |service| BoxCloneService::new(layer.layer(service))));
        self
    }

    /// Add info-level logging right above the transport.
    #[must_use]
    pub const fn with_defaults(mut self) -> Self {
        self.default_layers = true;
        self
    }

    /// Log requests and responses at info level.
    #[must_use]
    pub fn with_logging(self) -> Self {
        self.layer(LoggingLayer::new())
    }

    /// Log requests and responses at debug level, headers included.
    #[must_use]
    pub fn with_debug_logging(self) -> Self {
        self.layer(LoggingLayer::debug())
    }

    /// Cap the number of in-flight requests.
    #[must_use]
    pub fn with_concurrency_limit(self, max: usize) -> Self {
        self.layer(ConcurrencyLimitLayer::new(max))
    }

    /// Build the client.
    #[must_use]
    pub fn build(self) -> HyperClient {
        let config = Arc::new(self.config.build());
        let mut service = BoxCloneService::new(Transport::new(Arc::clone(&config)));
        if self.default_layers {
            service = BoxCloneService::new(LoggingLayer::new().layer(service));
        }
        let service = self
            .layers
            .iter()
            .rev()
            .fold(service, |inner, wrap| wrap(inner));

        HyperClient {
            service: Arc::new(Mutex::new(service)),
            config,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let client = HyperClient::new();
        assert_eq!(client.config().timeout, Duration::from_secs(30));
        assert!(format!("{client:?}").contains("HyperClient"));
    }

    #[test]
    fn builder_settings_reach_the_config() {
        let client = HyperClient::builder()
            .timeout(Duration::from_secs(60))
            .pool_idle_per_host(16)
            .default_header("Accept", "application/json")
            .with_logging()
            .with_concurrency_limit(4)
            .build();

        assert_eq!(client.config().timeout, Duration::from_secs(60));
        assert_eq!(client.config().pool_idle_per_host, 16);
        assert_eq!(
            client.config().default_headers,
            [("Accept".to_string(), "application/json".to_string())]
        );
    }

    #[test]
    fn whole_config_replaces_settings() {
        let config = ClientConfig::builder().timeout(Duration::from_secs(3)).build();
        let client = HyperClient::builder()
            .timeout(Duration::from_secs(60))
            .config(config)
            .build();
        assert_eq!(client.config().timeout, Duration::from_secs(3));
    }

    #[test]
    fn configured_headers_come_before_request_headers() {
        let config = ClientConfig::builder()
            .user_agent(Some("agent/1".to_string()))
            .default_header("X-Tenant", "acme")
            .build();
        let transport = Transport {
            client: Client::builder(TokioExecutor::new()).build(https_connector(&config)),
            config: Arc::new(config),
        };
        let url = url::Url::parse("http://localhost/ping").expect("url");
        let request = Request::from_parts(
            crate::Method::Get,
            url,
            vec![("X-Tenant".to_string(), "other".to_string())],
            None,
        );

        let http_request = transport.to_http(request).expect("request");
        let headers = http_request.headers();
        assert_eq!(headers.get("user-agent").map(|v| v.as_bytes()), Some(&b"agent/1"[..]));
        let tenants: Vec<_> = headers.get_all("x-tenant").iter().collect();
        assert_eq!(tenants, ["other"]);
    }
}
