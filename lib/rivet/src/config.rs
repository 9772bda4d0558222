//! Transport configuration for [`crate::HyperClient`].

use std::time::Duration;

/// Transport settings. Build one with [`ClientConfig::builder`].
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Deadline for one round trip, response body included.
    pub timeout: Duration,
    /// Deadline for establishing a connection.
    pub connect_timeout: Duration,
    /// Idle connections kept per host.
    pub pool_idle_per_host: usize,
    /// How long an idle connection is kept.
    pub pool_idle_timeout: Duration,
    /// `User-Agent` for requests that do not set one.
    pub user_agent: Option<String>,
    /// Headers added to requests that do not set them.
    pub default_headers: Vec<(String, String)>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            connect_timeout: Duration::from_secs(10),
            pool_idle_per_host: 32,
            pool_idle_timeout: Duration::from_secs(90),
            user_agent: Some(format!("rivet/{}", env!("CARGO_PKG_VERSION"))),
            default_headers: Vec::new(),
        }
    }
}

impl ClientConfig {
    /// A builder starting from the defaults.
    #[must_use]
    pub fn builder() -> ClientConfigBuilder {
        ClientConfigBuilder::default()
    }

    /// Headers to add to a request carrying `present`, in order: the
    /// `User-Agent`, then the default headers. Names are matched
    /// case-insensitively.
    pub(crate) fn missing_headers<'a>(
        &'a self,
        present: &'a [(String, String)],
    ) -> impl Iterator<Item = (&'a str, &'a str)> + 'a {
        let is_set =
            move |name: &str| present.iter().any(|(other, _)| other.eq_ignore_ascii_case(name));
        self.user_agent
            .as_deref()
            .map(|agent| ("User-Agent", agent))
            .into_iter()
            .chain(
                self.default_headers
                    .iter()
                    .map(|(name, value)| (name.as_str(), value.as_str())),
            )
            .filter(move |(name, _)| !is_set(name))
    }
}

/// Builder for [`ClientConfig`].
#[derive(Debug, Clone, Default)]
pub struct ClientConfigBuilder {
    config: ClientConfig,
}

impl From<ClientConfig> for ClientConfigBuilder {
    fn from(config: ClientConfig) -> Self {
        Self { config }
    }
}

impl ClientConfigBuilder {
    /// Set the round-trip timeout.
    #[must_use]
    pub const fn timeout(mut self, timeout: Duration) -> Self {
        self.config.timeout = timeout;
        self
    }

    /// Set the connection timeout.
    #[must_use]
    pub const fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.config.connect_timeout = timeout;
        self
    }

    /// Set the idle connections kept per host.
    #[must_use]
    pub const fn pool_idle_per_host(mut self, count: usize) -> Self {
        self.config.pool_idle_per_host = count;
        self
    }

    /// Set the idle connection timeout.
    #[must_use]
    pub const fn pool_idle_timeout(mut self, timeout: Duration) -> Self {
        self.config.pool_idle_timeout = timeout;
        self
    }

    /// Set the `User-Agent`, or `None` to send none.
    #[must_use]
    pub fn user_agent(mut self, user_agent: Option<String>) -> Self {
        self.config.user_agent = user_agent;
        self
    }

    /// Add a header sent with every request that does not set it.
    #[must_use]
    pub fn default_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.config.default_headers.push((name.into(), value.into()));
        self
    }

    /// Build the configuration.
    #[must_use]
    pub fn build(self) -> ClientConfig {
        self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = ClientConfig::default();
        assert_eq!(config.timeout, Duration::from_secs(30));
        assert_eq!(config.pool_idle_per_host, 32);
        assert!(
            config
                .user_agent
                .as_deref()
                .is_some_and(|agent| agent.starts_with("rivet/"))
        );
        assert!(config.default_headers.is_empty());
    }

    #[test]
    fn builder_keeps_unset_defaults() {
        let config = ClientConfig::builder()
            .timeout(Duration::from_secs(60))
            .user_agent(None)
            .build();

        assert_eq!(config.timeout, Duration::from_secs(60));
        assert_eq!(config.connect_timeout, Duration::from_secs(10));
        assert!(config.user_agent.is_none());
    }

    #[test]
    fn request_headers_win_over_defaults() {
        let config = ClientConfig::builder()
            .user_agent(Some("agent/1".to_string()))
            .default_header("Accept", "application/json")
            .default_header("X-Tenant", "acme")
            .build();

        let present = vec![("accept".to_string(), "text/plain".to_string())];
        let missing: Vec<_> = config.missing_headers(&present).collect();
        assert_eq!(missing, [("User-Agent", "agent/1"), ("X-Tenant", "acme")]);
    }
}
