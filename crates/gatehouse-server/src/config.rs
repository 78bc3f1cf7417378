//! Server configuration.

use std::net::SocketAddr;

/// Response-shaping policy knobs.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ResponsePolicy {
    /// When on, a 200 response with an empty body is remapped to 204.
    /// Off by default: explicit statuses are honored as declared.
    pub remap_empty_ok: bool,
}

impl ResponsePolicy {
    /// Enables the empty-200-to-204 remap.
    #[must_use]
    pub fn remap_empty_ok(mut self) -> Self {
        self.remap_empty_ok = true;
        self
    }
}

/// Configuration for the HTTP server glue.
///
/// # Example
///
/// ```
/// use gatehouse_server::ServerConfig;
///
/// let config = ServerConfig::builder()
///     .bind_addr("127.0.0.1:8080".parse().unwrap())
///     .body_limit(512 * 1024)
///     .build();
/// assert_eq!(config.body_limit(), 512 * 1024);
/// ```
#[derive(Debug, Clone)]
pub struct ServerConfig {
    bind_addr: SocketAddr,
    body_limit: usize,
    policy: ResponsePolicy,
}

pub(crate) const DEFAULT_BODY_LIMIT: usize = 1024 * 1024;

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([127, 0, 0, 1], 8080)),
            body_limit: DEFAULT_BODY_LIMIT,
            policy: ResponsePolicy::default(),
        }
    }
}

impl ServerConfig {
    /// Creates a builder.
    #[must_use]
    pub fn builder() -> ServerConfigBuilder {
        ServerConfigBuilder::default()
    }

    /// Returns the bind address.
    #[must_use]
    pub fn bind_addr(&self) -> SocketAddr {
        self.bind_addr
    }

    /// Returns the maximum buffered request body size in bytes.
    /// Streaming bodies are not subject to this limit.
    #[must_use]
    pub fn body_limit(&self) -> usize {
        self.body_limit
    }

    /// Returns the response policy.
    #[must_use]
    pub fn policy(&self) -> ResponsePolicy {
        self.policy
    }
}

/// Builder for [`ServerConfig`].
#[derive(Debug, Default)]
pub struct ServerConfigBuilder {
    config: ServerConfig,
}

impl ServerConfigBuilder {
    /// Sets the bind address.
    #[must_use]
    pub fn bind_addr(mut self, addr: SocketAddr) -> Self {
        self.config.bind_addr = addr;
        self
    }

    /// Sets the buffered body size limit.
    #[must_use]
    pub fn body_limit(mut self, limit: usize) -> Self {
        self.config.body_limit = limit;
        self
    }

    /// Sets the response policy.
    #[must_use]
    pub fn policy(mut self, policy: ResponsePolicy) -> Self {
        self.config.policy = policy;
        self
    }

    /// Builds the configuration.
    #[must_use]
    pub fn build(self) -> ServerConfig {
        self.config
    }
}
