use std::time::Duration;

/// Default User-Agent string for gateway requests
pub const DEFAULT_USER_AGENT: &str = concat!("anet-http/", env!("CARGO_PKG_VERSION"));

/// TLS root certificate source
///
/// Controls which root certificates are used for TLS verification.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[non_exhaustive]
pub enum TlsRootConfig {
    /// Mozilla root certificates bundled with the binary (default)
    ///
    /// Behaves identically on every platform and does not touch the OS
    /// certificate store.
    #[default]
    WebPki,

    /// OS native certificate store
    ///
    /// Loaded once per process and cached. Building a client fails if the
    /// store yields no usable certificate.
    Native,
}

/// Transport security mode
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[non_exhaustive]
pub enum TransportSecurity {
    /// Only `https://` targets are accepted (default)
    #[default]
    TlsOnly,

    /// Plain `http://` targets are accepted as well
    ///
    /// **WARNING**: Only for tests against local mock servers. Gateway
    /// credentials travel in the request body and would be sent in clear text.
    AllowInsecureHttp,
}

/// Proxy selection for outbound connections
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[non_exhaustive]
pub enum ProxyMode {
    /// Read `HTTPS_PROXY` / `HTTP_PROXY` / `NO_PROXY` (and lowercase variants)
    /// once, when the client is built (default)
    ///
    /// Matching destinations are reached through an HTTP `CONNECT` tunnel;
    /// proxy credentials embedded in the proxy URL are sent as basic auth.
    #[default]
    Environment,

    /// Always connect directly
    Disabled,
}

/// Transport configuration
///
/// The defaults are the connection bounds the gateway client is specified with:
///
/// | Setting | Default |
/// |---------|---------|
/// | `connect_timeout` | 30 s |
/// | `tcp_keepalive` | 30 s |
/// | `tls_handshake_timeout` | 10 s |
/// | `pool_max_idle_per_host` | 100 |
/// | `pool_idle_timeout` | 90 s |
/// | `proxy` | from environment |
///
/// The gateway is a single host, so the per-host idle cap is the total idle cap.
#[derive(Debug, Clone)]
pub struct TransportConfig {
    /// Upper bound on establishing the TCP connection, DNS resolution and
    /// proxy `CONNECT` included
    pub connect_timeout: Duration,

    /// TCP keep-alive probe interval (`None` disables keep-alive probes)
    pub tcp_keepalive: Option<Duration>,

    /// Upper bound on the TLS handshake, measured after the TCP connection is up
    pub tls_handshake_timeout: Duration,

    /// Maximum idle connections kept in the pool per host (0 disables reuse)
    pub pool_max_idle_per_host: usize,

    /// Idle connections older than this are closed (`None` keeps them forever)
    pub pool_idle_timeout: Option<Duration>,

    /// Maximum response body size in bytes (default: 10 MB)
    pub max_body_size: usize,

    /// User-Agent header sent when the caller did not set one
    pub user_agent: String,

    /// Transport security mode (default: `TlsOnly`)
    pub transport: TransportSecurity,

    /// TLS root certificate source (default: `WebPki`)
    pub tls_roots: TlsRootConfig,

    /// Proxy selection (default: from environment)
    pub proxy: ProxyMode,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_secs(30),
            tcp_keepalive: Some(Duration::from_secs(30)),
            tls_handshake_timeout: Duration::from_secs(10),
            pool_max_idle_per_host: 100,
            pool_idle_timeout: Some(Duration::from_secs(90)),
            max_body_size: 10 * 1024 * 1024, // 10 MB
            user_agent: DEFAULT_USER_AGENT.to_owned(),
            transport: TransportSecurity::TlsOnly,
            tls_roots: TlsRootConfig::default(),
            proxy: ProxyMode::Environment,
        }
    }
}

impl TransportConfig {
    /// Configuration for tests against local mock servers
    ///
    /// Allows plain HTTP, ignores proxy environment variables and uses short
    /// connection bounds so failing tests finish quickly.
    #[must_use]
    pub fn for_testing() -> Self {
        Self {
            connect_timeout: Duration::from_secs(5),
            tcp_keepalive: None,
            tls_handshake_timeout: Duration::from_secs(5),
            pool_max_idle_per_host: 4,
            pool_idle_timeout: Some(Duration::from_secs(10)),
            max_body_size: 1024 * 1024, // 1 MB
            user_agent: DEFAULT_USER_AGENT.to_owned(),
            transport: TransportSecurity::AllowInsecureHttp,
            tls_roots: TlsRootConfig::default(),
            proxy: ProxyMode::Disabled,
        }
    }
}
