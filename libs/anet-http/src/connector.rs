//! Connector with separate bounds for the TCP dial and the TLS handshake.
//!
//! hyper-rustls applies a single future to the whole connect, so the dial and
//! the handshake are driven here directly: `HttpConnector` (optionally through
//! an HTTP `CONNECT` tunnel) for TCP, then `tokio-rustls` for TLS. The result
//! is a [`MaybeHttpsStream`] so hyper still sees the negotiated ALPN protocol.

use crate::config::{ProxyMode, TransportConfig};
use crate::error::HttpError;
use http::Uri;
use http::uri::Scheme;
use hyper_rustls::MaybeHttpsStream;
use hyper_util::client::legacy::connect::HttpConnector;
use hyper_util::client::legacy::connect::proxy::Tunnel;
use hyper_util::client::proxy::matcher::Matcher;
use hyper_util::rt::TokioIo;
use rustls_pki_types::ServerName;
use std::error::Error as StdError;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use std::time::Duration;
use thiserror::Error;
use tokio::net::TcpStream;
use tokio_rustls::TlsConnector;
use tower::{Service, ServiceExt};

type BoxError = Box<dyn StdError + Send + Sync>;

/// Stream handed to hyper: plain TCP for `http://`, TLS for `https://`.
pub type GatewayStream = MaybeHttpsStream<TokioIo<TcpStream>>;

/// Failure while establishing a connection.
#[derive(Debug, Error)]
pub enum ConnectError {
    #[error("TCP connect to {host} timed out after {timeout:?}")]
    DialTimeout { host: String, timeout: Duration },

    #[error("TCP connect failed: {0}")]
    Dial(#[source] BoxError),

    #[error("TLS handshake with {host} timed out after {timeout:?}")]
    HandshakeTimeout { host: String, timeout: Duration },

    #[error("TLS handshake failed: {0}")]
    Handshake(#[source] std::io::Error),

    #[error("invalid TLS server name '{0}'")]
    InvalidServerName(String),

    #[error("destination URI has no host")]
    MissingHost,

    #[error("plain HTTP connection to {0} rejected by transport security")]
    InsecureScheme(String),
}

#[derive(Clone)]
pub struct GatewayConnector {
    http: HttpConnector,
    tls: TlsConnector,
    proxy: Option<Arc<Matcher>>,
    connect_timeout: Duration,
    handshake_timeout: Duration,
    allow_http: bool,
}

impl GatewayConnector {
    pub fn new(config: &TransportConfig, tls: Arc<rustls::ClientConfig>, allow_http: bool) -> Self {
        let mut http = HttpConnector::new();
        // TLS is layered on top here, so https:// destinations must reach the TCP dialer.
        http.enforce_http(false);
        http.set_nodelay(true);
        http.set_keepalive(config.tcp_keepalive);

        let proxy = match config.proxy {
            ProxyMode::Environment => Some(Arc::new(Matcher::from_env())),
            ProxyMode::Disabled => None,
        };

        Self {
            http,
            tls: TlsConnector::from(tls),
            proxy,
            connect_timeout: config.connect_timeout,
            handshake_timeout: config.tls_handshake_timeout,
            allow_http,
        }
    }

    async fn connect(self, dst: Uri) -> Result<GatewayStream, ConnectError> {
        let host = dst.host().ok_or(ConnectError::MissingHost)?.to_owned();
        let tcp = self.dial(&dst, &host).await?;

        if dst.scheme() != Some(&Scheme::HTTPS) {
            if self.allow_http {
                return Ok(MaybeHttpsStream::Http(tcp));
            }
            return Err(ConnectError::InsecureScheme(host));
        }

        let name = host.trim_start_matches('[').trim_end_matches(']');
        let server_name = ServerName::try_from(name.to_owned())
            .map_err(|_| ConnectError::InvalidServerName(name.to_owned()))?;

        let tls = tokio::time::timeout(
            self.handshake_timeout,
            self.tls.connect(server_name, TokioIo::new(tcp)),
        )
        .await
        .map_err(|_| ConnectError::HandshakeTimeout {
            host: host.clone(),
            timeout: self.handshake_timeout,
        })?
        .map_err(ConnectError::Handshake)?;

        tracing::debug!(host = %host, "TLS handshake complete");
        Ok(MaybeHttpsStream::Https(TokioIo::new(tls)))
    }

    async fn dial(&self, dst: &Uri, host: &str) -> Result<TokioIo<TcpStream>, ConnectError> {
        let intercept = self.proxy.as_deref().and_then(|matcher| matcher.intercept(dst));

        let attempt = async {
            match intercept {
                Some(proxy) => {
                    tracing::debug!(
                        proxy_host = proxy.uri().host().unwrap_or_default(),
                        "connecting through proxy tunnel"
                    );
                    let mut tunnel = Tunnel::new(proxy.uri().clone(), self.http.clone());
                    if let Some(auth) = proxy.basic_auth() {
                        tunnel = tunnel.with_auth(auth.clone());
                    }
                    tunnel
                        .oneshot(dst.clone())
                        .await
                        .map_err(|e| ConnectError::Dial(e.into()))
                }
                None => self
                    .http
                    .clone()
                    .oneshot(dst.clone())
                    .await
                    .map_err(|e| ConnectError::Dial(e.into())),
            }
        };

        tokio::time::timeout(self.connect_timeout, attempt)
            .await
            .map_err(|_| ConnectError::DialTimeout {
                host: host.to_owned(),
                timeout: self.connect_timeout,
            })?
    }
}

impl Service<Uri> for GatewayConnector {
    type Response = GatewayStream;
    type Error = BoxError;
    type Future = Pin<Box<dyn Future<Output = Result<GatewayStream, BoxError>> + Send>>;

    fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, dst: Uri) -> Self::Future {
        let connector = self.clone();
        Box::pin(async move { connector.connect(dst).await.map_err(Into::into) })
    }
}

/// Where in the connect sequence a client error originated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FailureStage {
    DialTimeout(Duration),
    HandshakeTimeout(Duration),
    Tls,
    Other,
}

fn failure_stage(err: &(dyn StdError + 'static)) -> FailureStage {
    let mut current = Some(err);
    while let Some(cause) = current {
        if let Some(connect) = cause.downcast_ref::<ConnectError>() {
            return match connect {
                ConnectError::DialTimeout { timeout, .. } => FailureStage::DialTimeout(*timeout),
                ConnectError::HandshakeTimeout { timeout, .. } => {
                    FailureStage::HandshakeTimeout(*timeout)
                }
                ConnectError::Handshake(_) | ConnectError::InvalidServerName(_) => {
                    FailureStage::Tls
                }
                ConnectError::Dial(_) | ConnectError::MissingHost | ConnectError::InsecureScheme(_) => {
                    FailureStage::Other
                }
            };
        }
        current = cause.source();
    }
    FailureStage::Other
}

/// Map a pooled-client error to `HttpError`, recovering connect-stage timeouts.
pub fn map_client_error(err: hyper_util::client::legacy::Error) -> HttpError {
    match failure_stage(&err) {
        FailureStage::DialTimeout(timeout) => HttpError::ConnectTimeout(timeout),
        FailureStage::HandshakeTimeout(timeout) => HttpError::TlsHandshakeTimeout(timeout),
        FailureStage::Tls => HttpError::Tls(Box::new(err)),
        FailureStage::Other => HttpError::Transport(Box::new(err)),
    }
}
