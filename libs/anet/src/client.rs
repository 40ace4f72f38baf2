use crate::codec::{self, CodecError, WireFormat};
use crate::config::{Config, Credentials};
use crate::error::{ClientBuildError, RequestError, RequestFailure};
use crate::schema::{
    ErrorResponse, GatewayRequest, GatewayResponse, MerchantAuthentication, ResultCode,
};
use anet_http::{HttpClient, HttpClientBuilder, TransportConfig, body_preview};
use bytes::Bytes;
use std::time::{Duration, Instant};
use tracing::Instrument;

/// Fixed API path under the configured host, shared by XML and JSON.
pub const API_PATH: &str = "xml/v1/request.api";

/// Handle to the gateway.
///
/// Cheap to clone; clones share one connection pool. One handle may serve any
/// number of concurrent [`send_request`](Self::send_request) calls.
#[derive(Clone)]
pub struct GatewayClient {
    http: HttpClient,
    endpoint: String,
    credentials: Credentials,
    wire_format: WireFormat,
}

/// Build a client from `config` with default transport settings.
///
/// # Errors
/// See [`GatewayClient::new`].
pub fn new_client(config: &Config) -> Result<GatewayClient, ClientBuildError> {
    GatewayClient::new(config)
}

/// Builder for a [`GatewayClient`] with non-default transport settings.
pub struct GatewayClientBuilder {
    config: Config,
    transport: TransportConfig,
}

impl GatewayClientBuilder {
    /// Replace the transport settings (timeouts, pool, proxy, TLS roots).
    #[must_use]
    pub fn transport(mut self, transport: TransportConfig) -> Self {
        self.transport = transport;
        self
    }

    #[must_use]
    pub fn wire_format(mut self, format: WireFormat) -> Self {
        self.config.wire_format = format;
        self
    }

    /// # Errors
    /// Returns `ClientBuildError::InvalidHost` if the host does not form an
    /// absolute URL, or `ClientBuildError::Transport` if TLS setup fails.
    pub fn build(self) -> Result<GatewayClient, ClientBuildError> {
        let endpoint = endpoint_url(&self.config.host)?;
        let http = HttpClientBuilder::with_config(self.transport).build()?;

        tracing::debug!(
            endpoint = %endpoint,
            format = %self.config.wire_format,
            "gateway client created"
        );

        Ok(GatewayClient {
            http,
            endpoint,
            credentials: self.config.auth,
            wire_format: self.config.wire_format,
        })
    }
}

/// `host` + `/` (if missing) + [`API_PATH`].
fn endpoint_url(host: &str) -> Result<String, ClientBuildError> {
    let mut endpoint = host.trim().to_owned();
    if !endpoint.ends_with('/') {
        endpoint.push('/');
    }
    endpoint.push_str(API_PATH);

    let uri: http::Uri = endpoint.parse().map_err(|e: http::uri::InvalidUri| {
        ClientBuildError::InvalidHost {
            host: host.to_owned(),
            reason: e.to_string(),
        }
    })?;
    if uri.scheme().is_none() || uri.authority().is_none() {
        return Err(ClientBuildError::InvalidHost {
            host: host.to_owned(),
            reason: "expected an absolute URL such as https://api.authorize.net".to_owned(),
        });
    }
    Ok(endpoint)
}

impl GatewayClient {
    /// Build a client with the default transport bounds: 30 s dial, 30 s
    /// keep-alive, 10 s TLS handshake, 100 idle connections per host kept for
    /// 90 s, proxy from the environment.
    ///
    /// No network I/O happens here.
    ///
    /// # Errors
    /// Returns `ClientBuildError` if the host is not an absolute URL or TLS
    /// setup fails.
    pub fn new(config: &Config) -> Result<Self, ClientBuildError> {
        Self::builder(config.clone()).build()
    }

    #[must_use]
    pub fn builder(config: Config) -> GatewayClientBuilder {
        GatewayClientBuilder {
            config,
            transport: TransportConfig::default(),
        }
    }

    /// Full request URL.
    #[must_use]
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    #[must_use]
    pub fn wire_format(&self) -> WireFormat {
        self.wire_format
    }

    /// The `merchantAuthentication` block to put at the top of every request.
    #[must_use]
    pub fn merchant_authentication(&self) -> MerchantAuthentication {
        self.credentials.merchant_authentication()
    }

    /// Send one request and decode the reply into `response`.
    ///
    /// `response` is written only when this returns `Ok(())`, which means the
    /// reply decoded as `Res` and its result code is `Ok`. One attempt is
    /// made; nothing is retried.
    ///
    /// # Errors
    /// Returns `RequestError` carrying the gateway's error envelope, the
    /// failure cause, or both. See [`RequestFailure`] for the causes. A reply
    /// of type `Res` with result code `Error` stays reachable through
    /// [`RequestError::reply`].
    pub async fn send_request<Req, Res>(
        &self,
        request: &Req,
        response: &mut Res,
    ) -> Result<(), RequestError>
    where
        Req: GatewayRequest,
        Res: GatewayResponse,
    {
        let span = tracing::debug_span!(
            "gateway.request",
            operation = Req::ELEMENT,
            format = %self.wire_format,
        );
        let decoded = self.round_trip::<Req, Res>(request).instrument(span).await?;
        *response = decoded;
        Ok(())
    }

    /// [`send_request`](Self::send_request) bounded by `deadline`.
    ///
    /// # Errors
    /// As `send_request`, plus `RequestFailure::DeadlineExceeded` when the
    /// whole round trip does not finish in time. `response` is then untouched.
    pub async fn send_request_within<Req, Res>(
        &self,
        request: &Req,
        response: &mut Res,
        deadline: Duration,
    ) -> Result<(), RequestError>
    where
        Req: GatewayRequest,
        Res: GatewayResponse,
    {
        match tokio::time::timeout(deadline, self.send_request(request, response)).await {
            Ok(result) => result,
            Err(_) => {
                tracing::debug!(operation = Req::ELEMENT, ?deadline, "gateway deadline exceeded");
                Err(RequestFailure::DeadlineExceeded(deadline).into())
            }
        }
    }

    async fn round_trip<Req, Res>(&self, request: &Req) -> Result<Res, RequestError>
    where
        Req: GatewayRequest,
        Res: GatewayResponse,
    {
        let body = codec::encode(self.wire_format, request).map_err(RequestFailure::Encode)?;
        tracing::trace!(bytes = body.len(), "request encoded");

        let started = Instant::now();
        let reply = self
            .http
            .post(&self.endpoint)
            .header("content-type", self.wire_format.content_type())
            .body_bytes(Bytes::from(body))
            .send()
            .await
            .map_err(RequestFailure::Transport)?;

        let status = reply.status();
        let bytes = reply.bytes().await.map_err(RequestFailure::Read)?;
        tracing::debug!(
            status = status.as_u16(),
            bytes = bytes.len(),
            elapsed_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX),
            "response received"
        );

        let primary = match codec::decode::<Res>(self.wire_format, &bytes) {
            Ok(decoded) => match accept(decoded) {
                Ok(decoded) => return Ok(decoded),
                Err(Rejection::Gateway(envelope, reply)) => {
                    tracing::debug!(code = %envelope.primary_message().code, "gateway returned resultCode Error");
                    return Err(RequestError::rejected(envelope, reply));
                }
                Err(Rejection::Empty) => CodecError::EmptyErrorEnvelope,
            },
            Err(err) => err,
        };
        tracing::trace!(error = %primary, "primary decode failed, trying error envelope");

        match codec::decode_error_response(self.wire_format, &bytes) {
            Ok(envelope) => {
                tracing::debug!(code = %envelope.primary_message().code, "gateway returned error envelope");
                Err(RequestError::gateway(envelope))
            }
            Err(fallback) if !status.is_success() => Err(RequestFailure::Status {
                status,
                body_preview: body_preview(&bytes),
                primary,
                fallback,
            }
            .into()),
            Err(fallback) => Err(RequestFailure::Decode { primary, fallback }.into()),
        }
    }
}

enum Rejection<Res> {
    Gateway(ErrorResponse, Box<Res>),
    Empty,
}

/// Split a decoded reply on its result code. A rejected reply is kept whole.
fn accept<Res: GatewayResponse>(decoded: Res) -> Result<Res, Rejection<Res>> {
    match decoded.messages().result_code {
        ResultCode::Ok => Ok(decoded),
        ResultCode::Error => match ErrorResponse::from_messages(decoded.messages().clone()) {
            Some(envelope) => Err(Rejection::Gateway(envelope, Box::new(decoded))),
            None => Err(Rejection::Empty),
        },
    }
}

impl std::fmt::Debug for GatewayClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GatewayClient")
            .field("endpoint", &self.endpoint)
            .field("api_login_id", &self.credentials.api_login_id)
            .field("wire_format", &self.wire_format)
            .finish_non_exhaustive()
    }
}
