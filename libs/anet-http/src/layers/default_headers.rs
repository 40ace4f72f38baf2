use crate::error::HttpError;
use http::header::{HeaderMap, HeaderName, HeaderValue, USER_AGENT};
use http::{Request, Response};
use std::sync::Arc;
use std::task::{Context, Poll};
use tower::{Layer, Service};

/// Tower layer that fills in default headers on every request
///
/// A header is only inserted when the request does not already carry it, so
/// per-request values always win.
#[derive(Clone)]
pub struct DefaultHeadersLayer {
    headers: Arc<HeaderMap>,
}

impl DefaultHeadersLayer {
    /// Create a layer that sets `User-Agent`
    ///
    /// # Errors
    /// Returns `HttpError::InvalidHeaderValue` if the user agent string is not valid
    pub fn try_new(user_agent: impl AsRef<str>) -> Result<Self, HttpError> {
        let mut headers = HeaderMap::new();
        headers.insert(USER_AGENT, HeaderValue::from_str(user_agent.as_ref())?);
        Ok(Self {
            headers: Arc::new(headers),
        })
    }

    /// Add another default header
    ///
    /// # Errors
    /// Returns `HttpError::InvalidHeaderName` / `InvalidHeaderValue` for
    /// malformed input.
    pub fn with_header(self, name: &str, value: &str) -> Result<Self, HttpError> {
        let name = HeaderName::try_from(name)?;
        let value = HeaderValue::try_from(value)?;
        let mut headers = Arc::unwrap_or_clone(self.headers);
        headers.insert(name, value);
        Ok(Self {
            headers: Arc::new(headers),
        })
    }
}

impl<S> Layer<S> for DefaultHeadersLayer {
    type Service = DefaultHeadersService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        DefaultHeadersService {
            inner,
            headers: Arc::clone(&self.headers),
        }
    }
}

/// Service that fills in default headers
#[derive(Clone)]
pub struct DefaultHeadersService<S> {
    inner: S,
    headers: Arc<HeaderMap>,
}

impl<S, ReqBody, ResBody> Service<Request<ReqBody>> for DefaultHeadersService<S>
where
    S: Service<Request<ReqBody>, Response = Response<ResBody>>,
{
    type Response = S::Response;
    type Error = S::Error;
    type Future = S::Future;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, mut req: Request<ReqBody>) -> Self::Future {
        for (name, value) in self.headers.iter() {
            if !req.headers().contains_key(name) {
                req.headers_mut().insert(name.clone(), value.clone());
            }
        }
        self.inner.call(req)
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;
    use bytes::Bytes;
    use http::{Method, StatusCode};
    use http_body_util::Full;
    use tower::ServiceExt;

    /// Echoes the request headers back as the response headers.
    #[derive(Clone)]
    struct EchoHeaders;

    impl Service<Request<Full<Bytes>>> for EchoHeaders {
        type Response = Response<Full<Bytes>>;
        type Error = Box<dyn std::error::Error + Send + Sync>;
        type Future = std::future::Ready<Result<Self::Response, Self::Error>>;

        fn poll_ready(&mut self, _: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
            Poll::Ready(Ok(()))
        }

        fn call(&mut self, req: Request<Full<Bytes>>) -> Self::Future {
            let mut response = Response::builder()
                .status(StatusCode::OK)
                .body(Full::new(Bytes::new()))
                .unwrap();
            *response.headers_mut() = req.headers().clone();
            std::future::ready(Ok(response))
        }
    }

    fn request(user_agent: Option<&str>) -> Request<Full<Bytes>> {
        let mut builder = Request::builder()
            .method(Method::POST)
            .uri("https://api.authorize.net/xml/v1/request.api");
        if let Some(ua) = user_agent {
            builder = builder.header(USER_AGENT, ua);
        }
        builder.body(Full::new(Bytes::new())).unwrap()
    }

    #[tokio::test]
    async fn test_user_agent_added() {
        let layer = DefaultHeadersLayer::try_new("anet-test/1.0").unwrap();
        let response = layer.layer(EchoHeaders).oneshot(request(None)).await.unwrap();
        assert_eq!(response.headers()[USER_AGENT], "anet-test/1.0");
    }

    #[tokio::test]
    async fn test_user_agent_not_overwritten() {
        let layer = DefaultHeadersLayer::try_new("anet-test/1.0").unwrap();
        let response = layer
            .layer(EchoHeaders)
            .oneshot(request(Some("custom-agent/2.0")))
            .await
            .unwrap();
        assert_eq!(response.headers()[USER_AGENT], "custom-agent/2.0");
    }

    #[tokio::test]
    async fn test_extra_default_header() {
        let layer = DefaultHeadersLayer::try_new("anet-test/1.0")
            .unwrap()
            .with_header("accept", "text/xml")
            .unwrap();
        let response = layer.layer(EchoHeaders).oneshot(request(None)).await.unwrap();
        assert_eq!(response.headers()["accept"], "text/xml");
        assert_eq!(response.headers()[USER_AGENT], "anet-test/1.0");
    }

    #[test]
    fn test_invalid_user_agent_rejected() {
        // Control characters are invalid in header values
        assert!(DefaultHeadersLayer::try_new("invalid\x00agent").is_err());
    }
}
