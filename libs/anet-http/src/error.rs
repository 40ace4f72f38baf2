use std::time::Duration;
use thiserror::Error;

/// Classification of URL validation failures.
///
/// Provides programmatic matching for different failure modes without
/// relying on unstable error message strings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum InvalidUriKind {
    /// URL could not be parsed (malformed syntax)
    ParseError,
    /// URL is missing required host/authority component
    MissingAuthority,
    /// URL is missing required scheme (http/https)
    MissingScheme,
}

/// HTTP transport error types
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum HttpError {
    /// Request building failed
    #[error("Failed to build request: {0}")]
    RequestBuild(#[from] http::Error),

    /// Invalid header name
    #[error("Invalid header name: {0}")]
    InvalidHeaderName(#[from] http::header::InvalidHeaderName),

    /// Invalid header value
    #[error("Invalid header value: {0}")]
    InvalidHeaderValue(#[from] http::header::InvalidHeaderValue),

    /// TCP connection (DNS and proxy tunnel included) was not established in time
    #[error("Connect timed out after {0:?}")]
    ConnectTimeout(Duration),

    /// TLS handshake did not complete in time
    #[error("TLS handshake timed out after {0:?}")]
    TlsHandshakeTimeout(Duration),

    /// Transport error (network, connection, proxy, etc)
    #[error("Transport error: {0}")]
    Transport(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// TLS error (handshake failure, certificate rejected, bad server name)
    #[error("TLS error: {0}")]
    Tls(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// Response body exceeded size limit
    #[error("Response body too large: limit {limit} bytes, got {actual} bytes")]
    BodyTooLarge { limit: usize, actual: usize },

    /// Response body ended before the length declared in `Content-Length`
    #[error("Response body truncated: expected {expected} bytes, got {actual} bytes")]
    ShortRead { expected: u64, actual: u64 },

    /// Invalid URL (failed to parse)
    ///
    /// Use the `kind` field for programmatic matching. The `reason` field contains
    /// a diagnostic message intended for logging only.
    #[error("Invalid URL '{url}': {reason}")]
    InvalidUri {
        /// The URL that failed to parse
        url: String,
        /// Structured failure classification for programmatic matching
        kind: InvalidUriKind,
        /// Diagnostic message (unstable format, for logging only)
        reason: String,
    },

    /// Invalid URL scheme for transport security configuration
    #[error("URL scheme '{scheme}' not allowed: {reason}")]
    InvalidScheme {
        /// The URL scheme that was rejected
        scheme: String,
        /// Reason the scheme was rejected
        reason: String,
    },
}

impl HttpError {
    /// True for failures that happened before any response arrived:
    /// connect, TLS and other transport errors.
    #[must_use]
    pub fn is_connect(&self) -> bool {
        matches!(
            self,
            Self::ConnectTimeout(_) | Self::TlsHandshakeTimeout(_) | Self::Tls(_) | Self::Transport(_)
        )
    }

    /// True when the response body was cut short of its declared length.
    #[must_use]
    pub fn is_short_read(&self) -> bool {
        matches!(self, Self::ShortRead { .. })
    }
}

impl From<hyper::Error> for HttpError {
    fn from(err: hyper::Error) -> Self {
        HttpError::Transport(Box::new(err))
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;
    use std::error::Error;
    use std::fmt;

    #[derive(Debug)]
    struct TestError(&'static str);

    impl fmt::Display for TestError {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            write!(f, "{}", self.0)
        }
    }

    impl Error for TestError {}

    #[test]
    fn test_transport_error_preserves_source() {
        let err = HttpError::Transport(Box::new(TestError("connection refused")));

        let source = err.source().unwrap();
        let downcast = source.downcast_ref::<TestError>().unwrap();
        assert_eq!(downcast.0, "connection refused");
        assert!(err.is_connect());
    }

    #[test]
    fn test_tls_error_preserves_source() {
        let err = HttpError::Tls(Box::new(TestError("certificate expired")));

        let source = err.source().unwrap();
        assert_eq!(
            source.downcast_ref::<TestError>().unwrap().0,
            "certificate expired"
        );
    }

    #[test]
    fn test_short_read_message_names_both_lengths() {
        let err = HttpError::ShortRead {
            expected: 100,
            actual: 8,
        };
        assert_eq!(
            err.to_string(),
            "Response body truncated: expected 100 bytes, got 8 bytes"
        );
        assert!(err.is_short_read());
        assert!(!err.is_connect());
    }

    #[test]
    fn test_timeouts_are_connect_errors() {
        assert!(HttpError::ConnectTimeout(Duration::from_secs(30)).is_connect());
        assert!(HttpError::TlsHandshakeTimeout(Duration::from_secs(10)).is_connect());
        assert!(
            !HttpError::BodyTooLarge {
                limit: 1,
                actual: 2
            }
            .is_connect()
        );
    }
}
