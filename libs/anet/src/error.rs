use crate::codec::CodecError;
use crate::schema::{ErrorResponse, GatewayResponse};
use anet_http::HttpError;
use std::any::Any;
use std::fmt;
use std::time::Duration;
use thiserror::Error;

/// Failure of a single gateway round trip.
///
/// Carries the gateway's structured rejection, the underlying cause, or both.
/// `Display` renders the first gateway message, followed on a new line by the
/// cause when there is one.
///
/// When the gateway rejects a request inside a reply of the expected type
/// (`resultCode` `Error`), that decoded reply is kept as well; see
/// [`reply`](Self::reply).
pub struct RequestError {
    response: Option<ErrorResponse>,
    cause: Option<RequestFailure>,
    reply: Option<Box<dyn Any + Send + Sync>>,
}

/// What went wrong below the gateway's business layer.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum RequestFailure {
    /// The request could not be encoded; nothing was sent.
    #[error("unable to marshal request body: {0}")]
    Encode(#[source] CodecError),

    /// Connect, TLS, proxy or protocol failure before a response arrived.
    #[error("unable to make http request: {0}")]
    Transport(#[source] HttpError),

    /// A response arrived but its body could not be read completely.
    #[error("unable to read response body: {0}")]
    Read(#[source] HttpError),

    /// The body matched neither the expected reply nor an error envelope.
    #[error("unable to unmarshal response body: {primary}; as error response: {fallback}")]
    Decode {
        #[source]
        primary: CodecError,
        fallback: CodecError,
    },

    /// Non-2xx status with a body that is not a gateway document. Both decode
    /// attempts are kept, as in `Decode`.
    #[error("unexpected HTTP status {status}: {body_preview}")]
    Status {
        status: http::StatusCode,
        body_preview: String,
        #[source]
        primary: CodecError,
        fallback: CodecError,
    },

    /// The caller-supplied deadline expired.
    #[error("request did not complete within {0:?}")]
    DeadlineExceeded(Duration),
}

impl RequestError {
    pub(crate) fn gateway(response: ErrorResponse) -> Self {
        Self {
            response: Some(response),
            cause: None,
            reply: None,
        }
    }

    /// Gateway rejection that arrived as a full reply of the expected type.
    pub(crate) fn rejected<Res: GatewayResponse>(response: ErrorResponse, reply: Box<Res>) -> Self {
        Self {
            response: Some(response),
            cause: None,
            reply: Some(reply),
        }
    }

    /// Combine an envelope and a cause. At least one should be present.
    #[must_use]
    pub fn new(response: Option<ErrorResponse>, cause: Option<RequestFailure>) -> Self {
        debug_assert!(
            response.is_some() || cause.is_some(),
            "RequestError without response or cause"
        );
        Self {
            response,
            cause,
            reply: None,
        }
    }

    /// The gateway's structured rejection, if one was decoded.
    #[must_use]
    pub fn response(&self) -> Option<&ErrorResponse> {
        self.response.as_ref()
    }

    #[must_use]
    pub fn cause(&self) -> Option<&RequestFailure> {
        self.cause.as_ref()
    }

    /// The decoded reply the gateway rejected, e.g. a declined
    /// `createTransactionResponse` with its `transactionResponse`.
    ///
    /// `None` when the rejection came as a bare `ErrorResponse`, when there was
    /// no gateway reply, or when `Res` is not the type that was requested.
    #[must_use]
    pub fn reply<Res: GatewayResponse>(&self) -> Option<&Res> {
        self.reply.as_deref()?.downcast_ref::<Res>()
    }

    /// Take the rejected reply out by value. See [`reply`](Self::reply).
    #[must_use]
    pub fn into_reply<Res: GatewayResponse>(self) -> Option<Res> {
        self.reply?.downcast::<Res>().ok().map(|reply| *reply)
    }

    /// True when the gateway answered with an error envelope.
    #[must_use]
    pub fn is_gateway_error(&self) -> bool {
        self.response.is_some()
    }

    /// True when no response was received at all.
    #[must_use]
    pub fn is_transport_error(&self) -> bool {
        matches!(self.cause, Some(RequestFailure::Transport(_)))
    }

    /// True when repeating the same call could succeed.
    ///
    /// Gateway rejections and requests that cannot be encoded are final.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        !self.is_gateway_error() && !matches!(self.cause, Some(RequestFailure::Encode(_)))
    }

    /// True when the body ended before its declared length.
    #[must_use]
    pub fn is_short_read(&self) -> bool {
        matches!(&self.cause, Some(RequestFailure::Read(e)) if e.is_short_read())
    }

    #[must_use]
    pub fn into_parts(self) -> (Option<ErrorResponse>, Option<RequestFailure>) {
        (self.response, self.cause)
    }
}

impl From<RequestFailure> for RequestError {
    fn from(cause: RequestFailure) -> Self {
        Self {
            response: None,
            cause: Some(cause),
            reply: None,
        }
    }
}

impl fmt::Debug for RequestError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RequestError")
            .field("response", &self.response)
            .field("cause", &self.cause)
            .field("reply", &self.reply.as_ref().map(|_| ".."))
            .finish()
    }
}

impl fmt::Display for RequestError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (&self.response, &self.cause) {
            (Some(response), Some(cause)) => {
                write!(f, "{}\n{cause}", response.primary_message().text)
            }
            (Some(response), None) => f.write_str(&response.primary_message().text),
            (None, Some(cause)) => write!(f, "{cause}"),
            (None, None) => Ok(()),
        }
    }
}

impl std::error::Error for RequestError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.cause
            .as_ref()
            .map(|cause| cause as &(dyn std::error::Error + 'static))
    }
}

/// Errors from [`GatewayClient`](crate::GatewayClient) construction.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ClientBuildError {
    #[error("invalid gateway host '{host}': {reason}")]
    InvalidHost { host: String, reason: String },

    #[error("transport setup failed: {0}")]
    Transport(#[from] HttpError),
}
