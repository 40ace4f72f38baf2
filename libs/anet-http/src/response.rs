use crate::error::HttpError;
use bytes::Bytes;
use http::{HeaderMap, Response, StatusCode};
use http_body_util::BodyExt;
use std::error::Error as StdError;

/// Maximum body preview size for error messages (8KB).
pub const ERROR_BODY_PREVIEW_LIMIT: usize = 8 * 1024;

/// Type-erased response body.
pub type ResponseBody =
    http_body_util::combinators::BoxBody<Bytes, Box<dyn StdError + Send + Sync>>;

/// HTTP response wrapper with body-reading helpers
///
/// [`bytes()`](Self::bytes) is the only way to read the body; it enforces the
/// configured `max_body_size` and checks the body against `Content-Length`.
#[derive(Debug)]
pub struct HttpResponse {
    pub(crate) inner: Response<ResponseBody>,
    pub(crate) max_body_size: usize,
}

impl HttpResponse {
    /// Get the response status code
    #[must_use]
    pub fn status(&self) -> StatusCode {
        self.inner.status()
    }

    /// Get the response headers
    #[must_use]
    pub fn headers(&self) -> &HeaderMap {
        self.inner.headers()
    }

    /// Body length declared by the `Content-Length` header, if any
    #[must_use]
    pub fn content_length(&self) -> Option<u64> {
        declared_length(self.inner.headers())
    }

    /// Read the whole response body
    ///
    /// The status code is not inspected; gateway replies carry their outcome
    /// in the body.
    ///
    /// # Errors
    /// - `HttpError::BodyTooLarge` if the body (or its declared length) exceeds
    ///   `max_body_size`
    /// - `HttpError::ShortRead` if the stream ends before the declared
    ///   `Content-Length`
    /// - `HttpError::Transport` for any other read failure
    pub async fn bytes(self) -> Result<Bytes, HttpError> {
        let declared = self.content_length();
        if let Some(expected) = declared {
            let expected = usize::try_from(expected).unwrap_or(usize::MAX);
            if expected > self.max_body_size {
                return Err(HttpError::BodyTooLarge {
                    limit: self.max_body_size,
                    actual: expected,
                });
            }
        }
        read_body(self.inner, self.max_body_size, declared).await
    }

    /// Consume the wrapper and return the inner response
    #[must_use]
    pub fn into_inner(self) -> Response<ResponseBody> {
        self.inner
    }
}

fn declared_length(headers: &HeaderMap) -> Option<u64> {
    headers
        .get(http::header::CONTENT_LENGTH)?
        .to_str()
        .ok()?
        .trim()
        .parse()
        .ok()
}

fn byte_count(len: usize) -> u64 {
    u64::try_from(len).unwrap_or(u64::MAX)
}

/// True if the error chain says the peer closed before the body was complete.
fn is_truncation(err: &(dyn StdError + 'static)) -> bool {
    let mut current = Some(err);
    while let Some(cause) = current {
        if let Some(hyper_err) = cause.downcast_ref::<hyper::Error>()
            && hyper_err.is_incomplete_message()
        {
            return true;
        }
        if let Some(io_err) = cause.downcast_ref::<std::io::Error>()
            && io_err.kind() == std::io::ErrorKind::UnexpectedEof
        {
            return true;
        }
        current = cause.source();
    }
    false
}

async fn read_body(
    response: Response<ResponseBody>,
    limit: usize,
    declared: Option<u64>,
) -> Result<Bytes, HttpError> {
    let (_parts, body) = response.into_parts();

    let mut collected = Vec::new();
    let mut body = std::pin::pin!(body);

    while let Some(frame) = body.frame().await {
        let frame = match frame {
            Ok(frame) => frame,
            Err(err) => {
                return Err(match declared {
                    Some(expected) if is_truncation(&*err) => HttpError::ShortRead {
                        expected,
                        actual: byte_count(collected.len()),
                    },
                    _ => HttpError::Transport(err),
                });
            }
        };
        if let Some(chunk) = frame.data_ref() {
            if collected.len() + chunk.len() > limit {
                return Err(HttpError::BodyTooLarge {
                    limit,
                    actual: collected.len() + chunk.len(),
                });
            }
            collected.extend_from_slice(chunk);
        }
    }

    if let Some(expected) = declared {
        let actual = byte_count(collected.len());
        if actual < expected {
            return Err(HttpError::ShortRead { expected, actual });
        }
    }

    Ok(Bytes::from(collected))
}

/// Lossy UTF-8 preview of a body, capped at [`ERROR_BODY_PREVIEW_LIMIT`] bytes.
#[must_use]
pub fn body_preview(body: &[u8]) -> String {
    let end = body.len().min(ERROR_BODY_PREVIEW_LIMIT);
    String::from_utf8_lossy(&body[..end]).into_owned()
}
