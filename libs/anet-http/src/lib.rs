#![cfg_attr(coverage_nightly, feature(coverage_attribute))]
#![warn(warnings)]

//! Pooled HTTP transport for the Authorize.Net gateway client
//!
//! This crate provides a hyper-based HTTP client with:
//! - TLS via rustls (HTTPS only by default)
//! - Connection pooling with an idle cap and idle timeout
//! - Separate bounds for the TCP dial and the TLS handshake
//! - TCP keep-alive probes
//! - Proxy selection from `HTTPS_PROXY` / `HTTP_PROXY` / `NO_PROXY`
//! - Default header injection (User-Agent)
//! - Bounded body reads that report truncated bodies as [`HttpError::ShortRead`]
//!
//! No per-request deadline is applied by the transport; callers that need one
//! wrap the call in `tokio::time::timeout`.
//!
//! # Example
//!
//! ```ignore
//! use anet_http::HttpClient;
//!
//! let client = HttpClient::builder().build()?;
//!
//! let body = client
//!     .post("https://api.authorize.net/xml/v1/request.api")
//!     .header("content-type", "text/xml")
//!     .body_bytes(payload)
//!     .send()
//!     .await?
//!     .bytes()
//!     .await?;
//! ```

mod builder;
mod client;
mod config;
mod connector;
mod error;
mod layers;
mod request;
mod response;
mod tls;

pub use builder::HttpClientBuilder;
pub use client::HttpClient;
pub use config::{DEFAULT_USER_AGENT, ProxyMode, TlsRootConfig, TransportConfig, TransportSecurity};
pub use error::{HttpError, InvalidUriKind};
pub use layers::{DefaultHeadersLayer, DefaultHeadersService};
pub use request::RequestBuilder;
pub use response::{ERROR_BODY_PREVIEW_LIMIT, HttpResponse, ResponseBody, body_preview};
