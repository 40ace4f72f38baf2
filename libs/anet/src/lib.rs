#![cfg_attr(coverage_nightly, feature(coverage_attribute))]
#![warn(warnings)]

//! Typed client for the Authorize.Net payment gateway
//!
//! Requests and replies are plain Rust types (see [`schema`]) encoded as XML
//! or JSON and posted to `<host>/xml/v1/request.api`. Every call returns
//! either the decoded reply or a [`RequestError`] that separates the
//! gateway's own rejection ([`ErrorResponse`]) from transport, read, encode
//! and decode failures ([`RequestFailure`]).
//!
//! # Example
//!
//! ```ignore
//! use anet::{Config, GatewayClient, RefId};
//! use anet::schema::{CreditCard, TransactionRequest};
//! use rust_decimal::Decimal;
//!
//! let client = GatewayClient::new(&Config::load_from_env()?)?;
//! client.authenticate_test().await?;
//!
//! let sale = TransactionRequest::charge(
//!     Decimal::new(500, 2),
//!     CreditCard::new("5424000000000015", "2030-12").with_card_code("999"),
//! );
//! let reply = client.create_transaction(sale, Some(RefId::random())).await?;
//! ```

mod client;
pub mod codec;
pub mod config;
mod error;
mod operations;
mod ref_id;
mod retry;
pub mod schema;
mod secret;

pub use client::{API_PATH, GatewayClient, GatewayClientBuilder, new_client};
pub use codec::{CodecError, WireFormat};
pub use config::{Config, ConfigError, ConfigOverrides, Credentials};
pub use error::{ClientBuildError, RequestError, RequestFailure};
pub use ref_id::{MAX_REF_ID_LEN, RefId, RefIdTooLong};
pub use retry::{retry, retry_when};
pub use schema::{ErrorResponse, GatewayRequest, GatewayResponse};
pub use secret::SecretString;

/// Transport settings, re-exported for [`GatewayClientBuilder::transport`].
pub use anet_http::{HttpError, ProxyMode, TlsRootConfig, TransportConfig, TransportSecurity};
