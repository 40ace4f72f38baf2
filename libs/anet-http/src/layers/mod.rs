//! Tower layers for the transport middleware stack
//!
//! - [`DefaultHeadersLayer`] - Adds headers (User-Agent, ...) the caller did not set

mod default_headers;

pub use default_headers::{DefaultHeadersLayer, DefaultHeadersService};
