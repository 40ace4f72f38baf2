//! Wire codec for gateway documents.
//!
//! XML requests get an XML declaration and the schema namespace on the root
//! element. JSON requests are wrapped in a single-key object named after the
//! request element; JSON replies are not wrapped.

use crate::schema::{ErrorResponse, GatewayRequest, GatewayResponse, SCHEMA_NAMESPACE};
use quick_xml::events::Event;
use serde::de::DeserializeOwned;
use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};
use std::fmt;
use thiserror::Error;

const XML_DECLARATION: &str = r#"<?xml version="1.0" encoding="utf-8"?>"#;
const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

/// Document encoding, fixed per client.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WireFormat {
    #[default]
    Xml,
    Json,
}

impl WireFormat {
    #[must_use]
    pub fn content_type(self) -> &'static str {
        match self {
            Self::Xml => "text/xml",
            Self::Json => "application/json",
        }
    }
}

impl fmt::Display for WireFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Xml => f.write_str("xml"),
            Self::Json => f.write_str("json"),
        }
    }
}

impl std::str::FromStr for WireFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "xml" => Ok(Self::Xml),
            "json" => Ok(Self::Json),
            other => Err(format!("unknown wire format '{other}' (expected xml or json)")),
        }
    }
}

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum CodecError {
    #[error("XML encoding failed: {0}")]
    XmlEncode(#[from] quick_xml::SeError),

    #[error("XML decoding failed: {0}")]
    XmlDecode(#[from] quick_xml::DeError),

    #[error("malformed XML: {0}")]
    Xml(#[from] quick_xml::Error),

    #[error("JSON codec failed: {0}")]
    Json(#[from] serde_json::Error),

    #[error("unexpected root element <{found}>, expected <{expected}>")]
    UnexpectedRoot {
        expected: &'static str,
        found: String,
    },

    #[error("document has no root element")]
    MissingRoot,

    #[error("resultCode is Error but the messages block is empty")]
    EmptyErrorEnvelope,
}

struct JsonEnvelope<'a, T> {
    element: &'static str,
    inner: &'a T,
}

impl<T: Serialize> Serialize for JsonEnvelope<'_, T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(1))?;
        map.serialize_entry(self.element, self.inner)?;
        map.end()
    }
}

/// Encode a request document.
///
/// # Errors
/// Returns `CodecError` if the request cannot be represented in `format`.
pub fn encode<Req: GatewayRequest>(format: WireFormat, request: &Req) -> Result<Vec<u8>, CodecError> {
    match format {
        WireFormat::Xml => {
            let body = quick_xml::se::to_string_with_root(Req::ELEMENT, request)?;
            let open = format!("<{}", Req::ELEMENT);
            let rest = body.strip_prefix(&open).unwrap_or(&body);
            Ok(format!(
                "{XML_DECLARATION}<{} xmlns=\"{SCHEMA_NAMESPACE}\"{rest}",
                Req::ELEMENT
            )
            .into_bytes())
        }
        WireFormat::Json => Ok(serde_json::to_vec(&JsonEnvelope {
            element: Req::ELEMENT,
            inner: request,
        })?),
    }
}

/// Decode a typed reply. For XML the root element must be `Res::ELEMENT`.
///
/// # Errors
/// Returns `CodecError` if the body is not a `Res` document.
pub fn decode<Res: GatewayResponse>(format: WireFormat, body: &[u8]) -> Result<Res, CodecError> {
    let body = strip_bom(body);
    match format {
        WireFormat::Xml => {
            let found = root_element(body)?;
            if found != Res::ELEMENT {
                return Err(CodecError::UnexpectedRoot {
                    expected: Res::ELEMENT,
                    found,
                });
            }
            decode_any(format, body)
        }
        WireFormat::Json => decode_any(format, body),
    }
}

/// Decode a reply as an [`ErrorResponse`], whatever its root element.
///
/// # Errors
/// Returns `CodecError` if the body has no non-empty `messages` block.
pub fn decode_error_response(format: WireFormat, body: &[u8]) -> Result<ErrorResponse, CodecError> {
    decode_any(format, strip_bom(body))
}

fn decode_any<T: DeserializeOwned>(format: WireFormat, body: &[u8]) -> Result<T, CodecError> {
    match format {
        WireFormat::Xml => Ok(quick_xml::de::from_reader(body)?),
        WireFormat::Json => Ok(serde_json::from_slice(body)?),
    }
}

/// Drop a leading UTF-8 byte-order mark; the gateway prefixes replies with one.
#[must_use]
pub fn strip_bom(body: &[u8]) -> &[u8] {
    body.strip_prefix(UTF8_BOM).unwrap_or(body)
}

/// Local name of the first element in an XML document.
fn root_element(body: &[u8]) -> Result<String, CodecError> {
    let mut reader = quick_xml::Reader::from_reader(body);
    loop {
        match reader.read_event()? {
            Event::Start(e) | Event::Empty(e) => {
                return Ok(String::from_utf8_lossy(e.local_name().as_ref()).into_owned());
            }
            Event::Eof => return Err(CodecError::MissingRoot),
            _ => {}
        }
    }
}
