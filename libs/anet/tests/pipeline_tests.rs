#![allow(clippy::unwrap_used, clippy::expect_used)]

//! `send_request` behavior against local gateway stand-ins.

use anet::schema::{
    AuthenticateTestRequest, AuthenticateTestResponse, MerchantAuthentication, ResultCode,
};
use anet::{
    CodecError, Config, Credentials, GatewayClient, GatewayRequest, RequestFailure, SecretString,
    TransportConfig, WireFormat,
};
use httpmock::prelude::*;
use serde::{Serialize, Serializer};
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

const PATH: &str = "/xml/v1/request.api";
const KEY: &str = "346HZ32z3fP4hTG2";

const XML_OK: &str = "\u{feff}<?xml version=\"1.0\" encoding=\"utf-8\"?>\
<authenticateTestResponse xmlns:xsi=\"http://www.w3.org/2001/XMLSchema-instance\" \
xmlns=\"AnetApi/xml/v1/schema/AnetApiSchema.xsd\">\
<messages><resultCode>Ok</resultCode><message><code>I00001</code><text>Successful.</text></message></messages>\
</authenticateTestResponse>";

const XML_AUTH_FAILED: &str = "<?xml version=\"1.0\" encoding=\"utf-8\"?>\
<authenticateTestResponse xmlns=\"AnetApi/xml/v1/schema/AnetApiSchema.xsd\">\
<messages><resultCode>Error</resultCode><message><code>E00007</code>\
<text>User authentication failed due to invalid authentication values.</text></message></messages>\
</authenticateTestResponse>";

const XML_ERROR_RESPONSE: &str = "<?xml version=\"1.0\" encoding=\"utf-8\"?>\
<ErrorResponse xmlns=\"AnetApi/xml/v1/schema/AnetApiSchema.xsd\">\
<messages><resultCode>Error</resultCode><message><code>E00003</code>\
<text>The element 'merchantAuthentication' has invalid child element 'bogus'.</text></message></messages>\
</ErrorResponse>";

fn config(host: String, format: WireFormat) -> Config {
    Config::from_parts(host, Credentials::new("5KP3u95bQpv", KEY), format)
}

fn client(host: String, format: WireFormat) -> GatewayClient {
    GatewayClient::builder(config(host, format))
        .transport(TransportConfig::for_testing())
        .build()
        .unwrap()
}

fn auth_request(client: &GatewayClient) -> AuthenticateTestRequest {
    AuthenticateTestRequest::new(client.merchant_authentication())
}

fn untouched() -> AuthenticateTestResponse {
    AuthenticateTestResponse {
        ref_id: Some("sentinel".to_owned()),
        ..AuthenticateTestResponse::default()
    }
}

/// Serve one connection with a canned raw HTTP response.
async fn raw_server(response: &'static [u8]) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        let (mut socket, _) = listener.accept().await.unwrap();
        // Drain the whole request so closing does not reset the connection.
        let mut seen = Vec::new();
        let mut buf = vec![0u8; 8192];
        while !seen
            .windows(b"</authenticateTestRequest>".len())
            .any(|w| w == b"</authenticateTestRequest>")
        {
            match socket.read(&mut buf).await {
                Ok(0) | Err(_) => break,
                Ok(n) => seen.extend_from_slice(&buf[..n]),
            }
        }
        socket.write_all(response).await.unwrap();
        socket.shutdown().await.ok();
    });
    format!("http://{addr}")
}

#[tokio::test]
async fn xml_success_fills_response() {
    let server = MockServer::start();
    let mock = server.mock(|when, then| {
        when.method(POST)
            .path(PATH)
            .header("content-type", "text/xml")
            .body_includes(
                "<?xml version=\"1.0\" encoding=\"utf-8\"?><authenticateTestRequest \
                 xmlns=\"AnetApi/xml/v1/schema/AnetApiSchema.xsd\">",
            )
            .body_includes(format!("<transactionKey>{KEY}</transactionKey>"));
        then.status(200).header("content-type", "text/xml").body(XML_OK);
    });

    let client = client(server.base_url(), WireFormat::Xml);
    let mut response = AuthenticateTestResponse::default();
    client
        .send_request(&auth_request(&client), &mut response)
        .await
        .unwrap();

    mock.assert();
    assert_eq!(response.messages.result_code, ResultCode::Ok);
    assert_eq!(response.messages.message[0].code, "I00001");
}

#[tokio::test]
async fn json_success_fills_response() {
    let server = MockServer::start();
    let mock = server.mock(|when, then| {
        when.method(POST)
            .path(PATH)
            .header("content-type", "application/json")
            .body_includes(r#"{"authenticateTestRequest":{"merchantAuthentication":{"name":"5KP3u95bQpv""#);
        then.status(200).body(
            "\u{feff}{\"messages\":{\"resultCode\":\"Ok\",\"message\":[{\"code\":\"I00001\",\"text\":\"Successful.\"}]}}",
        );
    });

    let client = client(server.base_url(), WireFormat::Json);
    let mut response = AuthenticateTestResponse::default();
    client
        .send_request(&auth_request(&client), &mut response)
        .await
        .unwrap();

    mock.assert();
    assert_eq!(response.messages.message[0].text, "Successful.");
}

#[tokio::test]
async fn result_code_error_is_gateway_error() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(POST).path(PATH);
        then.status(200).body(XML_AUTH_FAILED);
    });

    let client = client(server.base_url(), WireFormat::Xml);
    let mut response = untouched();
    let err = client
        .send_request(&auth_request(&client), &mut response)
        .await
        .unwrap_err();

    assert!(err.is_gateway_error());
    assert!(err.cause().is_none());
    assert_eq!(err.response().unwrap().primary_message().code, "E00007");
    assert_eq!(
        err.reply::<AuthenticateTestResponse>().unwrap().messages.result_code,
        ResultCode::Error
    );
    assert_eq!(
        err.to_string(),
        "User authentication failed due to invalid authentication values."
    );
    assert_eq!(response, untouched());
}

#[tokio::test]
async fn error_envelope_fallback_has_no_cause() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(POST).path(PATH);
        then.status(200).body(XML_ERROR_RESPONSE);
    });

    let client = client(server.base_url(), WireFormat::Xml);
    let mut response = untouched();
    let err = client
        .send_request(&auth_request(&client), &mut response)
        .await
        .unwrap_err();

    let envelope = err.response().unwrap();
    assert_eq!(envelope.result_code(), ResultCode::Error);
    assert_eq!(envelope.primary_message().code, "E00003");
    assert!(err.cause().is_none());
    assert!(err.to_string().starts_with("The element 'merchantAuthentication'"));
    assert!(err.reply::<AuthenticateTestResponse>().is_none());
    assert_eq!(response, untouched());
}

#[tokio::test]
async fn error_envelope_wins_over_http_status() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(POST).path(PATH);
        then.status(500).body(XML_ERROR_RESPONSE);
    });

    let client = client(server.base_url(), WireFormat::Xml);
    let err = client
        .send_request(&auth_request(&client), &mut AuthenticateTestResponse::default())
        .await
        .unwrap_err();

    assert!(err.is_gateway_error());
    assert!(err.cause().is_none());
}

#[tokio::test]
async fn undecodable_body_reports_both_failures() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(POST).path(PATH);
        then.status(200).body("<html><body>maintenance</body></html>");
    });

    let client = client(server.base_url(), WireFormat::Xml);
    let mut response = untouched();
    let err = client
        .send_request(&auth_request(&client), &mut response)
        .await
        .unwrap_err();

    assert!(err.response().is_none());
    assert!(
        matches!(err.cause(), Some(RequestFailure::Decode { .. })),
        "unexpected: {err}"
    );
    let text = err.to_string();
    assert!(text.starts_with("unable to unmarshal response body"), "{text}");
    assert!(text.contains("unexpected root element <html>"), "{text}");
    assert_eq!(response, untouched());
}

#[tokio::test]
async fn undecodable_json_reports_both_failures() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(POST).path(PATH);
        then.status(200).body("not json");
    });

    let client = client(server.base_url(), WireFormat::Json);
    let err = client
        .send_request(&auth_request(&client), &mut AuthenticateTestResponse::default())
        .await
        .unwrap_err();

    assert!(matches!(err.cause(), Some(RequestFailure::Decode { .. })));
}

#[tokio::test]
async fn non_2xx_garbage_reports_status() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(POST).path(PATH);
        then.status(503).body("Service Unavailable");
    });

    let client = client(server.base_url(), WireFormat::Xml);
    let err = client
        .send_request(&auth_request(&client), &mut AuthenticateTestResponse::default())
        .await
        .unwrap_err();

    match err.cause() {
        Some(RequestFailure::Status {
            status,
            body_preview,
            primary,
            fallback,
        }) => {
            assert_eq!(status.as_u16(), 503);
            assert_eq!(body_preview, "Service Unavailable");
            assert!(matches!(primary, CodecError::MissingRoot), "{primary}");
            assert!(!fallback.to_string().is_empty());
        }
        other => panic!("unexpected cause: {other:?}"),
    }
}

#[tokio::test]
async fn truncated_body_is_short_read_not_decode() {
    let host = raw_server(
        b"HTTP/1.1 200 OK\r\nContent-Type: text/xml\r\nContent-Length: 500\r\n\r\n<?xml version=\"1.0\"",
    )
    .await;

    let client = client(host, WireFormat::Xml);
    let mut response = untouched();
    let err = client
        .send_request(&auth_request(&client), &mut response)
        .await
        .unwrap_err();

    assert!(err.is_short_read(), "unexpected: {err}");
    assert!(!matches!(err.cause(), Some(RequestFailure::Decode { .. })));
    assert!(err.to_string().starts_with("unable to read response body"));
    assert_eq!(response, untouched());
}

#[tokio::test]
async fn unreachable_host_is_transport_error() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let client = client(format!("http://{addr}"), WireFormat::Xml);
    let mut response = untouched();
    let err = client
        .send_request(&auth_request(&client), &mut response)
        .await
        .unwrap_err();

    assert!(err.is_transport_error(), "unexpected: {err}");
    assert!(err.response().is_none());
    assert!(err.to_string().starts_with("unable to make http request"));
    assert_eq!(response, untouched());
}

#[tokio::test]
async fn deadline_leaves_response_untouched() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(POST).path(PATH);
        then.status(200).delay(Duration::from_millis(500)).body(XML_OK);
    });

    let client = client(server.base_url(), WireFormat::Xml);
    let mut response = untouched();
    let err = client
        .send_request_within(&auth_request(&client), &mut response, Duration::from_millis(50))
        .await
        .unwrap_err();

    assert!(matches!(
        err.cause(),
        Some(RequestFailure::DeadlineExceeded(d)) if *d == Duration::from_millis(50)
    ));
    assert_eq!(response, untouched());
}

#[tokio::test]
async fn equal_configs_send_identical_bodies() {
    let server = MockServer::start();
    let expected = anet::codec::encode(
        WireFormat::Xml,
        &AuthenticateTestRequest::new(MerchantAuthentication::with_transaction_key(
            "5KP3u95bQpv",
            SecretString::new(KEY),
        )),
    )
    .unwrap();
    let expected = String::from_utf8(expected).unwrap();

    let mock = server.mock(|when, then| {
        when.method(POST).path(PATH).body(expected.as_str());
        then.status(200).body(XML_OK);
    });

    for _ in 0..2 {
        let client = client(server.base_url(), WireFormat::Xml);
        client
            .send_request(&auth_request(&client), &mut AuthenticateTestResponse::default())
            .await
            .unwrap();
    }
    mock.assert_calls(2);
}

#[tokio::test]
async fn concurrent_calls_share_one_client() {
    let server = MockServer::start();
    let mock = server.mock(|when, then| {
        when.method(POST).path(PATH);
        then.status(200).body(XML_OK);
    });

    let client = client(server.base_url(), WireFormat::Xml);
    let mut handles = Vec::new();
    for _ in 0..16 {
        let client = client.clone();
        handles.push(tokio::spawn(async move {
            let mut response = AuthenticateTestResponse::default();
            client
                .send_request(&auth_request(&client), &mut response)
                .await
                .map(|()| response)
        }));
    }
    for handle in handles {
        let response = handle.await.unwrap().unwrap();
        assert_eq!(response.messages.result_code, ResultCode::Ok);
    }
    mock.assert_calls(16);
}

/// A request the encoder cannot represent.
struct Unencodable;

impl Serialize for Unencodable {
    fn serialize<S: Serializer>(&self, _serializer: S) -> Result<S::Ok, S::Error> {
        Err(serde::ser::Error::custom("refusing to serialize"))
    }
}

impl GatewayRequest for Unencodable {
    const ELEMENT: &'static str = "authenticateTestRequest";
}

#[tokio::test]
async fn encode_failure_sends_nothing() {
    let server = MockServer::start();
    let mock = server.mock(|when, then| {
        when.method(POST).path(PATH);
        then.status(200).body(XML_OK);
    });

    for format in [WireFormat::Xml, WireFormat::Json] {
        let client = client(server.base_url(), format);
        let err = client
            .send_request(&Unencodable, &mut AuthenticateTestResponse::default())
            .await
            .unwrap_err();
        assert!(matches!(err.cause(), Some(RequestFailure::Encode(_))));
        assert!(err.to_string().starts_with("unable to marshal request body"));
    }
    mock.assert_calls(0);
}
