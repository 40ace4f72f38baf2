#![allow(clippy::unwrap_used, clippy::expect_used)]

use anet::schema::{CreateTransactionResponse, CreditCard, Order, TransactionRequest};
use anet::{Config, Credentials, GatewayClient, RefId, TransportConfig, WireFormat};
use httpmock::prelude::*;
use rust_decimal::Decimal;

const PATH: &str = "/xml/v1/request.api";

fn client(host: String, format: WireFormat) -> GatewayClient {
    GatewayClient::builder(Config::from_parts(
        host,
        Credentials::new("5KP3u95bQpv", "346HZ32z3fP4hTG2"),
        format,
    ))
    .transport(TransportConfig::for_testing())
    .build()
    .unwrap()
}

#[tokio::test]
async fn authenticate_test_accepts_valid_credentials() {
    let server = MockServer::start();
    let mock = server.mock(|when, then| {
        when.method(POST)
            .path(PATH)
            .body_includes("<authenticateTestRequest ")
            .body_includes("<name>5KP3u95bQpv</name>");
        then.status(200).body(
            "<authenticateTestResponse><messages><resultCode>Ok</resultCode>\
             <message><code>I00001</code><text>Successful.</text></message>\
             </messages></authenticateTestResponse>",
        );
    });

    let reply = client(server.base_url(), WireFormat::Xml)
        .authenticate_test()
        .await
        .unwrap();

    mock.assert();
    assert_eq!(reply.messages.message[0].code, "I00001");
}

#[tokio::test]
async fn charge_with_ref_id_over_json() {
    let server = MockServer::start();
    let mock = server.mock(|when, then| {
        when.method(POST)
            .path(PATH)
            .header("content-type", "application/json")
            .body_includes(r#""refId":"4711""#)
            .body_includes(r#""transactionType":"authCaptureTransaction","amount":"12.50""#)
            .body_includes(r#""creditCard":{"cardNumber":"5424000000000015","expirationDate":"2030-12","cardCode":"999"}"#)
            .body_includes(r#""order":{"invoiceNumber":"INV-7","description":"Widgets"}"#);
        then.status(200).body(
            r#"{"transactionResponse":{"responseCode":"1","authCode":"QWE123","avsResultCode":"Y",
               "cvvResultCode":"P","transId":"60212345678","refTransID":"","transHash":"",
               "testRequest":"0","accountNumber":"XXXX0015","accountType":"MasterCard",
               "messages":[{"code":"1","description":"This transaction has been approved."}]},
               "refId":"4711","messages":{"resultCode":"Ok",
               "message":[{"code":"I00001","text":"Successful."}]}}"#,
        );
    });

    let sale = TransactionRequest::charge(
        Decimal::new(1250, 2),
        CreditCard::new("5424000000000015", "2030-12").with_card_code("999"),
    )
    .with_order(Order::new("INV-7", "Widgets"));

    let reply = client(server.base_url(), WireFormat::Json)
        .create_transaction(sale, Some(RefId::new("4711").unwrap()))
        .await
        .unwrap();

    mock.assert();
    assert_eq!(reply.ref_id.as_deref(), Some("4711"));
    let tx = reply.transaction_response.unwrap();
    assert!(tx.is_approved());
    assert_eq!(tx.trans_id.as_deref(), Some("60212345678"));
    assert_eq!(tx.messages[0].description, "This transaction has been approved.");
}

#[tokio::test]
async fn held_charge_is_still_ok() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(POST).path(PATH).body_includes("<createTransactionRequest ");
        then.status(200).body(
            "<createTransactionResponse><messages><resultCode>Ok</resultCode>\
             <message><code>I00001</code><text>Successful.</text></message></messages>\
             <transactionResponse><responseCode>4</responseCode><transId>60200000002</transId>\
             <messages><message><code>252</code><description>Your order has been received.</description></message></messages>\
             </transactionResponse></createTransactionResponse>",
        );
    });

    let reply = client(server.base_url(), WireFormat::Xml)
        .create_transaction(
            TransactionRequest::charge(
                Decimal::new(100, 2),
                CreditCard::new("4111111111111111", "2030-12"),
            ),
            None,
        )
        .await
        .unwrap();

    let tx = reply.transaction_response.unwrap();
    assert!(!tx.is_approved());
    assert_eq!(tx.response_code.as_deref(), Some("4"));
    assert_eq!(tx.messages[0].code, "252");
}

#[tokio::test]
async fn declined_charge_keeps_transaction_response() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(POST).path(PATH).body_includes("<createTransactionRequest ");
        then.status(200).body(
            "\u{feff}<?xml version=\"1.0\" encoding=\"utf-8\"?>\
             <createTransactionResponse xmlns=\"AnetApi/xml/v1/schema/AnetApiSchema.xsd\">\
             <refId>77</refId>\
             <messages><resultCode>Error</resultCode>\
             <message><code>E00027</code><text>The transaction was unsuccessful.</text></message></messages>\
             <transactionResponse><responseCode>2</responseCode><authCode /><transId>60200000001</transId>\
             <refTransID /><accountNumber>XXXX0002</accountNumber><accountType>Visa</accountType>\
             <errors><error><errorCode>2</errorCode><errorText>This transaction has been declined.</errorText></error></errors>\
             </transactionResponse></createTransactionResponse>",
        );
    });

    let err = client(server.base_url(), WireFormat::Xml)
        .create_transaction(
            TransactionRequest::charge(
                Decimal::new(100, 2),
                CreditCard::new("4007000000027", "2030-12"),
            ),
            Some(RefId::new("77").unwrap()),
        )
        .await
        .unwrap_err();

    assert!(err.is_gateway_error());
    assert!(!err.is_retryable());
    assert_eq!(err.response().unwrap().primary_message().code, "E00027");
    assert_eq!(err.to_string(), "The transaction was unsuccessful.");

    let reply = err.into_reply::<CreateTransactionResponse>().unwrap();
    assert_eq!(reply.ref_id.as_deref(), Some("77"));
    let tx = reply.transaction_response.unwrap();
    assert_eq!(tx.trans_id.as_deref(), Some("60200000001"));
    assert_eq!(tx.response_code.as_deref(), Some("2"));
    assert_eq!(tx.errors[0].error_code, "2");
    assert_eq!(tx.errors[0].error_text, "This transaction has been declined.");
}

#[tokio::test]
async fn declined_charge_over_json_keeps_transaction_response() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(POST).path(PATH);
        then.status(200).body(
            r#"{"transactionResponse":{"responseCode":"2","transId":"60200000003",
               "errors":[{"errorCode":"2","errorText":"This transaction has been declined."}]},
               "messages":{"resultCode":"Error",
               "message":[{"code":"E00027","text":"The transaction was unsuccessful."}]}}"#,
        );
    });

    let err = client(server.base_url(), WireFormat::Json)
        .create_transaction(
            TransactionRequest::charge(
                Decimal::new(100, 2),
                CreditCard::new("4007000000027", "2030-12"),
            ),
            None,
        )
        .await
        .unwrap_err();

    let tx = err
        .reply::<CreateTransactionResponse>()
        .and_then(|reply| reply.transaction_response.as_ref())
        .unwrap();
    assert_eq!(tx.trans_id.as_deref(), Some("60200000003"));
    assert_eq!(tx.errors[0].error_text, "This transaction has been declined.");
}

#[tokio::test]
async fn void_sends_ref_trans_id_only() {
    let server = MockServer::start();
    let mock = server.mock(|when, then| {
        when.method(POST)
            .path(PATH)
            .body_includes(
                "<transactionRequest><transactionType>voidTransaction</transactionType>\
                 <refTransId>60212345678</refTransId></transactionRequest>",
            );
        then.status(200).body(
            "<createTransactionResponse><messages><resultCode>Ok</resultCode>\
             <message><code>I00001</code><text>Successful.</text></message></messages>\
             </createTransactionResponse>",
        );
    });

    client(server.base_url(), WireFormat::Xml)
        .create_transaction(TransactionRequest::void("60212345678"), None)
        .await
        .unwrap();

    mock.assert();
}
