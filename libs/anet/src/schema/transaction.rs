use super::common::{MerchantAuthentication, Messages};
use super::payment::Payment;
use super::{GatewayRequest, GatewayResponse};
use rust_decimal::Decimal;
use serde::de::{self, Deserializer, IgnoredAny, MapAccess, SeqAccess, Visitor};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::marker::PhantomData;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum TransactionType {
    /// Authorize and capture in one step (a sale).
    #[default]
    AuthCaptureTransaction,
    AuthOnlyTransaction,
    /// Capture a previous `AuthOnlyTransaction` by its transaction id.
    PriorAuthCaptureTransaction,
    CaptureOnlyTransaction,
    RefundTransaction,
    VoidTransaction,
}

/// Body of `createTransactionRequest`.
///
/// Use the constructors for the common flows and fill the remaining public
/// fields as needed.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionRequest {
    pub transaction_type: TransactionType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub amount: Option<Decimal>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub currency_code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payment: Option<Payment>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub auth_code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ref_trans_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub order: Option<Order>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub line_items: Option<LineItems>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tax: Option<ExtendedAmount>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duty: Option<ExtendedAmount>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub shipping: Option<ExtendedAmount>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tax_exempt: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub po_number: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub customer: Option<CustomerData>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bill_to: Option<CustomerAddress>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ship_to: Option<NameAndAddress>,
    #[serde(rename = "customerIP", skip_serializing_if = "Option::is_none")]
    pub customer_ip: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub employee_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_fields: Option<UserFields>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub surcharge: Option<ExtendedAmount>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub merchant_descriptor: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tip: Option<ExtendedAmount>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub processing_options: Option<ProcessingOptions>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subsequent_auth_information: Option<SubsequentAuthInformation>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ship_from: Option<NameAndAddress>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub authorization_indicator_type: Option<AuthorizationIndicator>,
}

impl TransactionRequest {
    /// Authorize and capture `amount` in one step.
    #[must_use]
    pub fn charge(amount: Decimal, payment: impl Into<Payment>) -> Self {
        Self {
            transaction_type: TransactionType::AuthCaptureTransaction,
            amount: Some(amount),
            payment: Some(payment.into()),
            ..Self::default()
        }
    }

    /// Authorize `amount` without capturing it.
    #[must_use]
    pub fn authorize(amount: Decimal, payment: impl Into<Payment>) -> Self {
        Self {
            transaction_type: TransactionType::AuthOnlyTransaction,
            amount: Some(amount),
            payment: Some(payment.into()),
            ..Self::default()
        }
    }

    /// Capture an earlier authorization. `amount` may be lower than the
    /// authorized amount; `None` captures the full authorization.
    #[must_use]
    pub fn capture_prior(ref_trans_id: impl Into<String>, amount: Option<Decimal>) -> Self {
        Self {
            transaction_type: TransactionType::PriorAuthCaptureTransaction,
            amount,
            ref_trans_id: Some(ref_trans_id.into()),
            ..Self::default()
        }
    }

    /// Refund a settled transaction. For cards the payment only needs the
    /// last four digits (`XXXX1111`) and `XXXX` as expiration date.
    #[must_use]
    pub fn refund(
        amount: Decimal,
        payment: impl Into<Payment>,
        ref_trans_id: impl Into<String>,
    ) -> Self {
        Self {
            transaction_type: TransactionType::RefundTransaction,
            amount: Some(amount),
            payment: Some(payment.into()),
            ref_trans_id: Some(ref_trans_id.into()),
            ..Self::default()
        }
    }

    /// Void an unsettled transaction.
    #[must_use]
    pub fn void(ref_trans_id: impl Into<String>) -> Self {
        Self {
            transaction_type: TransactionType::VoidTransaction,
            ref_trans_id: Some(ref_trans_id.into()),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_order(mut self, order: Order) -> Self {
        self.order = Some(order);
        self
    }

    #[must_use]
    pub fn with_line_item(mut self, item: LineItem) -> Self {
        self.line_items
            .get_or_insert_with(LineItems::default)
            .line_item
            .push(item);
        self
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateTransactionRequest {
    pub merchant_authentication: MerchantAuthentication,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ref_id: Option<String>,
    pub transaction_request: TransactionRequest,
}

impl GatewayRequest for CreateTransactionRequest {
    const ELEMENT: &'static str = "createTransactionRequest";
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateTransactionResponse {
    #[serde(default)]
    pub ref_id: Option<String>,
    pub messages: Messages,
    #[serde(default)]
    pub transaction_response: Option<TransactionResponse>,
}

impl GatewayResponse for CreateTransactionResponse {
    const ELEMENT: &'static str = "createTransactionResponse";

    fn messages(&self) -> &Messages {
        &self.messages
    }
}

/// Processor-level outcome of a transaction.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionResponse {
    /// `1` approved, `2` declined, `3` error, `4` held for review.
    #[serde(default)]
    pub response_code: Option<String>,
    #[serde(default)]
    pub auth_code: Option<String>,
    #[serde(default)]
    pub avs_result_code: Option<String>,
    #[serde(default)]
    pub cvv_result_code: Option<String>,
    #[serde(default)]
    pub cavv_result_code: Option<String>,
    #[serde(default)]
    pub trans_id: Option<String>,
    #[serde(default, rename = "refTransID")]
    pub ref_trans_id: Option<String>,
    #[serde(default)]
    pub trans_hash: Option<String>,
    #[serde(default)]
    pub test_request: Option<String>,
    #[serde(default)]
    pub account_number: Option<String>,
    #[serde(default)]
    pub account_type: Option<String>,
    #[serde(default)]
    pub network_trans_id: Option<String>,
    #[serde(default, deserialize_with = "message_list")]
    pub messages: Vec<TransactionMessage>,
    #[serde(default, deserialize_with = "error_list")]
    pub errors: Vec<TransactionError>,
}

impl TransactionResponse {
    #[must_use]
    pub fn is_approved(&self) -> bool {
        self.response_code.as_deref() == Some("1")
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct TransactionMessage {
    pub code: String,
    pub description: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionError {
    pub error_code: String,
    pub error_text: String,
}

// XML wraps repeated items (`<messages><message>..</message></messages>`),
// JSON sends a bare array. Accept both.
struct WrappedList<T> {
    item: &'static str,
    marker: PhantomData<T>,
}

impl<'de, T: Deserialize<'de>> Visitor<'de> for WrappedList<T> {
    type Value = Vec<T>;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "a list or an element holding `{}` items", self.item)
    }

    fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> Result<Self::Value, A::Error> {
        let mut items = Vec::new();
        while let Some(item) = seq.next_element()? {
            items.push(item);
        }
        Ok(items)
    }

    fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<Self::Value, A::Error> {
        let mut items = Vec::new();
        while let Some(key) = map.next_key::<String>()? {
            if key == self.item {
                items.extend(map.next_value::<Vec<T>>()?);
            } else {
                map.next_value::<IgnoredAny>()?;
            }
        }
        Ok(items)
    }

    fn visit_str<E: de::Error>(self, value: &str) -> Result<Self::Value, E> {
        if value.trim().is_empty() {
            Ok(Vec::new())
        } else {
            Err(E::invalid_value(de::Unexpected::Str(value), &self))
        }
    }

    fn visit_unit<E: de::Error>(self) -> Result<Self::Value, E> {
        Ok(Vec::new())
    }
}

fn wrapped_list<'de, D, T>(deserializer: D, item: &'static str) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    deserializer.deserialize_any(WrappedList {
        item,
        marker: PhantomData,
    })
}

fn message_list<'de, D: Deserializer<'de>>(d: D) -> Result<Vec<TransactionMessage>, D::Error> {
    wrapped_list(d, "message")
}

fn error_list<'de, D: Deserializer<'de>>(d: D) -> Result<Vec<TransactionError>, D::Error> {
    wrapped_list(d, "error")
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub invoice_number: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl Order {
    #[must_use]
    pub fn new(invoice_number: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            invoice_number: Some(invoice_number.into()),
            description: Some(description.into()),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LineItems {
    pub line_item: Vec<LineItem>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LineItem {
    pub item_id: String,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub quantity: Decimal,
    pub unit_price: Decimal,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub taxable: Option<bool>,
}

/// Amount with an optional label, used for tax, duty, shipping, tip and surcharge.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExtendedAmount {
    pub amount: Decimal,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum CustomerType {
    Individual,
    Business,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CustomerData {
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub customer_type: Option<CustomerType>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NameAndAddress {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub company: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub zip: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,
}

/// Billing address: a [`NameAndAddress`] plus contact details.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomerAddress {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub company: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub zip: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone_number: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fax_number: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserFields {
    pub user_field: Vec<UserField>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UserField {
    pub name: String,
    pub value: String,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessingOptions {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_first_recurring_payment: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_first_subsequent_auth: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_subsequent_auth: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_stored_credentials: Option<bool>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum MerchantInitTransReason {
    Resubmission,
    DelayedCharge,
    Reauthorization,
    NoShow,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubsequentAuthInformation {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub original_network_trans_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub original_auth_amount: Option<Decimal>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<MerchantInitTransReason>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum AuthIndicator {
    Pre,
    Final,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthorizationIndicator {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub authorization_indicator: Option<AuthIndicator>,
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;
    use crate::schema::CreditCard;

    #[test]
    fn charge_fields_follow_schema_order() {
        let request = TransactionRequest::charge(
            Decimal::new(500, 2),
            CreditCard::new("5424000000000015", "2025-12"),
        )
        .with_order(Order::new("INV-12345", "Product Description"));

        let json = serde_json::to_string(&request).unwrap();
        let kinds = ["transactionType", "amount", "payment", "order"];
        let positions: Vec<_> = kinds.iter().map(|k| json.find(k).unwrap()).collect();
        assert!(positions.windows(2).all(|w| w[0] < w[1]), "{json}");
        assert!(json.contains(r#""amount":"5.00""#), "{json}");
        assert!(json.contains(r#""transactionType":"authCaptureTransaction""#));
    }

    #[test]
    fn void_carries_only_reference() {
        let json = serde_json::to_value(TransactionRequest::void("60167849431")).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "transactionType": "voidTransaction",
                "refTransId": "60167849431",
            })
        );
    }

    #[test]
    fn line_items_accumulate() {
        let item = |id: &str| LineItem {
            item_id: id.to_owned(),
            name: "vase".to_owned(),
            description: None,
            quantity: Decimal::new(18, 0),
            unit_price: Decimal::new(4500, 2),
            taxable: None,
        };
        let request = TransactionRequest::authorize(
            Decimal::new(5, 0),
            CreditCard::new("5424000000000015", "2025-12"),
        )
        .with_line_item(item("1"))
        .with_line_item(item("2"));

        assert_eq!(request.line_items.unwrap().line_item.len(), 2);
    }

    #[test]
    fn customer_ip_uses_gateway_casing() {
        let request = TransactionRequest {
            customer_ip: Some("192.168.0.1".to_owned()),
            ..TransactionRequest::void("1")
        };
        let json = serde_json::to_string(&request).unwrap();
        assert!(json.contains(r#""customerIP":"192.168.0.1""#));
    }

    #[test]
    fn transaction_response_json_lists() {
        let json = r#"{
            "responseCode": "1",
            "authCode": "QWERTY",
            "transId": "60167849431",
            "refTransID": "",
            "accountNumber": "XXXX0015",
            "accountType": "Mastercard",
            "messages": [{"code": "1", "description": "This transaction has been approved."}]
        }"#;
        let response: TransactionResponse = serde_json::from_str(json).unwrap();
        assert!(response.is_approved());
        assert_eq!(response.trans_id.as_deref(), Some("60167849431"));
        assert_eq!(response.messages.len(), 1);
        assert!(response.errors.is_empty());
    }

    #[test]
    fn transaction_response_xml_wrapped_lists() {
        let xml = "<transactionResponse>\
            <responseCode>2</responseCode>\
            <transId>0</transId>\
            <errors><error><errorCode>2</errorCode><errorText>This transaction has been declined.</errorText></error></errors>\
            </transactionResponse>";
        let response: TransactionResponse = quick_xml::de::from_str(xml).unwrap();
        assert!(!response.is_approved());
        assert_eq!(response.errors.len(), 1);
        assert_eq!(response.errors[0].error_code, "2");
        assert!(response.messages.is_empty());
    }
}
