//! Gateway schema types
//!
//! Field names and field order follow `AnetApiSchema.xsd`: the gateway
//! validates element order in XML requests, so struct fields must stay in
//! schema order.

mod authenticate;
mod common;
mod payment;
mod transaction;

use serde::Serialize;
use serde::de::DeserializeOwned;

pub use authenticate::{AuthenticateTestRequest, AuthenticateTestResponse};
pub use common::{
    ErrorResponse, MerchantAuthentication, MerchantCredential, Message, Messages, ResultCode,
};
pub use payment::{
    AccountType, BankAccount, CreditCard, EcheckType, OpaqueData, Payment, TrackData,
};
pub use transaction::{
    AuthIndicator, AuthorizationIndicator, CreateTransactionRequest, CreateTransactionResponse,
    CustomerAddress, CustomerData, CustomerType, ExtendedAmount, LineItem, LineItems,
    MerchantInitTransReason, NameAndAddress, Order, ProcessingOptions, SubsequentAuthInformation,
    TransactionError, TransactionMessage, TransactionRequest, TransactionResponse,
    TransactionType, UserField, UserFields,
};

/// Namespace carried by every XML request root element.
pub const SCHEMA_NAMESPACE: &str = "AnetApi/xml/v1/schema/AnetApiSchema.xsd";

/// A top-level gateway request document.
///
/// `ELEMENT` is the request element name, used as the XML root and as the
/// single key of the JSON wrapper object.
pub trait GatewayRequest: Serialize {
    const ELEMENT: &'static str;
}

/// A top-level gateway response document.
///
/// Replies are owned, thread-safe values so a rejected reply can travel inside
/// [`RequestError`](crate::RequestError).
pub trait GatewayResponse: DeserializeOwned + Send + Sync + 'static {
    /// Root element name of the XML reply.
    const ELEMENT: &'static str;

    /// The `messages` block every reply carries.
    fn messages(&self) -> &Messages;
}
