use serde::ser::SerializeStruct;
use serde::{Serialize, Serializer};

/// Payment method of a transaction. Exactly one method per request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Payment {
    CreditCard(CreditCard),
    BankAccount(BankAccount),
    TrackData(TrackData),
    /// Accept.js / mobile wallet token.
    OpaqueData(OpaqueData),
}

impl Serialize for Payment {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("payment", 1)?;
        match self {
            Self::CreditCard(card) => state.serialize_field("creditCard", card)?,
            Self::BankAccount(account) => state.serialize_field("bankAccount", account)?,
            Self::TrackData(track) => state.serialize_field("trackData", track)?,
            Self::OpaqueData(data) => state.serialize_field("opaqueData", data)?,
        }
        state.end()
    }
}

impl From<CreditCard> for Payment {
    fn from(card: CreditCard) -> Self {
        Self::CreditCard(card)
    }
}

impl From<BankAccount> for Payment {
    fn from(account: BankAccount) -> Self {
        Self::BankAccount(account)
    }
}

impl From<TrackData> for Payment {
    fn from(track: TrackData) -> Self {
        Self::TrackData(track)
    }
}

impl From<OpaqueData> for Payment {
    fn from(data: OpaqueData) -> Self {
        Self::OpaqueData(data)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreditCard {
    /// Full number, or `XXXX` followed by the last four digits for refunds.
    pub card_number: String,
    /// `YYYY-MM`, `MMYY`, or `XXXX` when unknown.
    pub expiration_date: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub card_code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_payment_token: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cryptogram: Option<String>,
}

impl CreditCard {
    #[must_use]
    pub fn new(card_number: impl Into<String>, expiration_date: impl Into<String>) -> Self {
        Self {
            card_number: card_number.into(),
            expiration_date: expiration_date.into(),
            card_code: None,
            is_payment_token: None,
            cryptogram: None,
        }
    }

    #[must_use]
    pub fn with_card_code(mut self, code: impl Into<String>) -> Self {
        self.card_code = Some(code.into());
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum AccountType {
    Checking,
    Savings,
    BusinessChecking,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum EcheckType {
    Ppd,
    Web,
    Ccd,
    Tel,
    Arc,
    Boc,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BankAccount {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub account_type: Option<AccountType>,
    pub routing_number: String,
    pub account_number: String,
    pub name_on_account: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub echeck_type: Option<EcheckType>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bank_name: Option<String>,
}

/// Magnetic stripe data; the gateway takes one track or the other.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TrackData {
    Track1(String),
    Track2(String),
}

impl Serialize for TrackData {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("trackData", 1)?;
        match self {
            Self::Track1(track) => state.serialize_field("track1", track)?,
            Self::Track2(track) => state.serialize_field("track2", track)?,
        }
        state.end()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OpaqueData {
    pub data_descriptor: String,
    pub data_value: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data_key: Option<String>,
}
