use crate::secret::SecretString;
use serde::ser::SerializeStruct;
use serde::{Deserialize, Serialize, Serializer};
use std::fmt;

/// Merchant credentials sent at the top of every request.
#[derive(Debug, Clone)]
pub struct MerchantAuthentication {
    name: String,
    credential: MerchantCredential,
}

/// The single authentication secret of a [`MerchantAuthentication`] block.
///
/// The gateway accepts exactly one of these per request.
#[derive(Debug, Clone)]
pub enum MerchantCredential {
    TransactionKey(SecretString),
    SessionToken(SecretString),
    Password(SecretString),
    AccessToken(SecretString),
    ClientKey(SecretString),
}

impl MerchantCredential {
    fn element(&self) -> &'static str {
        match self {
            Self::TransactionKey(_) => "transactionKey",
            Self::SessionToken(_) => "sessionToken",
            Self::Password(_) => "password",
            Self::AccessToken(_) => "accessToken",
            Self::ClientKey(_) => "clientKey",
        }
    }

    fn secret(&self) -> &SecretString {
        match self {
            Self::TransactionKey(s)
            | Self::SessionToken(s)
            | Self::Password(s)
            | Self::AccessToken(s)
            | Self::ClientKey(s) => s,
        }
    }
}

impl MerchantAuthentication {
    #[must_use]
    pub fn new(name: impl Into<String>, credential: MerchantCredential) -> Self {
        Self {
            name: name.into(),
            credential,
        }
    }

    /// API login id + transaction key, the usual server-side pair.
    #[must_use]
    pub fn with_transaction_key(name: impl Into<String>, key: SecretString) -> Self {
        Self::new(name, MerchantCredential::TransactionKey(key))
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn credential(&self) -> &MerchantCredential {
        &self.credential
    }
}

impl Serialize for MerchantAuthentication {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("merchantAuthentication", 2)?;
        state.serialize_field("name", &self.name)?;
        state.serialize_field(self.credential.element(), self.credential.secret().expose())?;
        state.end()
    }
}

/// Overall outcome reported in a reply's `messages` block.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ResultCode {
    #[default]
    Ok,
    Error,
}

impl fmt::Display for ResultCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Ok => f.write_str("Ok"),
            Self::Error => f.write_str("Error"),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub code: String,
    pub text: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Messages {
    pub result_code: ResultCode,
    #[serde(default)]
    pub message: Vec<Message>,
}

/// Structured rejection returned by the gateway.
///
/// Always holds at least one message, so [`primary_message`](Self::primary_message)
/// cannot fail.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(try_from = "RawErrorResponse")]
pub struct ErrorResponse {
    result_code: ResultCode,
    primary: Message,
    rest: Vec<Message>,
}

#[derive(Deserialize)]
struct RawErrorResponse {
    messages: Messages,
}

impl TryFrom<RawErrorResponse> for ErrorResponse {
    type Error = &'static str;

    fn try_from(raw: RawErrorResponse) -> Result<Self, Self::Error> {
        Self::from_messages(raw.messages).ok_or("messages block carries no message")
    }
}

impl ErrorResponse {
    /// Build an envelope from a `messages` block; `None` when it is empty.
    #[must_use]
    pub fn from_messages(messages: Messages) -> Option<Self> {
        let mut iter = messages.message.into_iter();
        let primary = iter.next()?;
        Some(Self {
            result_code: messages.result_code,
            primary,
            rest: iter.collect(),
        })
    }

    #[must_use]
    pub fn result_code(&self) -> ResultCode {
        self.result_code
    }

    /// First message, the one the gateway considers authoritative.
    #[must_use]
    pub fn primary_message(&self) -> &Message {
        &self.primary
    }

    /// All messages in gateway order.
    pub fn messages(&self) -> impl Iterator<Item = &Message> {
        std::iter::once(&self.primary).chain(self.rest.iter())
    }
}

impl fmt::Display for ErrorResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.primary.code, self.primary.text)
    }
}
