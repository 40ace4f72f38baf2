use super::common::{MerchantAuthentication, Messages};
use super::{GatewayRequest, GatewayResponse};
use serde::{Deserialize, Serialize};

/// Credential check: succeeds when the login id and key are accepted.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthenticateTestRequest {
    pub merchant_authentication: MerchantAuthentication,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ref_id: Option<String>,
}

impl AuthenticateTestRequest {
    #[must_use]
    pub fn new(merchant_authentication: MerchantAuthentication) -> Self {
        Self {
            merchant_authentication,
            ref_id: None,
        }
    }
}

impl GatewayRequest for AuthenticateTestRequest {
    const ELEMENT: &'static str = "authenticateTestRequest";
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthenticateTestResponse {
    #[serde(default)]
    pub ref_id: Option<String>,
    pub messages: Messages,
}

impl GatewayResponse for AuthenticateTestResponse {
    const ELEMENT: &'static str = "authenticateTestResponse";

    fn messages(&self) -> &Messages {
        &self.messages
    }
}
