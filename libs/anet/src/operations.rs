//! Pre-filled requests for the common gateway calls.

use crate::client::GatewayClient;
use crate::error::RequestError;
use crate::ref_id::RefId;
use crate::schema::{
    AuthenticateTestRequest, AuthenticateTestResponse, CreateTransactionRequest,
    CreateTransactionResponse, TransactionRequest,
};

impl GatewayClient {
    /// Check that the configured credentials are accepted.
    ///
    /// # Errors
    /// Returns `RequestError`; rejected credentials come back as a gateway
    /// error (`E00007`).
    pub async fn authenticate_test(&self) -> Result<AuthenticateTestResponse, RequestError> {
        let request = AuthenticateTestRequest::new(self.merchant_authentication());
        let mut response = AuthenticateTestResponse::default();
        self.send_request(&request, &mut response).await?;
        Ok(response)
    }

    /// Submit a transaction: charge, authorization, capture, refund or void.
    ///
    /// An `Ok` reply may still carry a declined transaction; check
    /// [`TransactionResponse::is_approved`](crate::schema::TransactionResponse::is_approved).
    ///
    /// # Errors
    /// Returns `RequestError` as [`send_request`](GatewayClient::send_request).
    /// A declined or failed transaction usually arrives as `E00027`; the
    /// `transactionResponse` with the processor's reason is then in
    /// `err.reply::<CreateTransactionResponse>()`.
    pub async fn create_transaction(
        &self,
        transaction: TransactionRequest,
        ref_id: Option<RefId>,
    ) -> Result<CreateTransactionResponse, RequestError> {
        let request = CreateTransactionRequest {
            merchant_authentication: self.merchant_authentication(),
            ref_id: ref_id.map(RefId::into_inner),
            transaction_request: transaction,
        };
        let mut response = CreateTransactionResponse::default();
        self.send_request(&request, &mut response).await?;
        Ok(response)
    }
}
