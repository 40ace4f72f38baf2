use crate::common::{GlobalArgs, report};
use anet::schema::{CreateTransactionResponse, CreditCard, Order, TransactionRequest};
use anet::{RefId, RequestError, retry_when};
use clap::Args;
use rust_decimal::Decimal;

#[derive(Args)]
pub struct CardArgs {
    /// Amount in the merchant currency, e.g. 12.50
    #[arg(long)]
    amount: Decimal,

    #[arg(long)]
    card_number: String,

    /// YYYY-MM or MMYY
    #[arg(long)]
    expiration: String,

    #[arg(long)]
    card_code: Option<String>,

    #[arg(long)]
    invoice: Option<String>,

    #[arg(long, requires = "invoice")]
    description: Option<String>,

    #[command(flatten)]
    reference: RefArgs,
}

#[derive(Args)]
pub struct RefArgs {
    /// Merchant reference echoed back in the reply (at most 20 characters)
    #[arg(long)]
    ref_id: Option<String>,
}

impl RefArgs {
    fn ref_id(&self) -> anyhow::Result<Option<RefId>> {
        Ok(self.ref_id.clone().map(RefId::new).transpose()?)
    }
}

#[derive(Args)]
pub struct CaptureArgs {
    /// Transaction id of the authorization
    #[arg(long)]
    trans_id: String,

    /// Capture less than the authorized amount
    #[arg(long)]
    amount: Option<Decimal>,

    #[command(flatten)]
    reference: RefArgs,
}

#[derive(Args)]
pub struct RefundArgs {
    #[arg(long)]
    trans_id: String,

    #[arg(long)]
    amount: Decimal,

    /// Last four digits of the original card
    #[arg(long)]
    last_four: String,

    #[arg(long, default_value = "XXXX")]
    expiration: String,

    #[command(flatten)]
    reference: RefArgs,
}

#[derive(Args)]
pub struct VoidArgs {
    #[arg(long)]
    trans_id: String,

    #[command(flatten)]
    reference: RefArgs,
}

impl CardArgs {
    fn card(&self) -> CreditCard {
        let card = CreditCard::new(self.card_number.clone(), self.expiration.clone());
        match &self.card_code {
            Some(code) => card.with_card_code(code.clone()),
            None => card,
        }
    }

    fn with_order(&self, request: TransactionRequest) -> TransactionRequest {
        match &self.invoice {
            Some(invoice) => request.with_order(Order {
                invoice_number: Some(invoice.clone()),
                description: self.description.clone(),
            }),
            None => request,
        }
    }

    pub async fn charge(&self, global: &GlobalArgs) -> anyhow::Result<()> {
        let request = self.with_order(TransactionRequest::charge(self.amount, self.card()));
        submit(global, &request, self.reference.ref_id()?.as_ref()).await
    }

    pub async fn authorize(&self, global: &GlobalArgs) -> anyhow::Result<()> {
        let request = self.with_order(TransactionRequest::authorize(self.amount, self.card()));
        submit(global, &request, self.reference.ref_id()?.as_ref()).await
    }
}

impl CaptureArgs {
    pub async fn run(&self, global: &GlobalArgs) -> anyhow::Result<()> {
        let request = TransactionRequest::capture_prior(self.trans_id.clone(), self.amount);
        submit(global, &request, self.reference.ref_id()?.as_ref()).await
    }
}

impl RefundArgs {
    pub async fn run(&self, global: &GlobalArgs) -> anyhow::Result<()> {
        let card = CreditCard::new(format!("XXXX{}", self.last_four), self.expiration.clone());
        let request = TransactionRequest::refund(self.amount, card, self.trans_id.clone());
        submit(global, &request, self.reference.ref_id()?.as_ref()).await
    }
}

impl VoidArgs {
    pub async fn run(&self, global: &GlobalArgs) -> anyhow::Result<()> {
        let request = TransactionRequest::void(self.trans_id.clone());
        submit(global, &request, self.reference.ref_id()?.as_ref()).await
    }
}

async fn submit(
    global: &GlobalArgs,
    request: &TransactionRequest,
    ref_id: Option<&RefId>,
) -> anyhow::Result<()> {
    let client = global.client()?;
    let client = &client;
    let result = retry_when(global.retries, RequestError::is_retryable, move || {
        client.create_transaction(request.clone(), ref_id.cloned())
    })
    .await;

    match result {
        Ok(reply) => {
            print_reply(&reply);
            Ok(())
        }
        Err(err) => {
            if let Some(reply) = err.reply::<CreateTransactionResponse>() {
                print_reply(reply);
            }
            Err(report(err))
        }
    }
}

fn print_reply(reply: &CreateTransactionResponse) {
    if let Some(ref_id) = &reply.ref_id {
        println!("refId:        {ref_id}");
    }
    let Some(tx) = &reply.transaction_response else {
        println!("result:       {}", reply.messages.result_code);
        return;
    };
    let status = match tx.response_code.as_deref() {
        Some("1") => "approved",
        Some("2") => "declined",
        Some("4") => "held for review",
        _ => "error",
    };
    println!("status:       {status}");
    if let Some(id) = &tx.trans_id {
        println!("transId:      {id}");
    }
    if let Some(code) = tx.auth_code.as_deref().filter(|c| !c.is_empty()) {
        println!("authCode:     {code}");
    }
    if let Some(account) = &tx.account_number {
        println!("account:      {account}");
    }
    for message in &tx.messages {
        println!("message:      {} {}", message.code, message.description);
    }
    for error in &tx.errors {
        println!("error:        {} {}", error.error_code, error.error_text);
    }
}
