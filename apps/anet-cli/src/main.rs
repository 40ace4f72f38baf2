use anet::{RequestError, retry_when};
use clap::{Parser, Subcommand};

mod common;
mod logging;
mod transaction;

use common::{GlobalArgs, report};

#[derive(Parser)]
#[command(version, about, long_about = None)]
#[command(propagate_version = true)]
#[command(name = "anet")]
struct Cli {
    #[command(flatten)]
    global: GlobalArgs,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Check that the credentials are accepted
    Authenticate,
    /// Authorize and capture a card payment
    Charge(transaction::CardArgs),
    /// Authorize a card payment without capturing it
    Authorize(transaction::CardArgs),
    /// Capture an earlier authorization
    Capture(transaction::CaptureArgs),
    /// Refund a settled card transaction
    Refund(transaction::RefundArgs),
    /// Void an unsettled transaction
    Void(transaction::VoidArgs),
    /// Print the effective configuration with the key redacted
    ShowConfig,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    logging::init(cli.global.verbose, cli.global.log_json);

    match &cli.command {
        Commands::Authenticate => authenticate(&cli.global).await,
        Commands::Charge(args) => args.charge(&cli.global).await,
        Commands::Authorize(args) => args.authorize(&cli.global).await,
        Commands::Capture(args) => args.run(&cli.global).await,
        Commands::Refund(args) => args.run(&cli.global).await,
        Commands::Void(args) => args.run(&cli.global).await,
        Commands::ShowConfig => show_config(&cli.global),
    }
}

async fn authenticate(global: &GlobalArgs) -> anyhow::Result<()> {
    let client = global.client()?;
    let client = &client;
    let reply = retry_when(global.retries, RequestError::is_retryable, move || {
        client.authenticate_test()
    })
    .await
    .map_err(report)?;

    for message in &reply.messages.message {
        println!("{}: {}", message.code, message.text);
    }
    Ok(())
}

fn show_config(global: &GlobalArgs) -> anyhow::Result<()> {
    let config = global.load_config()?;
    println!("host:            {}", config.host);
    println!("wire-format:     {}", config.wire_format);
    println!("api-login-id:    {}", config.auth.api_login_id);
    println!("transaction-key: {}", config.auth.transaction_key);
    Ok(())
}
