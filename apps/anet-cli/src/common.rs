use anet::{Config, ConfigOverrides, GatewayClient, RequestError, WireFormat};
use clap::{Args, ValueEnum};
use std::path::PathBuf;

#[derive(Clone, Copy, ValueEnum)]
pub enum Format {
    Xml,
    Json,
}

impl From<Format> for WireFormat {
    fn from(format: Format) -> Self {
        match format {
            Format::Xml => WireFormat::Xml,
            Format::Json => WireFormat::Json,
        }
    }
}

#[derive(Args)]
pub struct GlobalArgs {
    /// JSON config file (falls back to $ANET_CONFIG)
    #[arg(short = 'c', long, global = true)]
    config: Option<PathBuf>,

    /// Gateway base URL, e.g. https://apitest.authorize.net
    #[arg(long, global = true)]
    host: Option<String>,

    #[arg(long, global = true)]
    api_login_id: Option<String>,

    /// Prefer AUTH_TRANSACTION_KEY; command lines end up in shell history
    #[arg(long, global = true)]
    transaction_key: Option<String>,

    /// Wire encoding
    #[arg(short = 'f', long, value_enum, global = true)]
    format: Option<Format>,

    /// Attempts per call; gateway rejections are not retried
    #[arg(long, default_value_t = 1, global = true)]
    pub retries: u32,

    /// Log verbosity level (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    pub log_json: bool,
}

impl GlobalArgs {
    /// Layered config: defaults, file, environment, then these flags.
    pub fn load_config(&self) -> anyhow::Result<Config> {
        let overrides = ConfigOverrides {
            host: self.host.clone(),
            api_login_id: self.api_login_id.clone(),
            transaction_key: self.transaction_key.clone(),
            wire_format: self.format.map(WireFormat::from),
        };
        let file = self
            .config
            .clone()
            .or_else(|| std::env::var_os(anet::config::CONFIG_PATH_ENV).map(PathBuf::from));

        if let Some(path) = &file
            && !path.is_file()
        {
            anyhow::bail!("config file does not exist: {}", path.display());
        }

        Ok(Config::load_with(file.as_deref(), &overrides)?)
    }

    pub fn client(&self) -> anyhow::Result<GatewayClient> {
        let config = self.load_config()?;
        Ok(GatewayClient::new(&config)?)
    }
}

/// Render a failed call with the gateway's error code when there is one.
pub fn report(err: RequestError) -> anyhow::Error {
    match (err.response(), err.cause()) {
        (Some(response), None) => anyhow::anyhow!("gateway rejected the request: {response}"),
        _ => anyhow::Error::new(err),
    }
}
