//! Client configuration
//!
//! Layers, later wins:
//! 1. built-in defaults (`https://api.authorize.net`, XML)
//! 2. a JSON config file
//! 3. environment: `AUTHNET_HOST`, `AUTH_API_LOGIN_ID`, `AUTH_TRANSACTION_KEY`,
//!    `ANET_WIRE_FORMAT`
//! 4. explicit overrides (command line)
//!
//! ```json
//! {
//!   "authnet-host": "https://apitest.authorize.net",
//!   "auth": { "api-login-id": "5KP3u95bQpv", "transaction-key": "346HZ32z3fP4hTG2" },
//!   "wire-format": "json"
//! }
//! ```

use crate::codec::WireFormat;
use crate::schema::MerchantAuthentication;
use crate::secret::SecretString;
use figment::Figment;
use figment::providers::{Env, Format, Json, Serialized};
use serde::de::{self, Deserializer, Visitor};
use serde::Deserialize;
use std::fmt;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Production endpoint host.
pub const DEFAULT_HOST: &str = "https://api.authorize.net";
/// Sandbox endpoint host.
pub const SANDBOX_HOST: &str = "https://apitest.authorize.net";
/// Environment variable naming the JSON config file for [`Config::load_from_env`].
pub const CONFIG_PATH_ENV: &str = "ANET_CONFIG";

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ConfigError {
    #[error("no auth config found")]
    MissingCredentials,

    #[error("auth.{0} must not be empty")]
    EmptyField(&'static str),

    #[error("environment variable {0} not set")]
    MissingPathVar(&'static str),

    #[error("cannot read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config: {0}")]
    Figment(#[from] Box<figment::Error>),
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self::Figment(Box::new(err))
    }
}

/// Immutable client configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// Base URL; `/xml/v1/request.api` is appended by the client.
    pub host: String,
    pub auth: Credentials,
    pub wire_format: WireFormat,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Credentials {
    #[serde(rename = "api-login-id", default, deserialize_with = "string_like")]
    pub api_login_id: String,
    #[serde(
        rename = "transaction-key",
        default = "empty_secret",
        deserialize_with = "secret_like"
    )]
    pub transaction_key: SecretString,
}

fn empty_secret() -> SecretString {
    SecretString::new(String::new())
}

// Environment values that look numeric arrive as numbers; ids and keys are
// always text.
struct StringLike;

impl Visitor<'_> for StringLike {
    type Value = String;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a string")
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<String, E> {
        Ok(v.to_owned())
    }

    fn visit_string<E: de::Error>(self, v: String) -> Result<String, E> {
        Ok(v)
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<String, E> {
        Ok(v.to_string())
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<String, E> {
        Ok(v.to_string())
    }
}

fn string_like<'de, D: Deserializer<'de>>(d: D) -> Result<String, D::Error> {
    d.deserialize_any(StringLike)
}

fn secret_like<'de, D: Deserializer<'de>>(d: D) -> Result<SecretString, D::Error> {
    string_like(d).map(SecretString::from)
}

impl Credentials {
    #[must_use]
    pub fn new(api_login_id: impl Into<String>, transaction_key: impl Into<String>) -> Self {
        Self {
            api_login_id: api_login_id.into(),
            transaction_key: SecretString::new(transaction_key),
        }
    }

    /// The `merchantAuthentication` block for these credentials.
    #[must_use]
    pub fn merchant_authentication(&self) -> MerchantAuthentication {
        MerchantAuthentication::with_transaction_key(
            self.api_login_id.clone(),
            self.transaction_key.clone(),
        )
    }
}

#[derive(Deserialize)]
struct RawConfig {
    #[serde(rename = "authnet-host", default)]
    host: Option<String>,
    #[serde(default)]
    auth: Option<Credentials>,
    #[serde(rename = "wire-format", default)]
    wire_format: Option<WireFormat>,
}

/// Values set explicitly by the caller, applied over every other layer.
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub host: Option<String>,
    pub api_login_id: Option<String>,
    pub transaction_key: Option<String>,
    pub wire_format: Option<WireFormat>,
}

impl ConfigOverrides {
    fn merge_into(&self, mut figment: Figment) -> Figment {
        if let Some(host) = &self.host {
            figment = figment.merge(Serialized::default("authnet-host", host));
        }
        if let Some(id) = &self.api_login_id {
            figment = figment.merge(Serialized::default("auth.api-login-id", id));
        }
        if let Some(key) = &self.transaction_key {
            figment = figment.merge(Serialized::default("auth.transaction-key", key));
        }
        if let Some(format) = self.wire_format {
            figment = figment.merge(Serialized::default("wire-format", format));
        }
        figment
    }
}

fn env_layer() -> Env {
    Env::raw().filter_map(|key| {
        let mapped = match key.as_str().to_ascii_uppercase().as_str() {
            "AUTHNET_HOST" => "authnet-host",
            "AUTH_API_LOGIN_ID" => "auth.api-login-id",
            "AUTH_TRANSACTION_KEY" => "auth.transaction-key",
            "ANET_WIRE_FORMAT" => "wire-format",
            _ => return None,
        };
        Some(mapped.into())
    })
}

impl Config {
    /// Build a config in code, without consulting files or the environment.
    #[must_use]
    pub fn from_parts(host: impl Into<String>, auth: Credentials, wire_format: WireFormat) -> Self {
        Self {
            host: host.into(),
            auth,
            wire_format,
        }
    }

    /// Load from a JSON file, then apply environment variables.
    ///
    /// # Errors
    /// Returns `ConfigError` if the file cannot be read or parsed, or if
    /// credentials are missing after all layers are applied.
    pub fn load_from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        Self::load_with(Some(path.as_ref()), &ConfigOverrides::default())
    }

    /// Load from the JSON file named by `ANET_CONFIG`, then apply environment
    /// variables.
    ///
    /// # Errors
    /// Returns `ConfigError::MissingPathVar` if `ANET_CONFIG` is unset, otherwise
    /// as [`load_from_file`](Self::load_from_file).
    pub fn load_from_env() -> Result<Self, ConfigError> {
        let path = std::env::var_os(CONFIG_PATH_ENV)
            .ok_or(ConfigError::MissingPathVar(CONFIG_PATH_ENV))?;
        Self::load_from_file(PathBuf::from(path))
    }

    /// Load from environment variables alone.
    ///
    /// # Errors
    /// Returns `ConfigError` if credentials are missing or invalid.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_with(None, &ConfigOverrides::default())
    }

    /// Full layering: defaults, optional file, environment, overrides.
    ///
    /// # Errors
    /// Returns `ConfigError` if any layer is malformed or credentials are
    /// missing after all layers are applied.
    pub fn load_with(file: Option<&Path>, overrides: &ConfigOverrides) -> Result<Self, ConfigError> {
        let mut figment = Figment::new()
            .merge(Serialized::default("authnet-host", DEFAULT_HOST))
            .merge(Serialized::default("wire-format", WireFormat::default()));

        if let Some(path) = file {
            let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
                path: path.to_path_buf(),
                source,
            })?;
            figment = figment.merge(Json::string(&contents));
            tracing::debug!(path = %path.display(), "config file loaded");
        }

        figment = overrides.merge_into(figment.merge(env_layer()));

        let raw: RawConfig = figment.extract()?;
        Self::validate(raw)
    }

    fn validate(raw: RawConfig) -> Result<Self, ConfigError> {
        let auth = raw.auth.ok_or(ConfigError::MissingCredentials)?;
        if auth.api_login_id.trim().is_empty() {
            return Err(ConfigError::EmptyField("api-login-id"));
        }
        if auth.transaction_key.is_empty() {
            return Err(ConfigError::EmptyField("transaction-key"));
        }

        let host = raw
            .host
            .filter(|h| !h.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_HOST.to_owned());

        Ok(Self {
            host,
            auth,
            wire_format: raw.wire_format.unwrap_or_default(),
        })
    }
}
