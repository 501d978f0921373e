//! Configuration for the smart wallet agent.
//!
//! Settings are loaded with priority: env var > `~/.smartwallet/config.toml` > default.
//! Secrets live in env vars (optionally from `~/.smartwallet/.env`, loaded via
//! dotenvy early in startup) and are wrapped in `SecretString`.

mod channels;
pub(crate) mod helpers;
mod llm;

use std::collections::BTreeMap;
use std::str::FromStr;

use alloy::primitives::Address;
use secrecy::SecretString;

use crate::error::ConfigError;
use crate::settings::Settings;
use crate::wallet::{NativeCurrency, NetworkParams, SupportedTokens};

pub use self::channels::GatewayConfig;
pub use self::llm::LlmConfig;

/// Main configuration for the agent.
#[derive(Debug, Clone)]
pub struct Config {
    pub llm: LlmConfig,
    pub chain: ChainConfig,
    pub price: PriceConfig,
    pub gateway: GatewayConfig,
}

/// Chain, signer and contract configuration.
#[derive(Debug, Clone)]
pub struct ChainConfig {
    pub network: NetworkParams,
    pub rpc_url: String,
    pub factory_address: Address,
    /// Hex private key of the signer that owns the smart wallet.
    pub signer_key: Option<SecretString>,
    pub supported_tokens: SupportedTokens,
    pub confirmations: u64,
}

impl ChainConfig {
    pub(crate) fn resolve(settings: &Settings) -> Result<Self, ConfigError> {
        let chain = &settings.chain;

        let rpc_url = helpers::optional_env("CHAIN_RPC_URL")?.unwrap_or_else(|| chain.rpc_url.clone());
        url::Url::parse(&rpc_url).map_err(|e| ConfigError::InvalidValue {
            key: "CHAIN_RPC_URL".to_string(),
            message: format!("must be an absolute URL: {e}"),
        })?;

        let chain_id = match helpers::optional_env("CHAIN_ID")? {
            Some(raw) => parse_chain_id(&raw).ok_or_else(|| ConfigError::InvalidValue {
                key: "CHAIN_ID".to_string(),
                message: format!("expected a decimal or 0x-prefixed hex chain id, got '{raw}'"),
            })?,
            None => chain.chain_id,
        };
        if chain_id == 0 {
            return Err(ConfigError::InvalidValue {
                key: "CHAIN_ID".to_string(),
                message: "must be > 0".to_string(),
            });
        }

        let factory_raw = helpers::optional_env("WALLET_FACTORY_ADDRESS")?
            .unwrap_or_else(|| chain.factory_address.clone());
        let factory_address =
            Address::from_str(&factory_raw).map_err(|e| ConfigError::InvalidValue {
                key: "WALLET_FACTORY_ADDRESS".to_string(),
                message: format!("must be a 0x-prefixed address: {e}"),
            })?;

        let supported_tokens = match helpers::optional_env("SUPPORTED_TOKENS")? {
            Some(raw) => parse_supported_tokens(&raw, "SUPPORTED_TOKENS")?,
            None => tokens_from_settings(&chain.supported_tokens)?,
        };

        let confirmations =
            helpers::parse_optional_env::<u64>("CHAIN_CONFIRMATIONS", "a non-negative integer")?
                .unwrap_or(chain.confirmations);

        let network = NetworkParams {
            chain_id,
            chain_name: helpers::optional_env("CHAIN_NAME")?
                .unwrap_or_else(|| chain.chain_name.clone()),
            native_currency: NativeCurrency {
                name: chain.currency_name.clone(),
                symbol: chain.currency_symbol.clone(),
                decimals: 18,
            },
            rpc_urls: vec![rpc_url.clone()],
            block_explorer_urls: vec![chain.explorer_url.clone()],
        };

        Ok(Self {
            network,
            rpc_url,
            factory_address,
            signer_key: helpers::optional_env("WALLET_PRIVATE_KEY")?.map(SecretString::from),
            supported_tokens,
            confirmations,
        })
    }
}

/// Token price API configuration.
#[derive(Debug, Clone)]
pub struct PriceConfig {
    pub base_url: String,
}

impl PriceConfig {
    pub(crate) fn resolve(settings: &Settings) -> Result<Self, ConfigError> {
        let base_url = helpers::optional_env("PRICE_API_BASE_URL")?
            .unwrap_or_else(|| settings.price.base_url.clone())
            .trim_end_matches('/')
            .to_string();
        url::Url::parse(&base_url).map_err(|e| ConfigError::InvalidValue {
            key: "PRICE_API_BASE_URL".to_string(),
            message: format!("must be an absolute URL: {e}"),
        })?;
        Ok(Self { base_url })
    }
}

/// Accepts `1043` or `0x413`.
fn parse_chain_id(raw: &str) -> Option<u64> {
    let raw = raw.trim();
    match raw.strip_prefix("0x").or_else(|| raw.strip_prefix("0X")) {
        Some(hex) => u64::from_str_radix(hex, 16).ok(),
        None => raw.parse().ok(),
    }
}

/// Parses `SYM=0x…,SYM=0x…`.
fn parse_supported_tokens(raw: &str, key: &str) -> Result<SupportedTokens, ConfigError> {
    let mut entries = BTreeMap::new();
    for pair in raw.split(',').map(str::trim).filter(|p| !p.is_empty()) {
        let (symbol, address) = pair.split_once('=').ok_or_else(|| ConfigError::InvalidValue {
            key: key.to_string(),
            message: format!("expected SYMBOL=0xADDRESS, got '{pair}'"),
        })?;
        entries.insert(symbol.trim().to_string(), address.trim().to_string());
    }
    tokens_from_settings(&entries).map_err(|e| match e {
        ConfigError::InvalidValue { message, .. } => ConfigError::InvalidValue {
            key: key.to_string(),
            message,
        },
        other => other,
    })
}

fn tokens_from_settings(entries: &BTreeMap<String, String>) -> Result<SupportedTokens, ConfigError> {
    let mut tokens = SupportedTokens::default();
    for (symbol, address) in entries {
        let parsed = Address::from_str(address).map_err(|e| ConfigError::InvalidValue {
            key: "chain.supported_tokens".to_string(),
            message: format!("token {symbol} has invalid address '{address}': {e}"),
        })?;
        tokens.insert(symbol, parsed);
    }
    if tokens.is_empty() {
        return Err(ConfigError::MissingRequired {
            key: "SUPPORTED_TOKENS".to_string(),
            hint: "configure at least one token, e.g. BDAG=0x0000000000000000000000000000000000000000"
                .to_string(),
        });
    }
    Ok(tokens)
}

impl Config {
    /// Load configuration from env vars and the default TOML file.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_settings(&Settings::load())
    }

    /// Build config from settings, applying env var overrides.
    pub fn from_settings(settings: &Settings) -> Result<Self, ConfigError> {
        Ok(Self {
            llm: LlmConfig::resolve(settings)?,
            chain: ChainConfig::resolve(settings)?,
            price: PriceConfig::resolve(settings)?,
            gateway: GatewayConfig::resolve(settings)?,
        })
    }
}
