//! User settings persistence.
//!
//! Stores operator preferences in `~/.smartwallet/config.toml`.
//! Settings are loaded with env var > config.toml > default priority.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Operator settings persisted to disk.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Settings {
    /// Language-model endpoint used for intent parsing.
    #[serde(default)]
    pub llm: LlmSettings,

    /// Chain, signer and contract addresses.
    #[serde(default)]
    pub chain: ChainSettings,

    /// Token price lookup.
    #[serde(default)]
    pub price: PriceSettings,

    /// HTTP gateway.
    #[serde(default)]
    pub gateway: GatewaySettings,
}

/// OpenAI-compatible completion endpoint settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmSettings {
    #[serde(default = "default_llm_base_url")]
    pub base_url: String,

    #[serde(default = "default_llm_model")]
    pub model: String,

    /// Sent as the `X-Title` header (OpenRouter app attribution).
    #[serde(default = "default_llm_app_title")]
    pub app_title: String,

    /// Request timeout. Unset means the HTTP client default (no timeout).
    #[serde(default)]
    pub timeout_secs: Option<u64>,
}

fn default_llm_base_url() -> String {
    "https://openrouter.ai/api/v1".to_string()
}

fn default_llm_model() -> String {
    "deepseek/deepseek-r1-0528:free".to_string()
}

fn default_llm_app_title() -> String {
    "SmartWallet AI".to_string()
}

impl Default for LlmSettings {
    fn default() -> Self {
        Self {
            base_url: default_llm_base_url(),
            model: default_llm_model(),
            app_title: default_llm_app_title(),
            timeout_secs: None,
        }
    }
}

/// Chain settings. Defaults target the BlockDAG Primordial testnet.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChainSettings {
    #[serde(default = "default_chain_rpc_url")]
    pub rpc_url: String,

    #[serde(default = "default_chain_id")]
    pub chain_id: u64,

    #[serde(default = "default_chain_name")]
    pub chain_name: String,

    #[serde(default = "default_currency_name")]
    pub currency_name: String,

    #[serde(default = "default_currency_symbol")]
    pub currency_symbol: String,

    #[serde(default = "default_explorer_url")]
    pub explorer_url: String,

    #[serde(default = "default_factory_address")]
    pub factory_address: String,

    /// Symbol -> token address. The zero address is the native currency.
    #[serde(default = "default_supported_tokens")]
    pub supported_tokens: BTreeMap<String, String>,

    /// Block confirmations awaited after each state-changing call.
    #[serde(default = "default_confirmations")]
    pub confirmations: u64,
}

fn default_chain_rpc_url() -> String {
    "https://rpc.primordial.bdagscan.com".to_string()
}

fn default_chain_id() -> u64 {
    0x413
}

fn default_chain_name() -> String {
    "BlockDAG Primordial Testnet".to_string()
}

fn default_currency_name() -> String {
    "BlockDAG".to_string()
}

fn default_currency_symbol() -> String {
    "BDAG".to_string()
}

fn default_explorer_url() -> String {
    "https://primordial.bdagscan.com".to_string()
}

fn default_factory_address() -> String {
    "0xF030E94be8B2fCDF2317928CACaF8979F3DEc524".to_string()
}

fn default_supported_tokens() -> BTreeMap<String, String> {
    BTreeMap::from([(
        "BDAG".to_string(),
        "0x0000000000000000000000000000000000000000".to_string(),
    )])
}

fn default_confirmations() -> u64 {
    1
}

impl Default for ChainSettings {
    fn default() -> Self {
        Self {
            rpc_url: default_chain_rpc_url(),
            chain_id: default_chain_id(),
            chain_name: default_chain_name(),
            currency_name: default_currency_name(),
            currency_symbol: default_currency_symbol(),
            explorer_url: default_explorer_url(),
            factory_address: default_factory_address(),
            supported_tokens: default_supported_tokens(),
            confirmations: default_confirmations(),
        }
    }
}

/// Token price API settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PriceSettings {
    #[serde(default = "default_price_base_url")]
    pub base_url: String,
}

fn default_price_base_url() -> String {
    "https://api.coingecko.com/api/v3".to_string()
}

impl Default for PriceSettings {
    fn default() -> Self {
        Self {
            base_url: default_price_base_url(),
        }
    }
}

/// HTTP gateway settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewaySettings {
    #[serde(default = "default_gateway_host")]
    pub host: String,

    #[serde(default = "default_gateway_port")]
    pub port: u16,

    /// Chat requests allowed per window.
    #[serde(default = "default_chat_rate_limit")]
    pub chat_rate_limit: u64,
}

fn default_gateway_host() -> String {
    "127.0.0.1".to_string()
}

fn default_gateway_port() -> u16 {
    3000
}

fn default_chat_rate_limit() -> u64 {
    30
}

impl Default for GatewaySettings {
    fn default() -> Self {
        Self {
            host: default_gateway_host(),
            port: default_gateway_port(),
            chat_rate_limit: default_chat_rate_limit(),
        }
    }
}

impl Settings {
    /// Default config file path (~/.smartwallet/config.toml).
    pub fn default_toml_path() -> PathBuf {
        crate::bootstrap::smartwallet_home().join("config.toml")
    }

    /// Load settings from the default path, falling back to defaults.
    pub fn load() -> Self {
        match Self::load_toml(&Self::default_toml_path()) {
            Ok(Some(settings)) => settings,
            Ok(None) => Self::default(),
            Err(e) => {
                tracing::warn!("Ignoring unreadable config file: {}", e);
                Self::default()
            }
        }
    }

    /// Load settings from a TOML file.
    ///
    /// Returns `None` if the file doesn't exist. Returns an error only
    /// if the file exists but can't be parsed.
    pub fn load_toml(path: &Path) -> Result<Option<Self>, String> {
        let data = match std::fs::read_to_string(path) {
            Ok(d) => d,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(format!("failed to read {}: {}", path.display(), e)),
        };

        let settings: Self = toml::from_str(&data)
            .map_err(|e| format!("invalid TOML in {}: {}", path.display(), e))?;
        Ok(Some(settings))
    }

    /// Write a commented TOML config file with current settings.
    pub fn save_toml(&self, path: &Path) -> Result<(), String> {
        let raw = toml::to_string_pretty(self)
            .map_err(|e| format!("failed to serialize settings: {}", e))?;

        let content = format!(
            "# SmartWallet agent configuration file.\n\
             #\n\
             # Priority: env var > this file > defaults.\n\
             # Secrets (API keys, private keys) belong in ~/.smartwallet/.env, not here.\n\
             \n\
             {raw}"
        );

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| format!("failed to create {}: {}", parent.display(), e))?;
        }
        std::fs::write(path, content)
            .map_err(|e| format!("failed to write {}: {}", path.display(), e))
    }
}
