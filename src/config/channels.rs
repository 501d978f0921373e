use secrecy::SecretString;

use crate::config::helpers::{optional_env, parse_optional_env};
use crate::error::ConfigError;
use crate::settings::Settings;

/// HTTP gateway configuration.
#[derive(Debug, Clone)]
pub struct GatewayConfig {
    pub host: String,
    pub port: u16,
    /// Bearer token for wallet and chat routes. Random hex generated at startup if unset.
    pub auth_token: Option<SecretString>,
    /// Chat requests allowed per 60 second window.
    pub chat_rate_limit: u64,
}

impl GatewayConfig {
    pub(crate) fn resolve(settings: &Settings) -> Result<Self, ConfigError> {
        let port = parse_optional_env::<u16>("GATEWAY_PORT", "a valid port number")?
            .unwrap_or(settings.gateway.port);

        let chat_rate_limit =
            parse_optional_env::<u64>("GATEWAY_CHAT_RATE_LIMIT", "a positive integer")?
                .unwrap_or(settings.gateway.chat_rate_limit);
        if chat_rate_limit == 0 {
            return Err(ConfigError::InvalidValue {
                key: "GATEWAY_CHAT_RATE_LIMIT".to_string(),
                message: "must be > 0".to_string(),
            });
        }

        Ok(Self {
            host: optional_env("GATEWAY_HOST")?.unwrap_or_else(|| settings.gateway.host.clone()),
            port,
            auth_token: optional_env("GATEWAY_AUTH_TOKEN")?.map(SecretString::from),
            chat_rate_limit,
        })
    }
}
