//! Error types for the smart wallet agent.

use std::time::Duration;

/// Top-level error type for the agent.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Channel error: {0}")]
    Channel(#[from] ChannelError),

    #[error("LLM error: {0}")]
    Llm(#[from] LlmError),

    #[error("Wallet error: {0}")]
    Wallet(#[from] WalletError),

    #[error("Price feed error: {0}")]
    Price(#[from] PriceError),

    #[error("Dispatch error: {0}")]
    Dispatch(#[from] DispatchError),
}

/// Configuration-related errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required configuration: {key}. {hint}")]
    MissingRequired { key: String, hint: String },

    #[error("Invalid configuration value for {key}: {message}")]
    InvalidValue { key: String, message: String },

    #[error("Failed to parse configuration: {0}")]
    ParseError(String),
}

/// Channel-related errors (gateway and REPL).
#[derive(Debug, thiserror::Error)]
pub enum ChannelError {
    #[error("Channel {name} failed to start: {reason}")]
    StartupFailed { name: String, reason: String },
}

/// LLM provider errors.
#[derive(Debug, thiserror::Error)]
pub enum LlmError {
    #[error("Provider {provider} request failed: {reason}")]
    RequestFailed { provider: String, reason: String },

    #[error("Provider {provider} rate limited, retry after {retry_after:?}")]
    RateLimited {
        provider: String,
        retry_after: Option<Duration>,
    },

    #[error("Invalid response from {provider}: {reason}")]
    InvalidResponse { provider: String, reason: String },

    #[error("Authentication failed for provider {provider}")]
    AuthFailed { provider: String },

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

/// Smart wallet and chain errors.
#[derive(Debug, thiserror::Error)]
pub enum WalletError {
    #[error("Smart wallet not initialized; call connect first")]
    NotInitialized,

    #[error("Signer not configured: {0}")]
    SignerUnavailable(String),

    #[error("Invalid address '{input}': {reason}")]
    InvalidAddress { input: String, reason: String },

    #[error("Invalid amount '{input}': {reason}")]
    InvalidAmount { input: String, reason: String },

    #[error("Unknown token '{0}'")]
    UnknownToken(String),

    #[error("Wallet rejected switch to chain {chain_id}: unrecognized chain")]
    UnrecognizedChain { chain_id: u64 },

    #[error("RPC request {method} failed (code {code:?}): {reason}")]
    Rpc {
        method: String,
        code: Option<i64>,
        reason: String,
    },

    #[error("Contract call {call} failed: {reason}")]
    ContractCall { call: String, reason: String },

    #[error("Transaction {tx_hash} was not confirmed: {reason}")]
    Confirmation { tx_hash: String, reason: String },
}

impl WalletError {
    pub(crate) fn contract(call: &str, reason: impl std::fmt::Display) -> Self {
        Self::ContractCall {
            call: call.to_string(),
            reason: reason.to_string(),
        }
    }
}

/// Token price lookup errors.
#[derive(Debug, thiserror::Error)]
pub enum PriceError {
    #[error("Price endpoint rejected: {0}")]
    EndpointRejected(String),

    #[error("Price request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("Price API returned status {status}")]
    Status { status: u16 },
}

/// Intent execution failures surfaced to the caller as a failed action.
#[derive(Debug, thiserror::Error)]
pub enum DispatchError {
    #[error("Missing required parameters for send")]
    MissingSendParameters,

    #[error("No token specified")]
    MissingToken,

    #[error("Swap is not implemented")]
    SwapNotImplemented,

    #[error("Recovery requires guardian setup")]
    RecoveryRequiresGuardians,

    #[error("Unknown action")]
    UnknownAction,

    #[error(transparent)]
    Wallet(#[from] WalletError),

    #[error(transparent)]
    Price(#[from] PriceError),
}

/// Result type alias for the agent.
pub type Result<T> = std::result::Result<T, Error>;
