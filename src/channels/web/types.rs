//! Request and response bodies for the gateway API.

use alloy::primitives::{Address, TxHash};
use serde::{Deserialize, Serialize};

// --- Health ---

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub channel: &'static str,
}

// --- Errors ---

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
        }
    }
}

// --- Intent / chat ---

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IntentRequest {
    pub user_message: String,
}

#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    pub message: String,
}

// --- Wallet ---

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectResponse {
    pub signer: Address,
    pub smart_wallet: Address,
}

#[derive(Debug, Deserialize)]
pub struct GuardianRequest {
    pub address: String,
}

#[derive(Debug, Serialize)]
pub struct GuardiansResponse {
    pub guardians: Vec<Address>,
    pub count: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InitiateRecoveryRequest {
    pub new_owner: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TxResponse {
    pub tx_hash: TxHash,
}

// --- Price ---

#[derive(Debug, Serialize)]
pub struct PriceResponse {
    pub token: String,
    pub usd: Option<f64>,
    /// `$<price>` or `Price not found`.
    pub display: String,
}
