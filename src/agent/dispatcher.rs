//! Confidence-gated routing of intents to wallet operations.

use std::sync::Arc;

use alloy::primitives::TxHash;
use serde_json::json;

use crate::agent::intent::{Intent, IntentAction};
use crate::error::DispatchError;
use crate::tools::{PriceFeed, format_usd};
use crate::wallet::{WalletBalance, WalletService};

/// Intents below this confidence never reach a wallet operation.
pub const CONFIDENCE_THRESHOLD: f64 = 0.7;

pub const CLARIFICATION_MESSAGE: &str = "I didn't fully understand that. Try:\n- 'What's my balance?'\n- 'Send 0.1 BDAG to Bob'\n- 'Swap BDAG to ETH'";

pub const PRICE_NOT_FOUND: &str = "Price not found";

/// Successful handler result.
#[derive(Debug, Clone, PartialEq)]
pub enum ActionResult {
    Sent(TxHash),
    Balances(Vec<WalletBalance>),
    TokenBalance { token: String, balance: String },
    Price { token: String, value: String },
    /// General prompt; no wallet call was made.
    Conversation,
}

impl ActionResult {
    /// JSON rendering for API callers.
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Self::Sent(hash) => json!(hash.to_string()),
            Self::Balances(balances) => json!(balances),
            Self::TokenBalance { token, balance } => json!({ token.as_str(): balance }),
            Self::Price { token, value } => json!({ token.as_str(): value }),
            Self::Conversation => serde_json::Value::Null,
        }
    }
}

#[derive(Debug)]
pub enum DispatchOutcome {
    /// Confidence below threshold; nothing ran.
    Clarify,
    Executed(ActionResult),
    Failed(DispatchError),
}

pub struct Dispatcher {
    wallet: Arc<WalletService>,
    prices: Arc<dyn PriceFeed>,
}

impl Dispatcher {
    pub fn new(wallet: Arc<WalletService>, prices: Arc<dyn PriceFeed>) -> Self {
        Self { wallet, prices }
    }

    pub async fn dispatch(&self, intent: &Intent) -> DispatchOutcome {
        if intent.confidence < CONFIDENCE_THRESHOLD {
            tracing::debug!(
                action = %intent.action,
                confidence = intent.confidence,
                "Confidence below threshold, asking for clarification"
            );
            return DispatchOutcome::Clarify;
        }

        match self.execute(intent).await {
            Ok(result) => DispatchOutcome::Executed(result),
            Err(e) => {
                tracing::warn!(action = %intent.action, "Intent execution failed: {}", e);
                DispatchOutcome::Failed(e)
            }
        }
    }

    async fn execute(&self, intent: &Intent) -> Result<ActionResult, DispatchError> {
        match intent.action {
            IntentAction::Send => {
                let (Some(token), Some(amount), Some(to)) =
                    (&intent.token, &intent.amount, &intent.to)
                else {
                    return Err(DispatchError::MissingSendParameters);
                };
                let hash = self.wallet.send_token(token, to, amount).await?;
                tracing::info!(%hash, token = %token, amount = %amount, "Token sent");
                Ok(ActionResult::Sent(hash))
            }
            IntentAction::Balance => match &intent.token {
                Some(token) => Ok(ActionResult::TokenBalance {
                    token: token.clone(),
                    balance: self.wallet.get_balance(token).await?,
                }),
                None => Ok(ActionResult::Balances(self.wallet.get_all_balances().await?)),
            },
            IntentAction::Price => {
                let token = intent.token.as_ref().ok_or(DispatchError::MissingToken)?;
                let value = match self.prices.usd_price(token).await? {
                    Some(price) => format_usd(price),
                    None => PRICE_NOT_FOUND.to_string(),
                };
                Ok(ActionResult::Price {
                    token: token.clone(),
                    value,
                })
            }
            IntentAction::Swap => Err(DispatchError::SwapNotImplemented),
            IntentAction::Recover => Err(DispatchError::RecoveryRequiresGuardians),
            IntentAction::GeneralPrompts => Ok(ActionResult::Conversation),
            IntentAction::Unknown => Err(DispatchError::UnknownAction),
        }
    }
}
