//! Smart wallet service bound to a single signer.
//!
//! The smart wallet address is resolved lazily through the factory on
//! `connect()`. Until then every contract operation fails with
//! `WalletError::NotInitialized`. Calls are independent: nothing here queues,
//! batches or serializes concurrent transactions against the same wallet.

use std::sync::Arc;

use alloy::primitives::{Address, TxHash, U256};
use serde::Serialize;
use tokio::sync::RwLock;

use crate::config::ChainConfig;
use crate::error::WalletError;
use crate::wallet::address::validate_address_input;
use crate::wallet::chain::{ChainBackend, WalletCall};
use crate::wallet::units::{format_ether, parse_ether};
use crate::wallet::{NetworkParams, SupportedTokens};

/// Balance of one supported token held by the smart wallet.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct WalletBalance {
    pub token: String,
    pub balance: String,
    pub symbol: String,
    /// Dollar value, filled in by callers that hold a price feed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub usd_value: Option<String>,
}

/// Snapshot of the wallet for dashboards.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WalletOverview {
    pub smart_wallet: Address,
    pub owner: Address,
    pub balances: Vec<WalletBalance>,
    pub guardians: Vec<Address>,
    pub recovery_active: bool,
}

pub struct WalletService {
    backend: Arc<dyn ChainBackend>,
    network: NetworkParams,
    factory: Address,
    tokens: SupportedTokens,
    smart_wallet: RwLock<Option<Address>>,
}

impl WalletService {
    pub fn new(backend: Arc<dyn ChainBackend>, config: &ChainConfig) -> Self {
        Self::with_parts(
            backend,
            config.network.clone(),
            config.factory_address,
            config.supported_tokens.clone(),
        )
    }

    pub fn with_parts(
        backend: Arc<dyn ChainBackend>,
        network: NetworkParams,
        factory: Address,
        tokens: SupportedTokens,
    ) -> Self {
        Self {
            backend,
            network,
            factory,
            tokens,
            smart_wallet: RwLock::new(None),
        }
    }

    pub fn supported_tokens(&self) -> &SupportedTokens {
        &self.tokens
    }

    /// Ensure the signer is on the target network and resolve (or create)
    /// the smart wallet. Returns the signer address.
    pub async fn connect(&self) -> Result<Address, WalletError> {
        self.ensure_correct_network().await.inspect_err(|e| {
            tracing::error!("Failed to connect wallet: {}", e);
        })?;
        let signer = self.backend.signer_address().await?;
        self.get_or_create_smart_wallet(signer).await?;
        Ok(signer)
    }

    /// Switch to the target chain, registering it first if the wallet
    /// reports it as unrecognized.
    pub async fn ensure_correct_network(&self) -> Result<(), WalletError> {
        let current = self.backend.chain_id().await?;
        if current == self.network.chain_id {
            return Ok(());
        }

        tracing::info!(
            current,
            target = self.network.chain_id,
            "Switching signer network"
        );
        match self.backend.switch_chain(&self.network).await {
            Ok(()) => Ok(()),
            Err(WalletError::UnrecognizedChain { .. }) => {
                tracing::info!(chain = %self.network.chain_name, "Registering network with wallet");
                self.backend.add_chain(&self.network).await
            }
            Err(e) => Err(e),
        }
    }

    /// Look up the user's smart wallet; create it through the factory if
    /// none exists yet.
    pub async fn get_or_create_smart_wallet(&self, user: Address) -> Result<Address, WalletError> {
        let mut wallet = self.backend.factory_wallet_of(self.factory, user).await?;

        if wallet == Address::ZERO {
            tracing::info!(%user, "No smart wallet found, creating one");
            let tx_hash = self.backend.factory_create_wallet(self.factory).await?;
            wallet = self.backend.factory_wallet_of(self.factory, user).await?;
            if wallet == Address::ZERO {
                return Err(WalletError::ContractCall {
                    call: "createWallet".to_string(),
                    reason: format!("factory returned no wallet after {tx_hash}"),
                });
            }
            tracing::info!(%wallet, %tx_hash, "Smart wallet created");
        } else {
            tracing::info!(%wallet, "Existing smart wallet found");
        }

        *self.smart_wallet.write().await = Some(wallet);
        Ok(wallet)
    }

    pub async fn smart_wallet_address(&self) -> Option<Address> {
        *self.smart_wallet.read().await
    }

    async fn require_wallet(&self) -> Result<Address, WalletError> {
        self.smart_wallet_address()
            .await
            .ok_or(WalletError::NotInitialized)
    }

    /// Send `amount` (decimal string) of `token` (symbol or address) to `to`.
    pub async fn send_token(&self, token: &str, to: &str, amount: &str) -> Result<TxHash, WalletError> {
        let wallet = self.require_wallet().await?;
        let token = self.tokens.resolve_token(token)?;
        let to = to
            .trim()
            .parse::<Address>()
            .map_err(|e| WalletError::InvalidAddress {
                input: to.to_string(),
                reason: e.to_string(),
            })?;
        let amount = parse_ether(amount)?;

        self.backend
            .submit(wallet, WalletCall::SendToken { token, to, amount })
            .await
    }

    async fn balance_units(&self, token: &str) -> Result<U256, WalletError> {
        let wallet = self.require_wallet().await?;
        let token = self.tokens.resolve_token(token)?;
        self.backend.token_balance(wallet, token).await
    }

    /// Balance of `token` as a decimal string.
    pub async fn get_balance(&self, token: &str) -> Result<String, WalletError> {
        Ok(format_ether(self.balance_units(token).await?))
    }

    /// Non-zero balances of every supported token. Tokens whose lookup fails
    /// are skipped.
    pub async fn get_all_balances(&self) -> Result<Vec<WalletBalance>, WalletError> {
        self.require_wallet().await?;

        let mut balances = Vec::new();
        for symbol in self.tokens.symbols() {
            match self.balance_units(symbol).await {
                Ok(units) if units.is_zero() => {}
                Ok(units) => balances.push(WalletBalance {
                    token: symbol.to_string(),
                    balance: format_ether(units),
                    symbol: symbol.to_string(),
                    usd_value: None,
                }),
                Err(e) => tracing::warn!("Skipping {}: {}", symbol, e),
            }
        }
        Ok(balances)
    }

    pub async fn add_guardian(&self, guardian: &str) -> Result<TxHash, WalletError> {
        let wallet = self.require_wallet().await?;
        let guardian = validate_address_input(guardian)?;
        self.backend
            .submit(wallet, WalletCall::AddGuardian(guardian))
            .await
    }

    pub async fn remove_guardian(&self, guardian: &str) -> Result<TxHash, WalletError> {
        let wallet = self.require_wallet().await?;
        let guardian = validate_address_input(guardian)?;
        self.backend
            .submit(wallet, WalletCall::RemoveGuardian(guardian))
            .await
    }

    pub async fn guardians(&self) -> Result<Vec<Address>, WalletError> {
        let wallet = self.require_wallet().await?;
        self.backend.guardians(wallet).await
    }

    pub async fn guardian_count(&self) -> Result<U256, WalletError> {
        let wallet = self.require_wallet().await?;
        self.backend.guardian_count(wallet).await
    }

    pub async fn is_guardian(&self, account: &str) -> Result<bool, WalletError> {
        let wallet = self.require_wallet().await?;
        let account = validate_address_input(account)?;
        self.backend.is_guardian(wallet, account).await
    }

    pub async fn owner(&self) -> Result<Address, WalletError> {
        let wallet = self.require_wallet().await?;
        self.backend.owner(wallet).await
    }

    pub async fn recovery_active(&self) -> Result<bool, WalletError> {
        let wallet = self.require_wallet().await?;
        self.backend.recovery_active(wallet).await
    }

    pub async fn initiate_recovery(&self, new_owner: &str) -> Result<TxHash, WalletError> {
        let wallet = self.require_wallet().await?;
        let new_owner = validate_address_input(new_owner)?;
        self.backend
            .submit(wallet, WalletCall::InitiateRecovery(new_owner))
            .await
    }

    pub async fn confirm_recovery(&self) -> Result<TxHash, WalletError> {
        let wallet = self.require_wallet().await?;
        self.backend.submit(wallet, WalletCall::ConfirmRecovery).await
    }

    pub async fn execute_recovery(&self) -> Result<TxHash, WalletError> {
        let wallet = self.require_wallet().await?;
        self.backend.submit(wallet, WalletCall::ExecuteRecovery).await
    }

    pub async fn cancel_recovery(&self) -> Result<TxHash, WalletError> {
        let wallet = self.require_wallet().await?;
        self.backend.submit(wallet, WalletCall::CancelRecovery).await
    }

    /// Address, owner, balances, guardians and recovery flag in one read.
    pub async fn overview(&self) -> Result<WalletOverview, WalletError> {
        let smart_wallet = self.require_wallet().await?;
        Ok(WalletOverview {
            smart_wallet,
            owner: self.owner().await?,
            balances: self.get_all_balances().await?,
            guardians: self.guardians().await?,
            recovery_active: self.recovery_active().await?,
        })
    }
}
