//! Chain access seam: the signer, the factory and the smart wallet contract.
//!
//! `WalletService` talks only to `ChainBackend`. The production backend uses an
//! alloy HTTP provider with a local private-key signer.

use std::marker::PhantomData;
use std::sync::Arc;

use alloy::network::{Ethereum, EthereumWallet, ReceiptResponse};
use alloy::primitives::{Address, TxHash, U256};
use alloy::providers::{PendingTransactionBuilder, Provider, ProviderBuilder};
use alloy::signers::local::PrivateKeySigner;
use alloy::transports::http::{Client, Http};
use alloy::transports::{RpcError, Transport, TransportErrorKind};
use async_trait::async_trait;
use secrecy::ExposeSecret;

use crate::config::ChainConfig;
use crate::error::WalletError;
use crate::wallet::NetworkParams;
use crate::wallet::abi::{SmartWallet, WalletFactory};

/// EIP-3326 error code for a chain the wallet does not know.
pub const UNRECOGNIZED_CHAIN_CODE: i64 = 4902;

/// A state-changing call against the smart wallet contract.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WalletCall {
    SendToken {
        token: Address,
        to: Address,
        amount: U256,
    },
    AddGuardian(Address),
    RemoveGuardian(Address),
    InitiateRecovery(Address),
    ConfirmRecovery,
    ExecuteRecovery,
    CancelRecovery,
}

impl WalletCall {
    pub fn function_name(&self) -> &'static str {
        match self {
            Self::SendToken { .. } => "sendToken",
            Self::AddGuardian(_) => "addGuardian",
            Self::RemoveGuardian(_) => "removeGuardian",
            Self::InitiateRecovery(_) => "initiateRecovery",
            Self::ConfirmRecovery => "confirmRecovery",
            Self::ExecuteRecovery => "executeRecovery",
            Self::CancelRecovery => "cancelRecovery",
        }
    }
}

/// Signer, network and contract operations the wallet service depends on.
#[async_trait]
pub trait ChainBackend: Send + Sync {
    /// Address of the externally-owned account that signs transactions.
    async fn signer_address(&self) -> Result<Address, WalletError>;

    async fn chain_id(&self) -> Result<u64, WalletError>;

    /// `wallet_switchEthereumChain`. Returns `WalletError::UnrecognizedChain`
    /// when the wallet answers with code 4902.
    async fn switch_chain(&self, network: &NetworkParams) -> Result<(), WalletError>;

    /// `wallet_addEthereumChain`.
    async fn add_chain(&self, network: &NetworkParams) -> Result<(), WalletError>;

    /// `WalletFactory.getWallet(user)`; zero address when none exists.
    async fn factory_wallet_of(&self, factory: Address, user: Address)
    -> Result<Address, WalletError>;

    /// `WalletFactory.createWallet()`, awaited until confirmed.
    async fn factory_create_wallet(&self, factory: Address) -> Result<TxHash, WalletError>;

    /// Submit a state-changing smart wallet call and await confirmation.
    async fn submit(&self, wallet: Address, call: WalletCall) -> Result<TxHash, WalletError>;

    async fn token_balance(&self, wallet: Address, token: Address) -> Result<U256, WalletError>;

    async fn guardians(&self, wallet: Address) -> Result<Vec<Address>, WalletError>;

    async fn guardian_count(&self, wallet: Address) -> Result<U256, WalletError>;

    async fn is_guardian(&self, wallet: Address, account: Address) -> Result<bool, WalletError>;

    async fn owner(&self, wallet: Address) -> Result<Address, WalletError>;

    async fn recovery_active(&self, wallet: Address) -> Result<bool, WalletError>;
}

/// Build the production backend from chain config.
pub fn connect_http(config: &ChainConfig) -> Result<Arc<dyn ChainBackend>, WalletError> {
    let key = config.signer_key.as_ref().ok_or_else(|| {
        WalletError::SignerUnavailable("WALLET_PRIVATE_KEY is not set".to_string())
    })?;
    let signer: PrivateKeySigner = key
        .expose_secret()
        .trim()
        .parse()
        .map_err(|e| WalletError::SignerUnavailable(format!("invalid private key: {e}")))?;
    let signer_address = signer.address();

    let url = config.rpc_url.parse().map_err(|e| WalletError::Rpc {
        method: "connect".to_string(),
        code: None,
        reason: format!("invalid RPC URL '{}': {e}", config.rpc_url),
    })?;

    let provider = ProviderBuilder::new()
        .with_recommended_fillers()
        .wallet(EthereumWallet::from(signer))
        .on_http(url);

    tracing::debug!(
        rpc_url = %config.rpc_url,
        signer = %signer_address,
        "Connected chain backend"
    );

    Ok(Arc::new(AlloyChain::<_, Http<Client>>::new(
        provider,
        signer_address,
        config.confirmations,
    )))
}

/// `ChainBackend` over an alloy provider.
pub struct AlloyChain<P, T> {
    provider: P,
    signer: Address,
    confirmations: u64,
    _transport: PhantomData<fn() -> T>,
}

impl<P, T> AlloyChain<P, T>
where
    P: Provider<T, Ethereum> + Clone + Send + Sync + 'static,
    T: Transport + Clone,
{
    pub fn new(provider: P, signer: Address, confirmations: u64) -> Self {
        Self {
            provider,
            signer,
            confirmations,
            _transport: PhantomData,
        }
    }

    async fn await_confirmation(
        &self,
        call: &str,
        pending: PendingTransactionBuilder<T, Ethereum>,
    ) -> Result<TxHash, WalletError> {
        let tx_hash = *pending.tx_hash();
        tracing::info!(call, %tx_hash, "Transaction broadcast");

        if self.confirmations == 0 {
            return Ok(tx_hash);
        }

        let receipt = pending
            .with_required_confirmations(self.confirmations)
            .get_receipt()
            .await
            .map_err(|e| WalletError::Confirmation {
                tx_hash: tx_hash.to_string(),
                reason: e.to_string(),
            })?;
        if !receipt.status() {
            return Err(WalletError::Confirmation {
                tx_hash: tx_hash.to_string(),
                reason: format!("{call} reverted"),
            });
        }
        tracing::info!(call, %tx_hash, "Transaction confirmed");
        Ok(tx_hash)
    }
}

fn rpc_error(method: &str, err: RpcError<TransportErrorKind>) -> WalletError {
    let code = err.as_error_resp().map(|payload| payload.code);
    WalletError::Rpc {
        method: method.to_string(),
        code,
        reason: err.to_string(),
    }
}

#[async_trait]
impl<P, T> ChainBackend for AlloyChain<P, T>
where
    P: Provider<T, Ethereum> + Clone + Send + Sync + 'static,
    T: Transport + Clone,
{
    async fn signer_address(&self) -> Result<Address, WalletError> {
        Ok(self.signer)
    }

    async fn chain_id(&self) -> Result<u64, WalletError> {
        self.provider
            .get_chain_id()
            .await
            .map_err(|e| rpc_error("eth_chainId", e))
    }

    async fn switch_chain(&self, network: &NetworkParams) -> Result<(), WalletError> {
        let result = self
            .provider
            .raw_request::<_, serde_json::Value>(
                "wallet_switchEthereumChain".into(),
                vec![network.switch_chain_params()],
            )
            .await;
        match result {
            Ok(_) => Ok(()),
            Err(e) => match rpc_error("wallet_switchEthereumChain", e) {
                WalletError::Rpc {
                    code: Some(UNRECOGNIZED_CHAIN_CODE),
                    ..
                } => Err(WalletError::UnrecognizedChain {
                    chain_id: network.chain_id,
                }),
                other => Err(other),
            },
        }
    }

    async fn add_chain(&self, network: &NetworkParams) -> Result<(), WalletError> {
        self.provider
            .raw_request::<_, serde_json::Value>(
                "wallet_addEthereumChain".into(),
                vec![network.add_chain_params()],
            )
            .await
            .map(|_| ())
            .map_err(|e| rpc_error("wallet_addEthereumChain", e))
    }

    async fn factory_wallet_of(
        &self,
        factory: Address,
        user: Address,
    ) -> Result<Address, WalletError> {
        let contract = WalletFactory::new(factory, self.provider.clone());
        let result = contract
            .getWallet(user)
            .call()
            .await
            .map_err(|e| WalletError::contract("getWallet", e))?;
        Ok(result._0)
    }

    async fn factory_create_wallet(&self, factory: Address) -> Result<TxHash, WalletError> {
        let contract = WalletFactory::new(factory, self.provider.clone());
        let pending = contract
            .createWallet()
            .send()
            .await
            .map_err(|e| WalletError::contract("createWallet", e))?;
        self.await_confirmation("createWallet", pending).await
    }

    async fn submit(&self, wallet: Address, call: WalletCall) -> Result<TxHash, WalletError> {
        let contract = SmartWallet::new(wallet, self.provider.clone());
        let name = call.function_name();
        let sent = match call {
            WalletCall::SendToken { token, to, amount } => {
                contract.sendToken(token, to, amount).send().await
            }
            WalletCall::AddGuardian(guardian) => contract.addGuardian(guardian).send().await,
            WalletCall::RemoveGuardian(guardian) => {
                contract.removeGuardian(guardian).send().await
            }
            WalletCall::InitiateRecovery(new_owner) => {
                contract.initiateRecovery(new_owner).send().await
            }
            WalletCall::ConfirmRecovery => contract.confirmRecovery().send().await,
            WalletCall::ExecuteRecovery => contract.executeRecovery().send().await,
            WalletCall::CancelRecovery => contract.cancelRecovery().send().await,
        };
        let pending = sent.map_err(|e| WalletError::contract(name, e))?;
        self.await_confirmation(name, pending).await
    }

    async fn token_balance(&self, wallet: Address, token: Address) -> Result<U256, WalletError> {
        let contract = SmartWallet::new(wallet, self.provider.clone());
        let result = contract
            .getTokenBalance(token)
            .call()
            .await
            .map_err(|e| WalletError::contract("getTokenBalance", e))?;
        Ok(result._0)
    }

    async fn guardians(&self, wallet: Address) -> Result<Vec<Address>, WalletError> {
        let contract = SmartWallet::new(wallet, self.provider.clone());
        let result = contract
            .getGuardians()
            .call()
            .await
            .map_err(|e| WalletError::contract("getGuardians", e))?;
        Ok(result._0)
    }

    async fn guardian_count(&self, wallet: Address) -> Result<U256, WalletError> {
        let contract = SmartWallet::new(wallet, self.provider.clone());
        let result = contract
            .getGuardianCount()
            .call()
            .await
            .map_err(|e| WalletError::contract("getGuardianCount", e))?;
        Ok(result._0)
    }

    async fn is_guardian(&self, wallet: Address, account: Address) -> Result<bool, WalletError> {
        let contract = SmartWallet::new(wallet, self.provider.clone());
        let result = contract
            .guardians(account)
            .call()
            .await
            .map_err(|e| WalletError::contract("guardians", e))?;
        Ok(result._0)
    }

    async fn owner(&self, wallet: Address) -> Result<Address, WalletError> {
        let contract = SmartWallet::new(wallet, self.provider.clone());
        let result = contract
            .owner()
            .call()
            .await
            .map_err(|e| WalletError::contract("owner", e))?;
        Ok(result._0)
    }

    async fn recovery_active(&self, wallet: Address) -> Result<bool, WalletError> {
        let contract = SmartWallet::new(wallet, self.provider.clone());
        let result = contract
            .recoveryActive()
            .call()
            .await
            .map_err(|e| WalletError::contract("recoveryActive", e))?;
        Ok(result._0)
    }
}
