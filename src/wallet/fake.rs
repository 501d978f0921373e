//! In-memory `ChainBackend` for unit tests.

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

use alloy::primitives::{Address, TxHash, U256, address};
use async_trait::async_trait;

use crate::error::WalletError;
use crate::wallet::chain::{ChainBackend, WalletCall};
use crate::wallet::{NativeCurrency, NetworkParams, SupportedTokens};

pub const USER: Address = address!("f39Fd6e51aad88F6F4ce6aB8827279cffFb92266");
pub const WALLET: Address = address!("5FbDB2315678afecb367f032d93F642f64180aa3");
pub const GUARDIAN: Address = address!("70997970C51812dc3A010C7d01b50e0d17dc79C8");

pub fn blockdag_network() -> NetworkParams {
    NetworkParams {
        chain_id: 0x413,
        chain_name: "BlockDAG Primordial Testnet".to_string(),
        native_currency: NativeCurrency {
            name: "BlockDAG".to_string(),
            symbol: "BDAG".to_string(),
            decimals: 18,
        },
        rpc_urls: vec!["http://127.0.0.1:8545".to_string()],
        block_explorer_urls: vec![],
    }
}

/// BDAG at the zero address, USDC at 0x22.., ETH at 0x33...
pub fn tokens() -> SupportedTokens {
    [
        ("BDAG".to_string(), Address::ZERO),
        ("USDC".to_string(), Address::repeat_byte(0x22)),
        ("ETH".to_string(), Address::repeat_byte(0x33)),
    ]
    .into_iter()
    .collect()
}

#[derive(Default)]
struct State {
    chain_id: u64,
    target_known: bool,
    switch_rejected: bool,
    wallet: Option<Address>,
    created: usize,
    network_requests: Vec<&'static str>,
    submitted: Vec<WalletCall>,
    balances: HashMap<Address, U256>,
    failing_balances: HashSet<Address>,
    guardians: Vec<Address>,
    recovery_active: bool,
}

pub struct FakeChain {
    state: Mutex<State>,
}

impl Default for FakeChain {
    fn default() -> Self {
        Self {
            state: Mutex::new(State {
                chain_id: 0x413,
                target_known: true,
                ..State::default()
            }),
        }
    }
}

impl FakeChain {
    pub fn with_existing_wallet() -> Self {
        let chain = Self::default();
        chain.state.lock().unwrap().wallet = Some(WALLET);
        chain
    }

    pub fn on_chain(self, chain_id: u64) -> Self {
        self.state.lock().unwrap().chain_id = chain_id;
        self
    }

    pub fn unknown_target_chain(self) -> Self {
        self.state.lock().unwrap().target_known = false;
        self
    }

    /// Switch requests fail with a generic RPC error instead of 4902.
    pub fn rejecting_switch(self) -> Self {
        self.state.lock().unwrap().switch_rejected = true;
        self
    }

    pub fn set_balance(&self, token: Address, units: U256) {
        self.state.lock().unwrap().balances.insert(token, units);
    }

    pub fn fail_balance(&self, token: Address) {
        self.state.lock().unwrap().failing_balances.insert(token);
    }

    pub fn submitted(&self) -> Vec<WalletCall> {
        self.state.lock().unwrap().submitted.clone()
    }

    pub fn created_wallets(&self) -> usize {
        self.state.lock().unwrap().created
    }

    pub fn network_requests(&self) -> Vec<&'static str> {
        self.state.lock().unwrap().network_requests.clone()
    }

    fn next_hash(state: &State) -> TxHash {
        TxHash::with_last_byte((state.submitted.len() + state.created) as u8)
    }
}

#[async_trait]
impl ChainBackend for FakeChain {
    async fn signer_address(&self) -> Result<Address, WalletError> {
        Ok(USER)
    }

    async fn chain_id(&self) -> Result<u64, WalletError> {
        Ok(self.state.lock().unwrap().chain_id)
    }

    async fn switch_chain(&self, network: &NetworkParams) -> Result<(), WalletError> {
        let mut state = self.state.lock().unwrap();
        state.network_requests.push("switch");
        if state.switch_rejected {
            return Err(WalletError::Rpc {
                method: "wallet_switchEthereumChain".to_string(),
                code: Some(4001),
                reason: "User rejected the request.".to_string(),
            });
        }
        if !state.target_known {
            return Err(WalletError::UnrecognizedChain {
                chain_id: network.chain_id,
            });
        }
        state.chain_id = network.chain_id;
        Ok(())
    }

    async fn add_chain(&self, network: &NetworkParams) -> Result<(), WalletError> {
        let mut state = self.state.lock().unwrap();
        state.network_requests.push("add");
        state.target_known = true;
        state.chain_id = network.chain_id;
        Ok(())
    }

    async fn factory_wallet_of(&self, _factory: Address, _user: Address) -> Result<Address, WalletError> {
        Ok(self.state.lock().unwrap().wallet.unwrap_or(Address::ZERO))
    }

    async fn factory_create_wallet(&self, _factory: Address) -> Result<TxHash, WalletError> {
        let mut state = self.state.lock().unwrap();
        state.created += 1;
        state.wallet = Some(WALLET);
        Ok(Self::next_hash(&state))
    }

    async fn submit(&self, _wallet: Address, call: WalletCall) -> Result<TxHash, WalletError> {
        let mut state = self.state.lock().unwrap();
        match &call {
            WalletCall::AddGuardian(guardian) => state.guardians.push(*guardian),
            WalletCall::RemoveGuardian(guardian) => state.guardians.retain(|g| g != guardian),
            WalletCall::InitiateRecovery(_) => state.recovery_active = true,
            WalletCall::CancelRecovery | WalletCall::ExecuteRecovery => {
                state.recovery_active = false
            }
            WalletCall::SendToken { .. } | WalletCall::ConfirmRecovery => {}
        }
        state.submitted.push(call);
        Ok(Self::next_hash(&state))
    }

    async fn token_balance(&self, _wallet: Address, token: Address) -> Result<U256, WalletError> {
        let state = self.state.lock().unwrap();
        if state.failing_balances.contains(&token) {
            return Err(WalletError::contract("getTokenBalance", "execution reverted"));
        }
        Ok(state.balances.get(&token).copied().unwrap_or(U256::ZERO))
    }

    async fn guardians(&self, _wallet: Address) -> Result<Vec<Address>, WalletError> {
        Ok(self.state.lock().unwrap().guardians.clone())
    }

    async fn guardian_count(&self, _wallet: Address) -> Result<U256, WalletError> {
        Ok(U256::from(self.state.lock().unwrap().guardians.len()))
    }

    async fn is_guardian(&self, _wallet: Address, account: Address) -> Result<bool, WalletError> {
        Ok(self.state.lock().unwrap().guardians.contains(&account))
    }

    async fn owner(&self, _wallet: Address) -> Result<Address, WalletError> {
        Ok(USER)
    }

    async fn recovery_active(&self, _wallet: Address) -> Result<bool, WalletError> {
        Ok(self.state.lock().unwrap().recovery_active)
    }
}
