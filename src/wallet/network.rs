//! Target network description used for wallet network switching.

use serde::Serialize;

/// Native currency of a chain as expected by `wallet_addEthereumChain`.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct NativeCurrency {
    pub name: String,
    pub symbol: String,
    pub decimals: u8,
}

/// Chain parameters the signer must be on before any contract call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NetworkParams {
    pub chain_id: u64,
    pub chain_name: String,
    pub native_currency: NativeCurrency,
    pub rpc_urls: Vec<String>,
    pub block_explorer_urls: Vec<String>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct AddChainParams<'a> {
    chain_id: String,
    chain_name: &'a str,
    native_currency: &'a NativeCurrency,
    rpc_urls: &'a [String],
    block_explorer_urls: &'a [String],
}

impl NetworkParams {
    /// Chain id in the `0x`-prefixed lowercase hex form wallet RPCs use.
    pub fn chain_id_hex(&self) -> String {
        format!("{:#x}", self.chain_id)
    }

    /// Params object for `wallet_switchEthereumChain`.
    pub fn switch_chain_params(&self) -> serde_json::Value {
        serde_json::json!({ "chainId": self.chain_id_hex() })
    }

    /// Params object for `wallet_addEthereumChain`.
    pub fn add_chain_params(&self) -> serde_json::Value {
        serde_json::to_value(AddChainParams {
            chain_id: self.chain_id_hex(),
            chain_name: &self.chain_name,
            native_currency: &self.native_currency,
            rpc_urls: &self.rpc_urls,
            block_explorer_urls: &self.block_explorer_urls,
        })
        .unwrap_or_else(|_| self.switch_chain_params())
    }
}
