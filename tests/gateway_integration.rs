//! End-to-end tests for the HTTP gateway.
//!
//! These tests start a real Axum server on a random port backed by in-memory
//! chain, completion and price fakes, and drive it with reqwest:
//! - Health and public intent/price routes
//! - Bearer auth on chat and wallet routes
//! - Confidence gating (no transaction below threshold)
//! - Wallet connect, guardian validation, balance replies and USD values

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};

use alloy::primitives::{Address, TxHash, U256, address};
use async_trait::async_trait;
use serde_json::{Value, json};

use smartwallet_agent::agent::{Agent, CLARIFICATION_MESSAGE, Dispatcher, IntentParser};
use smartwallet_agent::channels::web::{GatewayState, start_server};
use smartwallet_agent::error::{LlmError, PriceError, WalletError};
use smartwallet_agent::llm::IntentCompletion;
use smartwallet_agent::tools::PriceFeed;
use smartwallet_agent::wallet::{
    ChainBackend, NativeCurrency, NetworkParams, SupportedTokens, WalletCall, WalletService,
};

const AUTH_TOKEN: &str = "test-token-12345";
const SIGNER: Address = address!("f39Fd6e51aad88F6F4ce6aB8827279cffFb92266");
const WALLET: Address = address!("5FbDB2315678afecb367f032d93F642f64180aa3");

// --- Fakes ---

#[derive(Default)]
struct RecordingChain {
    submitted: Mutex<Vec<WalletCall>>,
}

impl RecordingChain {
    fn submitted(&self) -> Vec<WalletCall> {
        self.submitted.lock().unwrap().clone()
    }
}

#[async_trait]
impl ChainBackend for RecordingChain {
    async fn signer_address(&self) -> Result<Address, WalletError> {
        Ok(SIGNER)
    }

    async fn chain_id(&self) -> Result<u64, WalletError> {
        Ok(0x413)
    }

    async fn switch_chain(&self, _network: &NetworkParams) -> Result<(), WalletError> {
        Ok(())
    }

    async fn add_chain(&self, _network: &NetworkParams) -> Result<(), WalletError> {
        Ok(())
    }

    async fn factory_wallet_of(
        &self,
        _factory: Address,
        _user: Address,
    ) -> Result<Address, WalletError> {
        Ok(WALLET)
    }

    async fn factory_create_wallet(&self, _factory: Address) -> Result<TxHash, WalletError> {
        Ok(TxHash::with_last_byte(0xcc))
    }

    async fn submit(&self, _wallet: Address, call: WalletCall) -> Result<TxHash, WalletError> {
        let mut submitted = self.submitted.lock().unwrap();
        submitted.push(call);
        Ok(TxHash::with_last_byte(submitted.len() as u8))
    }

    async fn token_balance(&self, _wallet: Address, token: Address) -> Result<U256, WalletError> {
        if token == Address::ZERO {
            Ok(U256::from(2_000_000_000_000_000_000u128))
        } else {
            Ok(U256::ZERO)
        }
    }

    async fn guardians(&self, _wallet: Address) -> Result<Vec<Address>, WalletError> {
        Ok(vec![])
    }

    async fn guardian_count(&self, _wallet: Address) -> Result<U256, WalletError> {
        Ok(U256::ZERO)
    }

    async fn is_guardian(&self, _wallet: Address, _account: Address) -> Result<bool, WalletError> {
        Ok(false)
    }

    async fn owner(&self, _wallet: Address) -> Result<Address, WalletError> {
        Ok(SIGNER)
    }

    async fn recovery_active(&self, _wallet: Address) -> Result<bool, WalletError> {
        Ok(false)
    }
}

/// Replies chosen by a substring of the user prompt; anything else fails.
struct KeywordCompletion {
    replies: Vec<(&'static str, &'static str)>,
}

#[async_trait]
impl IntentCompletion for KeywordCompletion {
    fn provider_name(&self) -> &str {
        "keyword"
    }

    async fn complete(&self, _system: &str, user: &str) -> Result<String, LlmError> {
        self.replies
            .iter()
            .find(|(needle, _)| user.contains(needle))
            .map(|(_, reply)| reply.to_string())
            .ok_or_else(|| LlmError::RequestFailed {
                provider: "keyword".to_string(),
                reason: "no scripted reply".to_string(),
            })
    }
}

struct FixedPrices(HashMap<&'static str, f64>);

#[async_trait]
impl PriceFeed for FixedPrices {
    async fn usd_price(&self, token_id: &str) -> Result<Option<f64>, PriceError> {
        Ok(self.0.get(token_id.to_lowercase().as_str()).copied())
    }
}

// --- Harness ---

fn is_bind_permission_error<E: std::fmt::Display>(err: &E) -> bool {
    err.to_string().contains("Operation not permitted")
        || err.to_string().contains("Failed to bind")
}

fn network() -> NetworkParams {
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

async fn start_test_server() -> Option<(SocketAddr, Arc<GatewayState>, Arc<RecordingChain>)> {
    let chain = Arc::new(RecordingChain::default());
    let mut tokens = SupportedTokens::default();
    tokens.insert("BDAG", Address::ZERO);
    let wallet = Arc::new(WalletService::with_parts(
        chain.clone(),
        network(),
        Address::repeat_byte(0xfa),
        tokens,
    ));

    let completion = Arc::new(KeywordCompletion {
        replies: vec![
            (
                "balance",
                r#"{"action":"balance","confidence":0.95}"#,
            ),
            (
                "bitcoin",
                r#"<think>price lookup</think>```json
{"action":"price","token":"bitcoin","confidence":0.9}
```"#,
            ),
            (
                "maybe send",
                r#"{"action":"send","token":"BDAG","amount":"1","to":"0x1111111111111111111111111111111111111111","confidence":0.5}"#,
            ),
        ],
    });
    let prices: Arc<dyn PriceFeed> = Arc::new(FixedPrices(HashMap::from([
        ("bitcoin", 65000.0),
        ("bdag", 0.05),
    ])));

    let agent = Arc::new(Agent::new(
        IntentParser::new(completion),
        Dispatcher::new(wallet.clone(), prices.clone()),
    ));
    let state = Arc::new(GatewayState::new(agent, wallet, prices, 30));

    let addr: SocketAddr = "127.0.0.1:0".parse().unwrap();
    match start_server(addr, state.clone(), AUTH_TOKEN.to_string()).await {
        Ok(bound) => Some((bound, state, chain)),
        Err(e) if is_bind_permission_error(&e) => None,
        Err(e) => panic!("Failed to start test server: {e:?}"),
    }
}

fn url(addr: SocketAddr, path: &str) -> String {
    format!("http://{addr}{path}")
}

// --- Tests ---

#[tokio::test]
async fn health_is_public() {
    let Some((addr, state, _)) = start_test_server().await else {
        return;
    };

    let body: Value = reqwest::get(url(addr, "/api/health"))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body["status"], "healthy");

    state.shutdown().await;
}

#[tokio::test]
async fn ai_intent_returns_parsed_intent() {
    let Some((addr, state, _)) = start_test_server().await else {
        return;
    };
    let client = reqwest::Client::new();

    let resp = client
        .post(url(addr, "/api/ai-intent"))
        .json(&json!({ "userMessage": "what is bitcoin worth" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["action"], "price");
    assert_eq!(body["token"], "bitcoin");
    assert_eq!(body["confidence"], 0.9);

    state.shutdown().await;
}

#[tokio::test]
async fn ai_intent_failure_is_500_without_fallback() {
    let Some((addr, state, _)) = start_test_server().await else {
        return;
    };
    let client = reqwest::Client::new();

    let resp = client
        .post(url(addr, "/api/ai-intent"))
        .json(&json!({ "userMessage": "gm" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 500);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["error"], "Failed to parse intent");

    state.shutdown().await;
}

#[tokio::test]
async fn chat_requires_bearer_token() {
    let Some((addr, state, _)) = start_test_server().await else {
        return;
    };
    let client = reqwest::Client::new();

    let resp = client
        .post(url(addr, "/api/chat"))
        .json(&json!({ "message": "what's my balance" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 401);

    let resp = client
        .post(url(addr, "/api/chat"))
        .bearer_auth("wrong-token")
        .json(&json!({ "message": "what's my balance" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 401);

    state.shutdown().await;
}

#[tokio::test]
async fn chat_balance_after_connect() {
    let Some((addr, state, _)) = start_test_server().await else {
        return;
    };
    let client = reqwest::Client::new();

    let resp = client
        .post(url(addr, "/api/wallet/connect"))
        .bearer_auth(AUTH_TOKEN)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(
        body["smartWallet"].as_str().unwrap().to_lowercase(),
        WALLET.to_string().to_lowercase()
    );

    let resp = client
        .post(url(addr, "/api/chat"))
        .bearer_auth(AUTH_TOKEN)
        .json(&json!({ "message": "what's my balance" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["intent"]["action"], "balance");
    assert_eq!(body["intentSource"], "remote");
    assert_eq!(body["executed"], true);
    let reply = body["reply"].as_str().unwrap();
    assert!(reply.starts_with("💰 Your balances:"), "reply: {reply}");
    assert!(reply.contains("BDAG"), "reply: {reply}");

    state.shutdown().await;
}

#[tokio::test]
async fn low_confidence_chat_submits_nothing() {
    let Some((addr, state, chain)) = start_test_server().await else {
        return;
    };
    let client = reqwest::Client::new();

    client
        .post(url(addr, "/api/wallet/connect"))
        .bearer_auth(AUTH_TOKEN)
        .send()
        .await
        .unwrap();

    let body: Value = client
        .post(url(addr, "/api/chat"))
        .bearer_auth(AUTH_TOKEN)
        .json(&json!({ "message": "maybe send some BDAG" }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body["reply"], CLARIFICATION_MESSAGE);
    assert_eq!(body["executed"], false);
    assert!(chain.submitted().is_empty());

    state.shutdown().await;
}

#[tokio::test]
async fn empty_chat_message_is_rejected() {
    let Some((addr, state, _)) = start_test_server().await else {
        return;
    };
    let client = reqwest::Client::new();

    let resp = client
        .post(url(addr, "/api/chat"))
        .bearer_auth(AUTH_TOKEN)
        .json(&json!({ "message": "   " }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 400);

    state.shutdown().await;
}

#[tokio::test]
async fn invalid_guardian_address_is_400() {
    let Some((addr, state, chain)) = start_test_server().await else {
        return;
    };
    let client = reqwest::Client::new();

    let resp = client
        .post(url(addr, "/api/wallet/guardians"))
        .bearer_auth(AUTH_TOKEN)
        .json(&json!({ "address": "0x1234" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 400);
    assert!(chain.submitted().is_empty());

    state.shutdown().await;
}

#[tokio::test]
async fn wallet_routes_need_connect_first() {
    let Some((addr, state, _)) = start_test_server().await else {
        return;
    };
    let client = reqwest::Client::new();

    let resp = client
        .post(url(addr, "/api/wallet/recovery/confirm"))
        .bearer_auth(AUTH_TOKEN)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 409);

    state.shutdown().await;
}

#[tokio::test]
async fn wallet_overview_carries_usd_values() {
    let Some((addr, state, _)) = start_test_server().await else {
        return;
    };
    let client = reqwest::Client::new();

    client
        .post(url(addr, "/api/wallet/connect"))
        .bearer_auth(AUTH_TOKEN)
        .send()
        .await
        .unwrap();

    let body: Value = client
        .get(url(addr, "/api/wallet"))
        .bearer_auth(AUTH_TOKEN)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body["balances"][0]["symbol"], "BDAG");
    assert_eq!(body["balances"][0]["balance"], "2.0");
    assert_eq!(body["balances"][0]["usdValue"], "0.10");
    assert_eq!(body["recoveryActive"], false);

    state.shutdown().await;
}

#[tokio::test]
async fn price_route_formats_and_misses() {
    let Some((addr, state, _)) = start_test_server().await else {
        return;
    };

    let body: Value = reqwest::get(url(addr, "/api/price/Bitcoin"))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body["usd"], 65000.0);
    assert_eq!(body["display"], "$65000");

    let body: Value = reqwest::get(url(addr, "/api/price/dogecoin"))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert!(body["usd"].is_null());
    assert_eq!(body["display"], "Price not found");

    state.shutdown().await;
}
