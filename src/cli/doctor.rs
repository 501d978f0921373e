//! `smartwallet-agent doctor` - active health diagnostics.
//!
//! Checks the completion endpoint credentials, the chain RPC, the wallet
//! factory deployment and the price API. Each check reports pass/fail with
//! guidance on failures.

use std::time::Duration;

use alloy::primitives::Address;
use alloy::providers::{Provider, ProviderBuilder};
use secrecy::ExposeSecret;

use crate::config::Config;

const CHECK_TIMEOUT: Duration = Duration::from_secs(8);

/// Run diagnostic checks and print results.
pub async fn run_doctor_command(strict: bool) -> anyhow::Result<()> {
    println!("SmartWallet Doctor");
    println!("==================\n");

    let mut passed = 0u32;
    let mut failed = 0u32;

    let config = match Config::from_env() {
        Ok(config) => {
            check(
                "Configuration",
                CheckResult::Pass("env and config.toml resolved".to_string()),
                &mut passed,
                &mut failed,
            );
            config
        }
        Err(e) => {
            check(
                "Configuration",
                CheckResult::Fail(e.to_string()),
                &mut passed,
                &mut failed,
            );
            println!("\n  Fix the configuration before running the remaining checks.");
            anyhow::bail!("doctor failed: invalid configuration");
        }
    };

    check(
        "LLM API key",
        check_llm_key(&config),
        &mut passed,
        &mut failed,
    );

    check(
        "Signer key",
        check_signer_key(&config),
        &mut passed,
        &mut failed,
    );

    check(
        "Chain RPC",
        check_chain_rpc(&config).await,
        &mut passed,
        &mut failed,
    );

    check(
        "Wallet factory",
        check_factory(&config).await,
        &mut passed,
        &mut failed,
    );

    check(
        "Price API",
        check_http_endpoint(
            "Price API",
            &format!("{}/ping", config.price.base_url),
            CHECK_TIMEOUT,
        )
        .await,
        &mut passed,
        &mut failed,
    );

    check(
        "Gateway bind port",
        check_gateway_port_available(&config),
        &mut passed,
        &mut failed,
    );

    println!();
    println!("  {passed} passed, {failed} failed");

    if failed > 0 {
        println!("\n  Some checks failed. The intent parser still works offline via its keyword fallback.");
        if strict {
            anyhow::bail!("doctor strict mode failed with {failed} check(s)");
        }
    }

    Ok(())
}

// ── Individual checks ───────────────────────────────────────

fn check(name: &str, result: CheckResult, passed: &mut u32, failed: &mut u32) {
    match result {
        CheckResult::Pass(detail) => {
            *passed += 1;
            println!("  [pass] {name}: {detail}");
        }
        CheckResult::Fail(detail) => {
            *failed += 1;
            println!("  [FAIL] {name}: {detail}");
        }
        CheckResult::Skip(reason) => {
            println!("  [skip] {name}: {reason}");
        }
    }
}

enum CheckResult {
    Pass(String),
    Fail(String),
    Skip(String),
}

fn check_llm_key(config: &Config) -> CheckResult {
    match &config.llm.api_key {
        Some(key) if !key.expose_secret().trim().is_empty() => CheckResult::Pass(format!(
            "set for {} ({})",
            redact_url_for_display(&config.llm.base_url),
            config.llm.model
        )),
        _ => CheckResult::Fail(
            "OPENAI_API_KEY / LLM_API_KEY not set; intents will use the keyword fallback".to_string(),
        ),
    }
}

fn check_signer_key(config: &Config) -> CheckResult {
    if config.chain.signer_key.is_none() {
        return CheckResult::Fail(
            "WALLET_PRIVATE_KEY not set; wallet operations are unavailable".to_string(),
        );
    }
    match crate::wallet::connect_http(&config.chain) {
        Ok(_) => CheckResult::Pass("private key parses".to_string()),
        Err(e) => CheckResult::Fail(e.to_string()),
    }
}

async fn check_chain_rpc(config: &Config) -> CheckResult {
    let url = match reqwest::Url::parse(&config.chain.rpc_url) {
        Ok(url) => url,
        Err(e) => return CheckResult::Fail(format!("CHAIN_RPC_URL is invalid: {e}")),
    };
    let provider = ProviderBuilder::new().on_http(url);

    match tokio::time::timeout(CHECK_TIMEOUT, provider.get_chain_id()).await {
        Err(_) => CheckResult::Fail(format!(
            "{} timed out",
            redact_url_for_display(&config.chain.rpc_url)
        )),
        Ok(Err(e)) => CheckResult::Fail(format!(
            "{} unreachable: {e}",
            redact_url_for_display(&config.chain.rpc_url)
        )),
        Ok(Ok(chain_id)) => chain_id_result(chain_id, config.chain.network.chain_id),
    }
}

fn chain_id_result(reported: u64, expected: u64) -> CheckResult {
    if reported == expected {
        CheckResult::Pass(format!("chain id {reported:#x}"))
    } else {
        CheckResult::Fail(format!(
            "RPC reports chain id {reported:#x}, expected {expected:#x}; check CHAIN_RPC_URL and CHAIN_ID"
        ))
    }
}

async fn check_factory(config: &Config) -> CheckResult {
    let factory = config.chain.factory_address;
    if factory == Address::ZERO {
        return CheckResult::Fail("WALLET_FACTORY_ADDRESS is the zero address".to_string());
    }
    let url = match reqwest::Url::parse(&config.chain.rpc_url) {
        Ok(url) => url,
        Err(_) => return CheckResult::Skip("RPC URL invalid".to_string()),
    };
    let provider = ProviderBuilder::new().on_http(url);

    match tokio::time::timeout(CHECK_TIMEOUT, provider.get_code_at(factory)).await {
        Err(_) => CheckResult::Skip("RPC timed out".to_string()),
        Ok(Err(e)) => CheckResult::Skip(format!("RPC unavailable: {e}")),
        Ok(Ok(code)) if code.is_empty() => {
            CheckResult::Fail(format!("no contract deployed at {factory}"))
        }
        Ok(Ok(code)) => CheckResult::Pass(format!("{factory} ({} bytes of code)", code.len())),
    }
}

fn check_gateway_port_available(config: &Config) -> CheckResult {
    let bind = format!("{}:{}", config.gateway.host, config.gateway.port);
    match std::net::TcpListener::bind(&bind) {
        Ok(listener) => {
            drop(listener);
            CheckResult::Pass(format!("{bind} is available"))
        }
        Err(error) => CheckResult::Fail(format!(
            "{bind} is unavailable ({error}); free the port or change GATEWAY_PORT"
        )),
    }
}

async fn check_http_endpoint(label: &str, endpoint: &str, timeout: Duration) -> CheckResult {
    let url = match reqwest::Url::parse(endpoint.trim()) {
        Ok(url) => url,
        Err(e) => {
            return CheckResult::Fail(format!(
                "{label} endpoint URL is invalid ({}): {e}",
                redact_url_for_display(endpoint)
            ));
        }
    };

    let client = match reqwest::Client::builder().timeout(timeout).build() {
        Ok(client) => client,
        Err(e) => return CheckResult::Fail(format!("cannot construct HTTP client: {e}")),
    };

    match client.get(url.clone()).send().await {
        Ok(response) if response.status().is_server_error() => CheckResult::Fail(format!(
            "{label} reachable but unhealthy ({} at {})",
            response.status(),
            redact_url_for_display(url.as_str())
        )),
        Ok(response) => CheckResult::Pass(format!(
            "{} ({})",
            redact_url_for_display(url.as_str()),
            response.status()
        )),
        Err(e) => CheckResult::Fail(format!(
            "{label} unreachable ({}): {e}",
            redact_url_for_display(url.as_str())
        )),
    }
}

fn redact_url_for_display(raw: &str) -> String {
    match reqwest::Url::parse(raw) {
        Ok(mut url) => {
            if !url.username().is_empty() {
                let _ = url.set_username("redacted");
            }
            if url.password().is_some() {
                let _ = url.set_password(Some("redacted"));
            }
            url.to_string()
        }
        Err(_) => "<invalid-url>".to_string(),
    }
}
