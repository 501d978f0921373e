//! Public USD price lookup (CoinGecko `simple/price`).

use std::collections::HashMap;
use std::str::FromStr;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use rust_decimal::Decimal;
use serde::Deserialize;

use crate::config::PriceConfig;
use crate::error::PriceError;
use crate::wallet::WalletBalance;

const PRICE_HOST_ALLOWLIST: &[&str] = &[
    "api.coingecko.com",
    "pro-api.coingecko.com",
    "localhost",
    "127.0.0.1",
];
const PRICE_SCHEME_ALLOWLIST: &[&str] = &["https", "http"];
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// USD price source keyed by lowercase token id (`bitcoin`, `ethereum`).
#[async_trait]
pub trait PriceFeed: Send + Sync {
    /// `Ok(None)` when the feed does not know the token.
    async fn usd_price(&self, token_id: &str) -> Result<Option<f64>, PriceError>;
}

#[derive(Debug, Deserialize)]
struct Quote {
    usd: Option<f64>,
}

pub struct CoinGeckoClient {
    client: Client,
    base_url: String,
}

impl CoinGeckoClient {
    pub fn new(config: &PriceConfig) -> Result<Self, PriceError> {
        validate_external_endpoint(&config.base_url, PRICE_HOST_ALLOWLIST, PRICE_SCHEME_ALLOWLIST)
            .map_err(PriceError::EndpointRejected)?;
        let client = Client::builder().timeout(REQUEST_TIMEOUT).build()?;
        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

#[async_trait]
impl PriceFeed for CoinGeckoClient {
    async fn usd_price(&self, token_id: &str) -> Result<Option<f64>, PriceError> {
        let id = token_id.trim().to_lowercase();
        let response = self
            .client
            .get(format!("{}/simple/price", self.base_url))
            .query(&[("ids", id.as_str()), ("vs_currencies", "usd")])
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(PriceError::Status {
                status: response.status().as_u16(),
            });
        }

        let quotes: HashMap<String, Quote> = response.json().await?;
        Ok(quotes.get(&id).and_then(|quote| quote.usd))
    }
}

/// Dollar rendering used in replies: `$65000`, `$0.0123`.
pub fn format_usd(price: f64) -> String {
    format!("${price}")
}

/// Price id for a wallet token symbol. Unlisted symbols are looked up by
/// their lowercase name.
pub fn price_id_for_symbol(symbol: &str) -> String {
    match symbol.trim().to_ascii_uppercase().as_str() {
        "ETH" | "WETH" => "ethereum".to_string(),
        "BTC" | "WBTC" => "bitcoin".to_string(),
        "USDC" => "usd-coin".to_string(),
        "USDT" => "tether".to_string(),
        "DAI" => "dai".to_string(),
        other => other.to_ascii_lowercase(),
    }
}

/// `balance * price` in dollars with two decimals. `None` when either side
/// is not representable.
pub fn usd_value(balance: &str, price: f64) -> Option<String> {
    let balance = Decimal::from_str(balance.trim()).ok()?;
    let price = Decimal::try_from(price).ok()?;
    let value = balance.checked_mul(price)?.round_dp(2);
    Some(format!("{value:.2}"))
}

/// Fill `usd_value` for every balance the feed can price. Lookups that fail
/// or miss leave the field empty.
pub async fn fill_usd_values(prices: &dyn PriceFeed, balances: &mut [WalletBalance]) {
    for balance in balances.iter_mut() {
        let id = price_id_for_symbol(&balance.symbol);
        match prices.usd_price(&id).await {
            Ok(Some(price)) => balance.usd_value = usd_value(&balance.balance, price),
            Ok(None) => {}
            Err(e) => tracing::debug!(token = %balance.symbol, "No USD price: {}", e),
        }
    }
}

fn endpoint_host_matches(host: &str, allowlist_entry: &str) -> bool {
    let host = host.trim().to_ascii_lowercase();
    let entry = allowlist_entry.trim().to_ascii_lowercase();
    if host.is_empty() || entry.is_empty() {
        return false;
    }

    if let Some(suffix) = entry.strip_prefix("*.") {
        if suffix.is_empty() || host == suffix {
            return false;
        }
        host.ends_with(&format!(".{suffix}"))
    } else {
        host == entry
    }
}

fn validate_external_endpoint(
    endpoint_url: &str,
    host_allowlist: &[&str],
    scheme_allowlist: &[&str],
) -> Result<(), String> {
    let parsed = url::Url::parse(endpoint_url).map_err(|e| format!("URL parse failed: {e}"))?;

    if !parsed.username().is_empty() || parsed.password().is_some() {
        return Err("URL contains userinfo (@), which is not allowed".to_string());
    }

    let scheme = parsed.scheme();
    if !scheme_allowlist
        .iter()
        .any(|allowed| scheme.eq_ignore_ascii_case(allowed))
    {
        return Err(format!(
            "scheme '{}' is not allowed (allowed: {})",
            scheme,
            scheme_allowlist.join(", ")
        ));
    }

    let host = parsed
        .host_str()
        .ok_or_else(|| "URL is missing host".to_string())?
        .trim_matches(['[', ']'])
        .to_ascii_lowercase();
    if !host_allowlist
        .iter()
        .any(|entry| endpoint_host_matches(&host, entry))
    {
        return Err(format!(
            "host '{}' is not allowlisted (allowed: {})",
            host,
            host_allowlist.join(", ")
        ));
    }

    Ok(())
}
