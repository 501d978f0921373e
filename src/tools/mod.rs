//! External data sources used by intent handlers.

pub mod price;

pub use price::{CoinGeckoClient, PriceFeed, fill_usd_values, format_usd};
