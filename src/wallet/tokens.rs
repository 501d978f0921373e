use std::collections::BTreeMap;
use std::str::FromStr;

use alloy::primitives::Address;

use crate::error::WalletError;

/// Symbol to token address map. Symbols are stored uppercase.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SupportedTokens {
    by_symbol: BTreeMap<String, Address>,
}

impl SupportedTokens {
    pub fn insert(&mut self, symbol: &str, address: Address) {
        self.by_symbol
            .insert(symbol.trim().to_ascii_uppercase(), address);
    }

    pub fn is_empty(&self) -> bool {
        self.by_symbol.is_empty()
    }

    /// Case-insensitive symbol lookup.
    pub fn resolve(&self, symbol: &str) -> Option<Address> {
        self.by_symbol
            .get(&symbol.trim().to_ascii_uppercase())
            .copied()
    }

    /// Resolve a symbol, or accept a raw token address.
    pub fn resolve_token(&self, token: &str) -> Result<Address, WalletError> {
        if let Some(address) = self.resolve(token) {
            return Ok(address);
        }
        Address::from_str(token.trim()).map_err(|_| WalletError::UnknownToken(token.to_string()))
    }

    pub fn symbols(&self) -> impl Iterator<Item = &str> {
        self.by_symbol.keys().map(String::as_str)
    }
}

impl FromIterator<(String, Address)> for SupportedTokens {
    fn from_iter<I: IntoIterator<Item = (String, Address)>>(iter: I) -> Self {
        let mut tokens = Self::default();
        for (symbol, address) in iter {
            tokens.insert(&symbol, address);
        }
        tokens
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy::primitives::address;

    fn tokens() -> SupportedTokens {
        [
            ("BDAG".to_string(), Address::ZERO),
            (
                "usdc".to_string(),
                address!("5425890298aed601595a70AB815c96711a31Bc65"),
            ),
        ]
        .into_iter()
        .collect()
    }

    #[test]
    fn symbols_resolve_case_insensitively() {
        let tokens = tokens();
        assert_eq!(tokens.resolve("bdag"), Some(Address::ZERO));
        assert!(tokens.resolve("USDC").is_some());
        assert_eq!(tokens.symbols().collect::<Vec<_>>(), vec!["BDAG", "USDC"]);
    }

    #[test]
    fn raw_addresses_pass_through() {
        let raw = "0x1111111111111111111111111111111111111111";
        assert_eq!(
            tokens().resolve_token(raw).unwrap(),
            Address::from_str(raw).unwrap()
        );
    }

    #[test]
    fn unknown_symbol_is_rejected() {
        assert!(matches!(
            tokens().resolve_token("DOGE"),
            Err(WalletError::UnknownToken(symbol)) if symbol == "DOGE"
        ));
    }
}
