//! Decimal amount <-> on-chain integer unit conversion.

use alloy::primitives::U256;
use alloy::primitives::utils::{ParseUnits, format_units as alloy_format_units, parse_units as alloy_parse_units};

use crate::error::WalletError;

/// Decimals used by the smart wallet for every token amount.
pub const TOKEN_DECIMALS: u8 = 18;

fn invalid(input: &str, reason: impl Into<String>) -> WalletError {
    WalletError::InvalidAmount {
        input: input.to_string(),
        reason: reason.into(),
    }
}

/// Convert a decimal string such as `"0.5"` into integer units.
///
/// The conversion is exact: digits are never rounded, and anything that
/// does not fit in `decimals` fractional digits or in a `U256` is rejected.
pub fn parse_units(amount: &str, decimals: u8) -> Result<U256, WalletError> {
    let trimmed = amount.trim();
    if trimmed.starts_with('-') {
        return Err(invalid(amount, "must not be negative"));
    }
    let unsigned = trimmed.strip_prefix('+').unwrap_or(trimmed);

    let (whole, fraction) = unsigned.split_once('.').unwrap_or((unsigned, ""));
    if whole.is_empty() && fraction.is_empty() {
        return Err(invalid(amount, "no digits"));
    }
    if !whole.chars().chain(fraction.chars()).all(|c| c.is_ascii_digit()) {
        return Err(invalid(amount, "expected a plain decimal number"));
    }

    let fraction = fraction.trim_end_matches('0');
    if fraction.len() > usize::from(decimals) {
        return Err(invalid(
            amount,
            format!("more than {decimals} fractional digits"),
        ));
    }

    let whole = if whole.is_empty() { "0" } else { whole };
    let normalized = if fraction.is_empty() {
        whole.to_string()
    } else {
        format!("{whole}.{fraction}")
    };

    match alloy_parse_units(&normalized, decimals).map_err(|e| invalid(amount, e.to_string()))? {
        ParseUnits::U256(units) => Ok(units),
        ParseUnits::I256(_) => Err(invalid(amount, "must not be negative")),
    }
}

/// Render integer units as a decimal string, trimming trailing zeros but
/// keeping at least one fractional digit (`1.0`, `0.5`).
pub fn format_units(units: U256, decimals: u8) -> String {
    let raw = match alloy_format_units(units, decimals) {
        Ok(raw) => raw,
        Err(_) => return units.to_string(),
    };
    match raw.split_once('.') {
        Some((whole, fraction)) => {
            let fraction = fraction.trim_end_matches('0');
            if fraction.is_empty() {
                format!("{whole}.0")
            } else {
                format!("{whole}.{fraction}")
            }
        }
        None => format!("{raw}.0"),
    }
}

/// `parse_units` at the wallet's token decimals.
pub fn parse_ether(amount: &str) -> Result<U256, WalletError> {
    parse_units(amount, TOKEN_DECIMALS)
}

/// `format_units` at the wallet's token decimals.
pub fn format_ether(units: U256) -> String {
    format_units(units, TOKEN_DECIMALS)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn half_token_round_trips() {
        let units = parse_ether("0.5").unwrap();
        assert_eq!(units, U256::from(500_000_000_000_000_000u64));
        assert_eq!(format_ether(units), "0.5");
    }

    #[test]
    fn typical_amounts_round_trip() {
        for amount in ["1.0", "0.1", "100.0", "0.000000000000000001", "12.3456"] {
            let units = parse_ether(amount).unwrap();
            assert_eq!(format_ether(units), amount, "amount {amount}");
        }
    }

    #[test]
    fn whole_numbers_gain_fraction_digit() {
        assert_eq!(format_ether(parse_ether("3").unwrap()), "3.0");
        assert_eq!(format_ether(U256::ZERO), "0.0");
    }

    #[test]
    fn trailing_zeros_beyond_decimals_are_accepted() {
        let units = parse_ether("1.0000000000000000000").unwrap();
        assert_eq!(format_ether(units), "1.0");
    }

    #[test]
    fn rejects_bad_amounts() {
        assert!(matches!(
            parse_ether("-1"),
            Err(WalletError::InvalidAmount { .. })
        ));
        assert!(matches!(
            parse_ether("abc"),
            Err(WalletError::InvalidAmount { .. })
        ));
        assert!(matches!(
            parse_ether("0.0000000000000000001"),
            Err(WalletError::InvalidAmount { .. })
        ));
        assert!(matches!(
            parse_units("1.5", 0),
            Err(WalletError::InvalidAmount { .. })
        ));
        for bad in ["", ".", "1e18", "0x10", "1.2.3", " - 1"] {
            assert!(
                matches!(parse_ether(bad), Err(WalletError::InvalidAmount { .. })),
                "amount {bad:?}"
            );
        }
    }

    #[test]
    fn long_amounts_convert_exactly() {
        let amount = "123456789012.123456789012345678";
        let units = parse_ether(amount).unwrap();
        assert_eq!(
            units,
            U256::from_str_radix("123456789012123456789012345678", 10).unwrap()
        );
        assert_eq!(format_ether(units), amount);
    }

    #[test]
    fn amounts_beyond_29_digits_are_accepted() {
        let units = parse_ether("100000000000000000000000000000").unwrap();
        assert_eq!(
            format_ether(units),
            "100000000000000000000000000000.0"
        );
    }

    #[test]
    fn leading_dot_and_explicit_plus_parse() {
        assert_eq!(parse_ether(".5").unwrap(), parse_ether("0.5").unwrap());
        assert_eq!(parse_ether("+2").unwrap(), parse_ether("2").unwrap());
        assert_eq!(parse_ether("-0").ok(), None);
    }
}
