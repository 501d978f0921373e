use std::str::FromStr;

use alloy::primitives::Address;

use crate::error::WalletError;

/// Length of a `0x`-prefixed hex address.
pub const ADDRESS_INPUT_LEN: usize = 42;

/// Validate a guardian or recovery-owner address typed by the user.
///
/// The input must be exactly 42 characters starting with `0x`, and then parse
/// as a hex address. Checked before any contract call is issued.
pub fn validate_address_input(input: &str) -> Result<Address, WalletError> {
    if input.len() != ADDRESS_INPUT_LEN || !input.starts_with("0x") {
        return Err(WalletError::InvalidAddress {
            input: input.to_string(),
            reason: format!("must be {ADDRESS_INPUT_LEN} characters starting with 0x"),
        });
    }
    Address::from_str(input).map_err(|e| WalletError::InvalidAddress {
        input: input.to_string(),
        reason: e.to_string(),
    })
}
