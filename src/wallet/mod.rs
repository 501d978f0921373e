//! Smart wallet access: network switching, the factory, token transfers,
//! guardians and social recovery.

pub mod abi;
pub mod address;
pub mod chain;
pub mod network;
pub mod service;
pub mod tokens;
pub mod units;

#[cfg(test)]
pub(crate) mod fake;

pub use address::validate_address_input;
pub use chain::{AlloyChain, ChainBackend, WalletCall, connect_http};
pub use network::{NativeCurrency, NetworkParams};
pub use service::{WalletBalance, WalletOverview, WalletService};
pub use tokens::SupportedTokens;
pub use units::{format_ether, parse_ether};
