//! Natural-language agent for a guardian-recoverable smart contract wallet.
//!
//! A user message is turned into a structured [`agent::Intent`] by a remote
//! completion model (with a keyword fallback), gated on confidence, and
//! executed against the user's smart wallet through [`wallet::WalletService`].
//! The pipeline is exposed over an HTTP gateway and an interactive REPL.

pub mod agent;
pub mod bootstrap;
pub mod channels;
pub mod cli;
pub mod config;
pub mod error;
pub mod llm;
pub mod settings;
pub mod tools;
pub mod wallet;

pub use config::Config;
pub use error::{Error, Result};
