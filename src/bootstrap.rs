//! Bootstrap helpers for the smart wallet agent.
//!
//! Secrets (LLM API key, signer private key, gateway token) are read from the
//! environment. Besides the process environment and `./.env`, the agent loads
//! `~/.smartwallet/.env` so operators can keep keys out of the working tree.

use std::path::{Path, PathBuf};

/// Agent home directory: `~/.smartwallet`.
pub fn smartwallet_home() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".smartwallet")
}

/// Path to the agent-specific `.env` file: `~/.smartwallet/.env`.
pub fn smartwallet_env_path() -> PathBuf {
    smartwallet_home().join(".env")
}

/// Load env vars from `./.env` and then `~/.smartwallet/.env`.
///
/// dotenvy never overwrites existing env vars, so the effective priority is:
///
///   explicit env vars > `./.env` > `~/.smartwallet/.env`
pub fn load_smartwallet_env() {
    let _ = dotenvy::dotenv();
    load_env_file(&smartwallet_env_path());
}

fn load_env_file(path: &Path) {
    if !path.exists() {
        return;
    }
    if let Err(e) = dotenvy::from_path(path) {
        eprintln!("Warning: failed to load {}: {}", path.display(), e);
    }
}
