//! Command-line interface: subcommands and service wiring.

mod doctor;

use std::net::SocketAddr;
use std::sync::Arc;

use alloy::primitives::Address;
use anyhow::Context;
use clap::{Parser, Subcommand};
use secrecy::ExposeSecret;

use crate::agent::{Agent, Dispatcher, IntentParser};
use crate::channels::web::GatewayState;
use crate::channels::{ReplChannel, start_server};
use crate::config::Config;
use crate::error::WalletError;
use crate::llm::{IntentCompletion, OpenAiCompatibleClient};
use crate::settings::Settings;
use crate::tools::{CoinGeckoClient, PriceFeed};
use crate::wallet::{WalletService, connect_http};

pub use doctor::run_doctor_command;

#[derive(Parser, Debug)]
#[command(
    name = "smartwallet-agent",
    version,
    about = "Natural-language agent for a guardian-recoverable smart wallet"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run the HTTP gateway (default)
    Serve {
        /// Override the bind host
        #[arg(long)]
        host: Option<String>,
        /// Override the bind port
        #[arg(long)]
        port: Option<u16>,
    },
    /// Chat with the agent in the terminal
    Chat {
        /// Send a single message and exit
        #[arg(short, long)]
        message: Option<String>,
    },
    /// Parse a message and print the intent as JSON without executing it
    Intent {
        /// The message to parse
        #[arg(required = true, trailing_var_arg = true)]
        text: Vec<String>,
    },
    /// Check configuration, chain RPC and price API
    Doctor {
        /// Exit non-zero when any check fails
        #[arg(long)]
        strict: bool,
    },
    /// Manage ~/.smartwallet/config.toml
    Config {
        #[command(subcommand)]
        command: ConfigCommand,
    },
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommand {
    /// Write the default config file
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
    /// Print the config file path
    Path,
}

/// Services shared by the gateway and the REPL.
pub struct Services {
    pub agent: Arc<Agent>,
    pub wallet: Arc<WalletService>,
    pub prices: Arc<dyn PriceFeed>,
}

impl Services {
    /// Production wiring: alloy chain backend, completion client and
    /// CoinGecko price feed.
    pub fn build(config: &Config) -> crate::Result<Self> {
        let backend = connect_http(&config.chain)?;
        let wallet = Arc::new(WalletService::new(backend, &config.chain));
        let prices: Arc<dyn PriceFeed> = Arc::new(CoinGeckoClient::new(&config.price)?);
        Ok(Self::assemble(wallet, prices, build_completion(config)?))
    }

    pub fn assemble(
        wallet: Arc<WalletService>,
        prices: Arc<dyn PriceFeed>,
        completion: Arc<dyn IntentCompletion>,
    ) -> Self {
        let dispatcher = Dispatcher::new(Arc::clone(&wallet), Arc::clone(&prices));
        let agent = Arc::new(Agent::new(IntentParser::new(completion), dispatcher));
        Self {
            agent,
            wallet,
            prices,
        }
    }

    /// Switch network and resolve (or create) the smart wallet so chat
    /// intents can reach it.
    pub async fn connect_wallet(&self) -> crate::Result<Address> {
        self.wallet.connect().await?;
        self.wallet
            .smart_wallet_address()
            .await
            .ok_or_else(|| WalletError::NotInitialized.into())
    }
}

fn build_completion(config: &Config) -> crate::Result<Arc<dyn IntentCompletion>> {
    if config.llm.api_key.is_none() {
        tracing::warn!("No LLM API key configured; intents will come from the keyword fallback");
    }
    Ok(Arc::new(OpenAiCompatibleClient::new(&config.llm)?))
}

/// Dispatch a parsed command line.
pub async fn run(cli: Cli) -> anyhow::Result<()> {
    match cli.command.unwrap_or(Command::Serve {
        host: None,
        port: None,
    }) {
        Command::Serve { host, port } => {
            let config = Config::from_env()?;
            serve(config, host, port).await
        }
        Command::Chat { message } => {
            let config = Config::from_env()?;
            let services = Services::build(&config)?;
            let smart_wallet = services
                .connect_wallet()
                .await
                .context("failed to connect the smart wallet")?;
            println!("Smart wallet {smart_wallet}");
            let mut repl = ReplChannel::new(services.agent, services.wallet);
            if let Some(message) = message {
                repl = repl.with_message(message);
            }
            repl.run().await?;
            Ok(())
        }
        Command::Intent { text } => {
            let config = Config::from_env()?;
            let parser = IntentParser::new(build_completion(&config)?);
            let intent = parser.parse_intent(&text.join(" ")).await;
            let output = serde_json::json!({
                "intent": intent,
                "source": intent.source,
            });
            println!("{}", serde_json::to_string_pretty(&output)?);
            Ok(())
        }
        Command::Doctor { strict } => run_doctor_command(strict).await,
        Command::Config { command } => run_config_command(command),
    }
}

async fn serve(config: Config, host: Option<String>, port: Option<u16>) -> anyhow::Result<()> {
    let services = Services::build(&config)?;
    match services.connect_wallet().await {
        Ok(smart_wallet) => tracing::info!(%smart_wallet, "Smart wallet ready"),
        Err(e) => tracing::warn!(
            "Smart wallet not connected at startup ({}); POST /api/wallet/connect to retry",
            e
        ),
    }

    let host = host.unwrap_or_else(|| config.gateway.host.clone());
    let port = port.unwrap_or(config.gateway.port);
    let addr: SocketAddr = format!("{host}:{port}")
        .parse()
        .with_context(|| format!("invalid gateway bind address {host}:{port}"))?;

    let auth_token = match &config.gateway.auth_token {
        Some(token) => token.expose_secret().to_string(),
        None => {
            let token = generate_auth_token();
            println!("Generated gateway auth token (set GATEWAY_AUTH_TOKEN to pin it):");
            println!("  {token}");
            token
        }
    };

    let state = Arc::new(GatewayState::new(
        services.agent,
        services.wallet,
        services.prices,
        config.gateway.chat_rate_limit,
    ));
    let bound = start_server(addr, Arc::clone(&state), auth_token).await?;
    println!("Gateway listening on http://{bound}");

    tokio::signal::ctrl_c()
        .await
        .context("failed to listen for ctrl-c")?;
    state.shutdown().await;
    Ok(())
}

/// 32 random bytes, hex encoded.
fn generate_auth_token() -> String {
    alloy::hex::encode(rand::random::<[u8; 32]>())
}

fn run_config_command(command: ConfigCommand) -> anyhow::Result<()> {
    let path = Settings::default_toml_path();
    match command {
        ConfigCommand::Path => {
            println!("{}", path.display());
            Ok(())
        }
        ConfigCommand::Init { force } => {
            if path.exists() && !force {
                anyhow::bail!(
                    "{} already exists; pass --force to overwrite",
                    path.display()
                );
            }
            Settings::default()
                .save_toml(&path)
                .map_err(anyhow::Error::msg)?;
            println!("Wrote {}", path.display());
            Ok(())
        }
    }
}
