use clap::Parser;
use tracing_subscriber::EnvFilter;

use smartwallet_agent::bootstrap::load_smartwallet_env;
use smartwallet_agent::cli::{Cli, run};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    load_smartwallet_env();

    let cli = Cli::parse();

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("smartwallet_agent=info,tower_http=warn"));
    let json = std::env::var("LOG_FORMAT").is_ok_and(|v| v.eq_ignore_ascii_case("json"));
    if json {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .json()
            .with_writer(std::io::stderr)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .init();
    }

    run(cli).await
}
