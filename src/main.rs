use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use curio::cli::{self, Cli};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let default_filter = if is_verbose() { "curio=debug" } else { "curio=info" };
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| default_filter.into()))
        .with(fmt::layer())
        .init();

    let cli = Cli::parse();
    cli::run(cli).await
}

fn is_verbose() -> bool {
    std::env::args().any(|a| a == "--verbose" || a == "-v")
}
